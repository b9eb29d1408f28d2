//! The `HabitStore` trait, the sync marker it keeps per record, and the
//! [`Recorded`] result of writes that also move badge progress.
//!
//! The trait is implemented by storage backends (e.g. `streak-store-sqlite`).
//! The tracker and the HTTP layer depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{
  badge::{AwardedBadge, BadgeProgress, ProgressEvent},
  error::Classify,
  habit::{Habit, HabitPatch, NewHabit},
};

// ─── Sync marker ─────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncStatus {
  /// Written locally, not yet confirmed by the remote side.
  Pending,
  Synced,
}

/// Replication bookkeeping for one habit record.
///
/// Every local write bumps `version` and resets `status` to pending. A
/// confirmation only lands if it names the current version; anything older is
/// ignored, which makes the last write win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMarker {
  pub version:     u64,
  pub status:      SyncStatus,
  pub last_synced: Option<DateTime<Utc>>,
  pub updated_at:  DateTime<Utc>,
}

// ─── Recorded writes ─────────────────────────────────────────────────────────

/// The result of a habit write plus the badges it unlocked for the owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded<T> {
  pub value:      T,
  /// Awards inserted by this write; badges already held are not repeated.
  pub new_badges: Vec<AwardedBadge>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a habit store backend.
///
/// Every habit is scoped to its owner: lookups with the wrong `user_id` behave
/// exactly like lookups of a missing id.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait HabitStore: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Classify + Send + Sync + 'static;

  // ── Habits ────────────────────────────────────────────────────────────

  /// Create and persist a new active habit with empty history.
  ///
  /// The insert, the owner's [`ProgressEvent::HabitCreated`] and any badge it
  /// unlocks are written as one unit.
  fn create_habit(
    &self,
    user_id: Uuid,
    input: NewHabit,
  ) -> impl Future<Output = Result<Recorded<Habit>, Self::Error>> + Send + '_;

  /// Retrieve a habit. Returns `None` if not found.
  fn get_habit(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
  ) -> impl Future<Output = Result<Option<Habit>, Self::Error>> + Send + '_;

  /// All of a user's habits, oldest first.
  fn list_habits(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Habit>, Self::Error>> + Send + '_;

  /// Apply a partial update of the user-editable fields.
  ///
  /// Fails with [`crate::Error::HabitNotFound`] if the habit does not exist.
  fn update_habit(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
    patch: HabitPatch,
  ) -> impl Future<Output = Result<Habit, Self::Error>> + Send + '_;

  /// Atomic read-modify-write of one habit.
  ///
  /// `f` sees the stored habit and may change it. The read, `f` and the write
  /// happen as one unit with respect to every other operation on the store:
  /// if `f` fails nothing is written, and if `f` leaves the habit unchanged
  /// the record (and its sync marker) is not touched.
  fn modify_habit<F, T>(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
    f: F,
  ) -> impl Future<Output = Result<T, Self::Error>> + Send + '_
  where
    F: FnOnce(&mut Habit) -> crate::Result<T> + Send + 'static,
    T: Send + 'static;

  /// [`modify_habit`](Self::modify_habit) for changes that feed badge
  /// progress.
  ///
  /// When `f` returns an event, the owner's counters are updated and every
  /// badge they newly qualify for is awarded in the same unit as the habit
  /// write. Either all of it lands or none of it does.
  fn modify_habit_recording<F, T>(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
    f: F,
  ) -> impl Future<Output = Result<Recorded<T>, Self::Error>> + Send + '_
  where
    F: FnOnce(&mut Habit) -> crate::Result<(T, Option<ProgressEvent>)> + Send + 'static,
    T: Send + 'static;

  /// Delete a habit. Returns `false` if it did not exist.
  fn delete_habit(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Badge progress ────────────────────────────────────────────────────

  /// Current counters; all zero for a user with no recorded events.
  fn badge_progress(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<BadgeProgress, Self::Error>> + Send + '_;

  fn awarded_badges(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AwardedBadge>, Self::Error>> + Send + '_;

  // ── Sync ──────────────────────────────────────────────────────────────

  fn sync_marker(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
  ) -> impl Future<Output = Result<Option<SyncMarker>, Self::Error>> + Send + '_;

  /// Confirm that `version` reached the remote side. Returns `false` if the
  /// record has moved on since (or does not exist).
  fn mark_synced(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
    version: u64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
