//! Habit — one user's tracked behaviour and its streak history.
//!
//! A habit carries its own streak state. The engine and the lifecycle
//! functions take a snapshot and return a new one; only the store persists.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Consecutive days needed to reach a milestone.
pub const STREAK_GOAL: u8 = 3;

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HabitStatus {
  #[default]
  Active,
  Paused,
  Completed,
}

// ─── Streak history ──────────────────────────────────────────────────────────

/// A closed interval of calendar days describing one streak attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakPeriod {
  pub start_date: NaiveDate,
  pub end_date:   NaiveDate,
  /// The 3-day goal was reached inside this interval.
  pub completed:  bool,
  /// The user chose to keep going after this milestone.
  #[serde(default)]
  pub continued:  bool,
}

impl StreakPeriod {
  /// Number of calendar days covered, both ends inclusive.
  pub fn len_days(&self) -> u32 {
    let span = (self.end_date - self.start_date).num_days();
    u32::try_from(span + 1).unwrap_or(0)
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start_date <= date && date <= self.end_date
  }

  /// Iterate every calendar day in the period.
  pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
    self
      .start_date
      .iter_days()
      .take_while(move |d| *d <= self.end_date)
  }
}

/// Tagged view of where a habit sits in the streak lifecycle.
///
/// Derived from `status` and `current_streak`; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "streak", rename_all = "snake_case")]
pub enum StreakState {
  InProgress(u8),
  PendingDecision,
  Paused(u8),
  Completed,
}

// ─── Habit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
  pub id:             Uuid,
  pub user_id:        Uuid,
  pub title:          String,
  pub description:    Option<String>,
  pub status:         HabitStatus,
  pub current_streak: u8,
  /// Count of completed entries in `streak_history`.
  pub total_streaks:  u32,
  pub last_checked:   Option<DateTime<Utc>>,
  /// Chronological; append-only apart from `continued` on the last entry.
  pub streak_history: Vec<StreakPeriod>,
  /// Local time of day for the "habit due" reminder.
  pub reminder_time:  Option<NaiveTime>,
  pub created_at:     DateTime<Utc>,
}

impl Habit {
  /// A fresh active habit with empty history.
  pub fn new(user_id: Uuid, input: NewHabit, created_at: DateTime<Utc>) -> Self {
    Self {
      id: Uuid::new_v4(),
      user_id,
      title: input.title,
      description: input.description,
      status: HabitStatus::Active,
      current_streak: 0,
      total_streaks: 0,
      last_checked: None,
      streak_history: Vec::new(),
      reminder_time: input.reminder_time,
      created_at,
    }
  }

  pub fn streak_state(&self) -> StreakState {
    match self.status {
      HabitStatus::Completed => StreakState::Completed,
      HabitStatus::Paused => StreakState::Paused(self.current_streak),
      HabitStatus::Active if self.current_streak >= STREAK_GOAL => {
        StreakState::PendingDecision
      }
      HabitStatus::Active => StreakState::InProgress(self.current_streak),
    }
  }

  /// Recompute `total_streaks` from history. Call after every history
  /// mutation.
  pub fn recount_streaks(&mut self) {
    let completed = self.streak_history.iter().filter(|p| p.completed).count();
    self.total_streaks = u32::try_from(completed).unwrap_or(u32::MAX);
  }

  /// Apply a partial update of the user-editable fields.
  pub fn apply_patch(&mut self, patch: HabitPatch) {
    if let Some(title) = patch.title {
      self.title = title;
    }
    if let Some(description) = patch.description {
      self.description = description;
    }
    if let Some(reminder_time) = patch.reminder_time {
      self.reminder_time = reminder_time;
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::HabitStore::create_habit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHabit {
  pub title:         String,
  #[serde(default)]
  pub description:   Option<String>,
  #[serde(default)]
  pub reminder_time: Option<NaiveTime>,
}

impl NewHabit {
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      title:         title.into(),
      description:   None,
      reminder_time: None,
    }
  }
}

/// Partial update of the user-editable fields.
///
/// The outer `Option` means "leave unchanged"; for nullable fields the inner
/// `Option` carries the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitPatch {
  #[serde(default)]
  pub title:         Option<String>,
  #[serde(default, with = "double_option")]
  pub description:   Option<Option<String>>,
  #[serde(default, with = "double_option")]
  pub reminder_time: Option<Option<NaiveTime>>,
}

impl HabitPatch {
  pub fn is_empty(&self) -> bool {
    self.title.is_none() && self.description.is_none() && self.reminder_time.is_none()
  }
}

/// Distinguishes an absent JSON field from an explicit `null`.
mod double_option {
  use serde::{Deserialize, Deserializer, Serialize, Serializer};

  pub fn serialize<T, S>(value: &Option<Option<T>>, s: S) -> Result<S::Ok, S::Error>
  where
    T: Serialize,
    S: Serializer,
  {
    match value {
      Some(inner) => inner.serialize(s),
      None => s.serialize_none(),
    }
  }

  pub fn deserialize<'de, T, D>(d: D) -> Result<Option<Option<T>>, D::Error>
  where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
  {
    Option::<T>::deserialize(d).map(Some)
  }
}
