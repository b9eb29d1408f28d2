//! [`HabitTracker`] — wires the pure engine, lifecycle, statistics and badge
//! logic to a [`HabitStore`] and a [`Notifier`].
//!
//! Nothing here is global: the store and notifier are handed in at
//! construction and every call names its [`UserContext`]. Each operation
//! checks the context before touching storage.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error,
  badge::{self, AwardedBadge, BadgeId, BadgeProgress, ProgressEvent},
  context::UserContext,
  engine::{self, HabitProgress, StreakTrigger},
  habit::{Habit, HabitPatch, NewHabit},
  lifecycle,
  notify::{DueReminder, Notifier},
  stats::{self, HabitStats, OverallStats, TrendPoint},
  store::{HabitStore, Recorded, SyncMarker},
};

// ─── Results ─────────────────────────────────────────────────────────────────

/// A habit after a change, plus any badges the change earned.
#[derive(Debug, Clone, Serialize)]
pub struct HabitUpdate {
  pub habit:      Habit,
  pub new_badges: Vec<AwardedBadge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInReport {
  pub habit:      Habit,
  pub progress:   HabitProgress,
  pub new_badges: Vec<AwardedBadge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BadgeSummary {
  pub progress: BadgeProgress,
  /// Everything the counters currently qualify for.
  pub eligible: BTreeSet<BadgeId>,
  pub awarded:  Vec<AwardedBadge>,
}

// ─── Tracker ─────────────────────────────────────────────────────────────────

pub struct HabitTracker<S, N = ()> {
  store:    S,
  notifier: N,
}

impl<S, N> HabitTracker<S, N>
where
  S: HabitStore,
  N: Notifier,
{
  pub fn new(store: S, notifier: N) -> Self { Self { store, notifier } }

  pub fn store(&self) -> &S { &self.store }

  // ── Habits ────────────────────────────────────────────────────────────

  pub async fn create_habit(
    &self,
    ctx: &UserContext,
    input: NewHabit,
  ) -> Result<HabitUpdate, S::Error> {
    let user_id = ctx.require()?;
    let Recorded { value: habit, new_badges } = self.store.create_habit(user_id, input).await?;
    info!(%user_id, habit_id = %habit.id, "habit created");
    log_awards(user_id, &new_badges);

    self.remind(&habit);
    Ok(HabitUpdate { habit, new_badges })
  }

  pub async fn get_habit(&self, ctx: &UserContext, habit_id: Uuid) -> Result<Habit, S::Error> {
    let user_id = ctx.require()?;
    self
      .store
      .get_habit(user_id, habit_id)
      .await?
      .ok_or_else(|| Error::HabitNotFound(habit_id).into())
  }

  pub async fn list_habits(&self, ctx: &UserContext) -> Result<Vec<Habit>, S::Error> {
    let user_id = ctx.require()?;
    self.store.list_habits(user_id).await
  }

  pub async fn update_habit(
    &self,
    ctx: &UserContext,
    habit_id: Uuid,
    patch: HabitPatch,
  ) -> Result<Habit, S::Error> {
    let user_id = ctx.require()?;
    let reminder_changed = matches!(patch.reminder_time, Some(Some(_)));
    let habit = self.store.update_habit(user_id, habit_id, patch).await?;
    if reminder_changed {
      self.remind(&habit);
    }
    Ok(habit)
  }

  pub async fn delete_habit(&self, ctx: &UserContext, habit_id: Uuid) -> Result<(), S::Error> {
    let user_id = ctx.require()?;
    if !self.store.delete_habit(user_id, habit_id).await? {
      return Err(Error::HabitNotFound(habit_id).into());
    }
    info!(%user_id, %habit_id, "habit deleted");
    Ok(())
  }

  // ── Streaks ───────────────────────────────────────────────────────────

  /// Record today's outcome for a habit.
  ///
  /// The engine runs inside the store's atomic read-modify-write, so two
  /// concurrent check-ins on the same local day cannot both count. A
  /// milestone and the badge progress it earns are committed together.
  pub async fn check_in(
    &self,
    ctx: &UserContext,
    habit_id: Uuid,
    completed: bool,
    now: DateTime<FixedOffset>,
  ) -> Result<CheckInReport, S::Error> {
    let user_id = ctx.require()?;
    let Recorded { value: (habit, progress), new_badges } = self
      .store
      .modify_habit_recording(user_id, habit_id, move |habit| {
        let (next, progress) = engine::record_check_in(habit, completed, now)?;
        *habit = next;
        let event = (progress.trigger == Some(StreakTrigger::MilestoneReached))
          .then_some(ProgressEvent::StreakCompleted);
        Ok(((habit.clone(), progress), event))
      })
      .await?;

    debug!(
      %user_id,
      %habit_id,
      completed,
      streak = progress.current_streak,
      "check-in recorded"
    );

    match progress.trigger {
      Some(StreakTrigger::MilestoneReached) => info!(%user_id, %habit_id, "milestone reached"),
      Some(StreakTrigger::StreakBroken) => info!(%user_id, %habit_id, "streak broken"),
      None => {}
    }
    log_awards(user_id, &new_badges);

    Ok(CheckInReport { habit, progress, new_badges })
  }

  /// Continue (`true`) or complete (`false`) a habit waiting at its milestone.
  pub async fn resolve_milestone(
    &self,
    ctx: &UserContext,
    habit_id: Uuid,
    continue_streak: bool,
  ) -> Result<Habit, S::Error> {
    let user_id = ctx.require()?;
    let habit = self
      .store
      .modify_habit(user_id, habit_id, move |habit| {
        *habit = lifecycle::resolve_milestone(habit, continue_streak)?;
        Ok(habit.clone())
      })
      .await?;
    info!(%user_id, %habit_id, continue_streak, status = %habit.status, "milestone resolved");
    Ok(habit)
  }

  pub async fn pause_habit(&self, ctx: &UserContext, habit_id: Uuid) -> Result<Habit, S::Error> {
    let user_id = ctx.require()?;
    let habit = self
      .store
      .modify_habit(user_id, habit_id, |habit| {
        *habit = lifecycle::pause(habit)?;
        Ok(habit.clone())
      })
      .await?;
    info!(%user_id, %habit_id, "habit paused");
    Ok(habit)
  }

  pub async fn resume_habit(
    &self,
    ctx: &UserContext,
    habit_id: Uuid,
  ) -> Result<HabitUpdate, S::Error> {
    let user_id = ctx.require()?;
    let Recorded { value: habit, new_badges } = self
      .store
      .modify_habit_recording(user_id, habit_id, |habit| {
        *habit = lifecycle::resume(habit)?;
        Ok((habit.clone(), Some(ProgressEvent::HabitResumed)))
      })
      .await?;
    info!(%user_id, %habit_id, "habit resumed");
    log_awards(user_id, &new_badges);

    self.remind(&habit);
    Ok(HabitUpdate { habit, new_badges })
  }

  // ── Statistics ────────────────────────────────────────────────────────

  pub async fn habit_stats(
    &self,
    ctx: &UserContext,
    habit_id: Uuid,
    now: DateTime<FixedOffset>,
  ) -> Result<(Habit, HabitStats), S::Error> {
    let habit = self.get_habit(ctx, habit_id).await?;
    let stats = stats::compute_habit_stats(&habit, now);
    Ok((habit, stats))
  }

  pub async fn overall_stats(
    &self,
    ctx: &UserContext,
    now: DateTime<FixedOffset>,
  ) -> Result<OverallStats, S::Error> {
    let habits = self.list_habits(ctx).await?;
    Ok(stats::compute_overall_stats(&habits, now))
  }

  pub async fn trend(
    &self,
    ctx: &UserContext,
    habit_id: Uuid,
    days: u32,
    today: NaiveDate,
  ) -> Result<Vec<TrendPoint>, S::Error> {
    let habit = self.get_habit(ctx, habit_id).await?;
    Ok(stats::build_trend_series(&habit.streak_history, days, today))
  }

  // ── Badges ────────────────────────────────────────────────────────────

  pub async fn badges(&self, ctx: &UserContext) -> Result<BadgeSummary, S::Error> {
    let user_id  = ctx.require()?;
    let progress = self.store.badge_progress(user_id).await?;
    let awarded  = self.store.awarded_badges(user_id).await?;
    Ok(BadgeSummary {
      progress,
      eligible: badge::check_eligibility(&progress),
      awarded,
    })
  }

  // ── Sync ──────────────────────────────────────────────────────────────

  pub async fn sync_marker(
    &self,
    ctx: &UserContext,
    habit_id: Uuid,
  ) -> Result<SyncMarker, S::Error> {
    let user_id = ctx.require()?;
    self
      .store
      .sync_marker(user_id, habit_id)
      .await?
      .ok_or_else(|| Error::HabitNotFound(habit_id).into())
  }

  pub async fn mark_synced(
    &self,
    ctx: &UserContext,
    habit_id: Uuid,
    version: u64,
  ) -> Result<bool, S::Error> {
    let user_id = ctx.require()?;
    let accepted = self.store.mark_synced(user_id, habit_id, version).await?;
    debug!(%user_id, %habit_id, version, accepted, "sync confirmation");
    Ok(accepted)
  }

  // ── Internals ─────────────────────────────────────────────────────────

  fn remind(&self, habit: &Habit) {
    if let Some(time_of_day) = habit.reminder_time {
      self.notifier.habit_due(DueReminder {
        user_id: habit.user_id,
        habit_id: habit.id,
        time_of_day,
      });
    }
  }
}

fn log_awards(user_id: Uuid, awards: &[AwardedBadge]) {
  for award in awards {
    info!(%user_id, badge = %award.badge_id, "badge awarded");
  }
}
