//! The streak engine: how one check-in moves a habit's streak.
//!
//! Everything here is pure. The caller supplies a snapshot and the current
//! local time and persists whatever comes back.
//!
//! Calendar days are evaluated in the UTC offset carried by `now`, so a user
//! checking in at 23:30 and again at 00:10 local time gets two days even when
//! both instants share a UTC date.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  habit::{Habit, STREAK_GOAL, StreakPeriod, StreakState},
};

// ─── Output types ────────────────────────────────────────────────────────────

/// The decision trigger produced by a check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTrigger {
  /// The streak hit [`STREAK_GOAL`]; the user must continue or complete.
  MilestoneReached,
  /// A running streak was reset and recorded as a failed attempt.
  StreakBroken,
}

/// Transient result of a check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitProgress {
  pub habit_id:        Uuid,
  pub current_streak:  u8,
  pub last_checked:    Option<DateTime<Utc>>,
  pub today_completed: bool,
  /// When an uninterrupted run from here would reach the goal.
  pub streak_ends_at:  DateTime<Utc>,
  pub trigger:         Option<StreakTrigger>,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Apply one daily check-in to `habit`.
///
/// At most one check-in counts per calendar day: a second call on the same
/// local date returns the habit unchanged with `today_completed = true`.
///
/// A habit whose previous check-in is more than one day old loses its running
/// streak before today's outcome is applied; the lost run is recorded as a
/// not-completed period ending on the last checked day.
pub fn record_check_in(
  habit: &Habit,
  completed: bool,
  now: DateTime<FixedOffset>,
) -> Result<(Habit, HabitProgress)> {
  match habit.streak_state() {
    StreakState::InProgress(_) => {}
    StreakState::PendingDecision => return Err(Error::MilestonePending(habit.id)),
    StreakState::Paused(_) | StreakState::Completed => {
      return Err(Error::HabitNotActive { id: habit.id, status: habit.status });
    }
  }

  let offset   = *now.offset();
  let today    = now.date_naive();
  let last_day = habit
    .last_checked
    .map(|at| at.with_timezone(&offset).date_naive());

  if let Some(last) = last_day {
    if today < last {
      return Err(Error::CheckInBeforeLastCheck(habit.id));
    }
    if today == last {
      let progress = progress_for(habit, today, offset, true, None);
      return Ok((habit.clone(), progress));
    }
  }

  let mut next    = habit.clone();
  let mut trigger = None;

  if let Some(last) = last_day
    && next.current_streak > 0
    && (today - last).num_days() > 1
  {
    next.streak_history.push(StreakPeriod {
      start_date: run_start(last, next.current_streak),
      end_date:   last,
      completed:  false,
      continued:  false,
    });
    next.current_streak = 0;
    trigger = Some(StreakTrigger::StreakBroken);
  }

  if completed {
    next.current_streak += 1;
    if next.current_streak == STREAK_GOAL {
      next.streak_history.push(StreakPeriod {
        start_date: today - Days::new(u64::from(STREAK_GOAL - 1)),
        end_date:   today,
        completed:  true,
        continued:  false,
      });
      trigger = Some(StreakTrigger::MilestoneReached);
    }
  } else if next.current_streak > 0 {
    let last = last_day.unwrap_or(today);
    next.streak_history.push(StreakPeriod {
      start_date: run_start(last, next.current_streak),
      end_date:   today,
      completed:  false,
      continued:  false,
    });
    next.current_streak = 0;
    trigger = Some(StreakTrigger::StreakBroken);
  }

  debug_assert!(next.current_streak <= STREAK_GOAL);

  next.recount_streaks();
  next.last_checked = Some(now.with_timezone(&Utc));

  let progress = progress_for(&next, today, offset, completed, trigger);
  Ok((next, progress))
}

/// End of the local day on which an uninterrupted run reaches the goal.
pub fn streak_ends_at(current_streak: u8, today: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
  let remaining = STREAK_GOAL.saturating_sub(current_streak);
  let goal_day  = today + Days::new(u64::from(remaining));
  end_of_day(goal_day, offset)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// First day of a run of `streak` consecutive days ending on `last`.
fn run_start(last: NaiveDate, streak: u8) -> NaiveDate {
  last - Days::new(u64::from(streak.saturating_sub(1)))
}

fn end_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
  let local = (date + Days::new(1)).and_time(NaiveTime::MIN) - TimeDelta::seconds(1);
  let utc   = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
  DateTime::from_naive_utc_and_offset(utc, Utc)
}

fn progress_for(
  habit: &Habit,
  today: NaiveDate,
  offset: FixedOffset,
  today_completed: bool,
  trigger: Option<StreakTrigger>,
) -> HabitProgress {
  HabitProgress {
    habit_id: habit.id,
    current_streak: habit.current_streak,
    last_checked: habit.last_checked,
    today_completed,
    streak_ends_at: streak_ends_at(habit.current_streak, today, offset),
    trigger,
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::habit::{HabitStatus, NewHabit};

  fn utc() -> FixedOffset { FixedOffset::east_opt(0).unwrap() }

  fn at(day: u32, hour: u32) -> DateTime<FixedOffset> {
    utc().with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
  }

  fn date(day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 5, day).unwrap() }

  fn habit() -> Habit {
    Habit::new(
      Uuid::new_v4(),
      NewHabit::new("Stretch"),
      Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap(),
    )
  }

  fn check(h: &Habit, completed: bool, now: DateTime<FixedOffset>) -> (Habit, HabitProgress) {
    record_check_in(h, completed, now).unwrap()
  }

  #[test]
  fn three_consecutive_days_reach_the_milestone() {
    let h = habit();
    let (h, p1) = check(&h, true, at(1, 9));
    assert_eq!(p1.current_streak, 1);
    assert_eq!(p1.trigger, None);
    let (h, _) = check(&h, true, at(2, 9));
    let (h, p3) = check(&h, true, at(3, 9));

    assert_eq!(h.current_streak, 3);
    assert_eq!(p3.trigger, Some(StreakTrigger::MilestoneReached));
    assert_eq!(h.streak_history, vec![StreakPeriod {
      start_date: date(1),
      end_date:   date(3),
      completed:  true,
      continued:  false,
    }]);
    assert_eq!(h.total_streaks, 1);
    assert_eq!(h.streak_state(), StreakState::PendingDecision);
  }

  #[test]
  fn second_check_in_on_the_same_day_is_a_no_op() {
    let h = habit();
    let (first, p1) = check(&h, true, at(1, 9));
    let (second, p2) = check(&first, true, at(1, 21));

    assert_eq!(first, second);
    assert_eq!(p2.current_streak, p1.current_streak);
    assert!(p2.today_completed);
    assert_eq!(p2.trigger, None);
  }

  #[test]
  fn same_day_miss_after_completion_does_not_reset() {
    let (h, _) = check(&habit(), true, at(1, 9));
    let (h2, p) = check(&h, false, at(1, 22));
    assert_eq!(h2.current_streak, 1);
    assert!(p.today_completed);
  }

  #[test]
  fn miss_resets_streak_and_records_failed_period() {
    let (h, _) = check(&habit(), true, at(1, 9));
    let (h, _) = check(&h, true, at(2, 9));
    assert_eq!(h.current_streak, 2);

    let (h, p) = check(&h, false, at(3, 9));
    assert_eq!(h.current_streak, 0);
    assert_eq!(p.trigger, Some(StreakTrigger::StreakBroken));
    assert!(!p.today_completed);
    assert_eq!(h.streak_history, vec![StreakPeriod {
      start_date: date(1),
      end_date:   date(3),
      completed:  false,
      continued:  false,
    }]);
    assert_eq!(h.total_streaks, 0);
  }

  #[test]
  fn miss_with_no_running_streak_adds_no_history() {
    let (h, p) = check(&habit(), false, at(1, 9));
    assert_eq!(h.current_streak, 0);
    assert!(h.streak_history.is_empty());
    assert_eq!(p.trigger, None);
    assert!(h.last_checked.is_some());
  }

  #[test]
  fn skipped_day_breaks_the_run_before_counting_today() {
    let (h, _) = check(&habit(), true, at(1, 9));
    let (h, _) = check(&h, true, at(2, 9));
    let (h, p) = check(&h, true, at(4, 9));

    assert_eq!(h.current_streak, 1);
    assert_eq!(p.trigger, Some(StreakTrigger::StreakBroken));
    assert_eq!(h.streak_history, vec![StreakPeriod {
      start_date: date(1),
      end_date:   date(2),
      completed:  false,
      continued:  false,
    }]);
  }

  #[test]
  fn check_in_rejected_while_decision_pending() {
    let (h, _) = check(&habit(), true, at(1, 9));
    let (h, _) = check(&h, true, at(2, 9));
    let (h, _) = check(&h, true, at(3, 9));
    let err = record_check_in(&h, true, at(4, 9)).unwrap_err();
    assert!(matches!(err, Error::MilestonePending(id) if id == h.id));
  }

  #[test]
  fn check_in_rejected_on_paused_or_completed_habit() {
    let mut h = habit();
    h.status = HabitStatus::Paused;
    assert!(matches!(
      record_check_in(&h, true, at(1, 9)),
      Err(Error::HabitNotActive { status: HabitStatus::Paused, .. })
    ));
    h.status = HabitStatus::Completed;
    assert!(matches!(
      record_check_in(&h, true, at(1, 9)),
      Err(Error::HabitNotActive { status: HabitStatus::Completed, .. })
    ));
  }

  #[test]
  fn check_in_dated_before_last_check_is_rejected() {
    let (h, _) = check(&habit(), true, at(5, 9));
    assert!(matches!(
      record_check_in(&h, true, at(4, 9)),
      Err(Error::CheckInBeforeLastCheck(_))
    ));
  }

  #[test]
  fn calendar_day_follows_the_local_offset() {
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    // 23:30 and 00:30 local on consecutive days, same UTC date.
    let late  = tokyo.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap();
    let early = tokyo.with_ymd_and_hms(2024, 5, 2, 0, 30, 0).unwrap();
    assert_eq!(late.with_timezone(&Utc).date_naive(), early.with_timezone(&Utc).date_naive());

    let (h, _) = check(&habit(), true, late);
    let (h, _) = check(&h, true, early);
    assert_eq!(h.current_streak, 2);
  }

  #[test]
  fn streak_ends_at_is_end_of_goal_day() {
    let (_, p) = check(&habit(), true, at(1, 9));
    // One day done; goal reached at the end of May 3rd.
    assert_eq!(p.streak_ends_at, Utc.with_ymd_and_hms(2024, 5, 3, 23, 59, 59).unwrap());

    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    let ends = streak_ends_at(0, date(10), plus_two);
    assert_eq!(ends, Utc.with_ymd_and_hms(2024, 5, 13, 21, 59, 59).unwrap());
  }

  #[test]
  fn streak_stays_within_bounds_and_history_stays_ordered() {
    // Deterministic mixed sequence with gaps, misses and same-day repeats.
    let pattern = [
      (1, true), (1, true), (2, false), (3, true), (4, true), (6, true),
      (7, true), (7, false), (8, true),
    ];
    let mut h = habit();
    let mut milestones = 0;
    for (day, completed) in pattern {
      let (next, p) = check(&h, completed, at(day, 12));
      assert!(p.current_streak <= STREAK_GOAL);
      let appended = next.streak_history.len() - h.streak_history.len();
      if p.trigger == Some(StreakTrigger::MilestoneReached) {
        milestones += 1;
        assert_eq!(p.current_streak, STREAK_GOAL);
        assert_eq!(appended, 1);
        assert!(next.streak_history.last().unwrap().completed);
      }
      h = next;
      if h.streak_state() == StreakState::PendingDecision {
        break;
      }
    }
    assert_eq!(milestones, 1);
    assert!(
      h.streak_history
        .windows(2)
        .all(|w| w[0].start_date <= w[1].start_date && w[0].end_date < w[1].start_date)
    );
  }
}
