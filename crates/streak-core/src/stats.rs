//! Derived statistics. Never stored; recomputed from habit snapshots.

use std::collections::BTreeSet;

use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::habit::{Habit, HabitStatus, StreakPeriod};

// ─── Per habit ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitStats {
  pub habit_id:          Uuid,
  /// Percentage (0–100) of observed days covered by completed periods.
  pub completion_rate:   f64,
  /// Length in days of the longest completed period.
  pub longest_streak:    u32,
  pub current_streak:    u8,
  /// Distinct days inside completed periods.
  pub total_completions: u32,
}

/// Stats as of `now`. Days, including the creation day, are taken in
/// `now`'s offset.
pub fn compute_habit_stats(habit: &Habit, now: DateTime<FixedOffset>) -> HabitStats {
  let longest_streak = completed_periods(&habit.streak_history)
    .map(StreakPeriod::len_days)
    .max()
    .unwrap_or(0);

  let completed_days = completed_days(&habit.streak_history);
  let total_completions = u32::try_from(completed_days.len()).unwrap_or(u32::MAX);

  HabitStats {
    habit_id: habit.id,
    completion_rate: completion_rate(habit, &completed_days, now),
    longest_streak,
    current_streak: habit.current_streak,
    total_completions,
  }
}

/// Observed range is from the earlier of creation and the first recorded
/// period up to `today`, both inclusive.
fn completion_rate(
  habit: &Habit,
  completed_days: &BTreeSet<NaiveDate>,
  now: DateTime<FixedOffset>,
) -> f64 {
  let Some(first) = habit.streak_history.first() else {
    return 0.0;
  };
  let today   = now.date_naive();
  let created = habit.created_at.with_timezone(&now.timezone()).date_naive();
  let start   = created.min(first.start_date);
  if today < start {
    return 0.0;
  }

  let observed = (today - start).num_days() + 1;
  let covered  = completed_days.range(start..=today).count();
  covered as f64 / observed as f64 * 100.0
}

fn completed_periods(history: &[StreakPeriod]) -> impl Iterator<Item = &StreakPeriod> {
  history.iter().filter(|p| p.completed)
}

fn completed_days(history: &[StreakPeriod]) -> BTreeSet<NaiveDate> {
  completed_periods(history).flat_map(|p| p.days()).collect()
}

// ─── Across habits ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopHabit {
  pub habit_id:        Uuid,
  pub title:           String,
  pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
  pub total_habits:         u32,
  pub active_habits:        u32,
  pub paused_habits:        u32,
  pub completed_habits:     u32,
  /// Arithmetic mean of the per-habit completion rates.
  pub completion_rate:      f64,
  pub current_streak:       u8,
  pub longest_streak:       u32,
  /// Mean `current_streak` over active habits.
  pub average_streak:       f64,
  /// Sum of `total_streaks` over all habits.
  pub streaks_completed:    u32,
  pub top_performing_habit: Option<TopHabit>,
}

pub fn compute_overall_stats(habits: &[Habit], now: DateTime<FixedOffset>) -> OverallStats {
  let per_habit: Vec<HabitStats> = habits
    .iter()
    .map(|h| compute_habit_stats(h, now))
    .collect();

  let count_status = |status: HabitStatus| {
    habits.iter().filter(|h| h.status == status).count() as u32
  };

  let completion_rate = if per_habit.is_empty() {
    0.0
  } else {
    per_habit.iter().map(|s| s.completion_rate).sum::<f64>() / per_habit.len() as f64
  };

  let active: Vec<&Habit> = habits
    .iter()
    .filter(|h| h.status == HabitStatus::Active)
    .collect();
  let average_streak = if active.is_empty() {
    0.0
  } else {
    active.iter().map(|h| f64::from(h.current_streak)).sum::<f64>() / active.len() as f64
  };

  // First habit wins ties.
  let mut top: Option<(&Habit, f64)> = None;
  for (habit, stats) in habits.iter().zip(&per_habit) {
    if top.is_none_or(|(_, best)| stats.completion_rate > best) {
      top = Some((habit, stats.completion_rate));
    }
  }

  OverallStats {
    total_habits: habits.len() as u32,
    active_habits: count_status(HabitStatus::Active),
    paused_habits: count_status(HabitStatus::Paused),
    completed_habits: count_status(HabitStatus::Completed),
    completion_rate,
    current_streak: habits.iter().map(|h| h.current_streak).max().unwrap_or(0),
    longest_streak: per_habit.iter().map(|s| s.longest_streak).max().unwrap_or(0),
    average_streak,
    streaks_completed: habits.iter().map(|h| h.total_streaks).sum(),
    top_performing_habit: top.map(|(habit, completion_rate)| TopHabit {
      habit_id: habit.id,
      title: habit.title.clone(),
      completion_rate,
    }),
  }
}

// ─── Trend ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
  pub date:      NaiveDate,
  pub completed: bool,
}

/// One point per day for the trailing `days` window ending on `today`,
/// oldest first. Always exactly `days` entries.
pub fn build_trend_series(history: &[StreakPeriod], days: u32, today: NaiveDate) -> Vec<TrendPoint> {
  let completed: Vec<&StreakPeriod> = completed_periods(history).collect();
  (0..days)
    .rev()
    .map(|back| {
      let date = today - Days::new(u64::from(back));
      TrendPoint {
        date,
        completed: completed.iter().any(|p| p.contains(date)),
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::habit::NewHabit;

  fn date(day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 7, day).unwrap() }

  /// Noon UTC on the given July day.
  fn noon(day: u32) -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(2024, 7, day, 12, 0, 0).unwrap().fixed_offset()
  }

  fn period(start: u32, end: u32, completed: bool) -> StreakPeriod {
    StreakPeriod {
      start_date: date(start),
      end_date: date(end),
      completed,
      continued: false,
    }
  }

  fn habit(title: &str, history: Vec<StreakPeriod>) -> Habit {
    let mut h = Habit::new(
      Uuid::new_v4(),
      NewHabit::new(title),
      Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap(),
    );
    h.streak_history = history;
    h.recount_streaks();
    h
  }

  #[test]
  fn empty_history_gives_zero_stats() {
    let stats = compute_habit_stats(&habit("Floss", vec![]), noon(10));
    assert_eq!(stats.completion_rate, 0.0);
    assert_eq!(stats.longest_streak, 0);
    assert_eq!(stats.total_completions, 0);
  }

  #[test]
  fn rate_counts_completed_days_over_observed_range() {
    // Created July 1st; completed 1–3 and 6–8, failed 4–5; today is the 10th.
    let h = habit("Floss", vec![period(1, 3, true), period(4, 5, false), period(6, 8, true)]);
    let stats = compute_habit_stats(&h, noon(10));
    assert_eq!(stats.total_completions, 6);
    assert_eq!(stats.longest_streak, 3);
    assert!((stats.completion_rate - 60.0).abs() < 1e-9);
  }

  #[test]
  fn creation_day_follows_the_users_offset() {
    // Created 2024-07-01 08:00 UTC, which is already July 2nd at UTC+18
    // and still June 30th at UTC-12.
    let h = habit("Floss", vec![period(2, 4, true)]);
    let east = FixedOffset::east_opt(18 * 3600).unwrap();
    let west = FixedOffset::west_opt(12 * 3600).unwrap();
    let at = |offset: FixedOffset| {
      offset.from_local_datetime(&date(4).and_hms_opt(12, 0, 0).unwrap()).unwrap()
    };

    // Observed July 2nd to 4th: every day covered.
    let stats = compute_habit_stats(&h, at(east));
    assert!((stats.completion_rate - 100.0).abs() < 1e-9);

    // Observed June 30th to July 4th: 3 of 5 days.
    let stats = compute_habit_stats(&h, at(west));
    assert!((stats.completion_rate - 60.0).abs() < 1e-9);
  }

  #[test]
  fn overall_stats_average_per_habit_rates() {
    let mut a = habit("A", vec![period(1, 3, true)]);
    a.current_streak = 3;
    let mut b = habit("B", vec![period(1, 2, false)]);
    b.current_streak = 1;
    let mut c = habit("C", vec![period(1, 3, true), period(4, 6, true)]);
    c.status = HabitStatus::Completed;
    c.current_streak = 3;

    let stats = compute_overall_stats(&[a.clone(), b, c.clone()], noon(6));
    assert_eq!(stats.total_habits, 3);
    assert_eq!(stats.active_habits, 2);
    assert_eq!(stats.completed_habits, 1);
    assert_eq!(stats.paused_habits, 0);
    // Rates: a = 3/6, b = 0, c = 6/6.
    assert!((stats.completion_rate - 50.0).abs() < 1e-9);
    assert_eq!(stats.current_streak, 3);
    assert_eq!(stats.longest_streak, 3);
    assert!((stats.average_streak - 2.0).abs() < 1e-9);
    assert_eq!(stats.streaks_completed, 3);
    let top = stats.top_performing_habit.unwrap();
    assert_eq!(top.habit_id, c.id);
    assert_eq!(top.title, "C");
  }

  #[test]
  fn overall_stats_of_nothing() {
    let stats = compute_overall_stats(&[], noon(6));
    assert_eq!(stats.total_habits, 0);
    assert_eq!(stats.completion_rate, 0.0);
    assert_eq!(stats.average_streak, 0.0);
    assert!(stats.top_performing_habit.is_none());
  }

  #[test]
  fn top_habit_ties_go_to_the_first() {
    let a = habit("A", vec![]);
    let b = habit("B", vec![]);
    let stats = compute_overall_stats(&[a.clone(), b], noon(6));
    assert_eq!(stats.top_performing_habit.unwrap().habit_id, a.id);
  }

  #[test]
  fn trend_has_exactly_the_requested_length() {
    assert_eq!(build_trend_series(&[], 14, date(20)).len(), 14);
    assert!(build_trend_series(&[], 14, date(20)).iter().all(|p| !p.completed));
    assert!(build_trend_series(&[], 0, date(20)).is_empty());

    let history = vec![period(1, 3, true), period(10, 12, true), period(13, 14, false)];
    let series = build_trend_series(&history, 14, date(20));
    assert_eq!(series.len(), 14);
    assert_eq!(series.first().unwrap().date, date(7));
    assert_eq!(series.last().unwrap().date, date(20));

    let done: Vec<NaiveDate> = series.iter().filter(|p| p.completed).map(|p| p.date).collect();
    assert_eq!(done, vec![date(10), date(11), date(12)]);
  }

  #[test]
  fn trend_is_deterministic() {
    let history = vec![period(5, 7, true)];
    assert_eq!(
      build_trend_series(&history, 30, date(31)),
      build_trend_series(&history, 30, date(31)),
    );
  }
}
