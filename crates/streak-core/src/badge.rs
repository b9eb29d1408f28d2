//! Achievement badges: progress counters and the eligibility check.
//!
//! Counters only move through [`BadgeProgress::apply`], so progress and
//! eligibility can never disagree about which events happened.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator as _};

// ─── Identifiers ─────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BadgeId {
  FirstStreak,
  TripleThreat,
  #[serde(rename = "consistency_champion_1")]
  #[strum(serialize = "consistency_champion_1")]
  ConsistencyChampion1,
  #[serde(rename = "consistency_champion_2")]
  #[strum(serialize = "consistency_champion_2")]
  ConsistencyChampion2,
  #[serde(rename = "consistency_champion_3")]
  #[strum(serialize = "consistency_champion_3")]
  ConsistencyChampion3,
  HabitHacker,
  ResilientStreak,
}

// ─── Catalogue ───────────────────────────────────────────────────────────────

/// Which counter a badge is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
  StreaksCompleted,
  TotalStreaks,
  HabitsCreated,
  ResumedHabits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
  pub id:          BadgeId,
  pub name:        &'static str,
  pub description: &'static str,
  pub counter:     Counter,
  pub threshold:   u32,
}

pub static CATALOG: &[Badge] = &[
  Badge {
    id:          BadgeId::FirstStreak,
    name:        "First Streak",
    description: "Complete your first 3-day streak.",
    counter:     Counter::StreaksCompleted,
    threshold:   1,
  },
  Badge {
    id:          BadgeId::TripleThreat,
    name:        "Triple Threat",
    description: "Complete three 3-day streaks.",
    counter:     Counter::StreaksCompleted,
    threshold:   3,
  },
  Badge {
    id:          BadgeId::ConsistencyChampion1,
    name:        "Consistency Champion I",
    description: "Reach 5 streaks in total.",
    counter:     Counter::TotalStreaks,
    threshold:   5,
  },
  Badge {
    id:          BadgeId::ConsistencyChampion2,
    name:        "Consistency Champion II",
    description: "Reach 10 streaks in total.",
    counter:     Counter::TotalStreaks,
    threshold:   10,
  },
  Badge {
    id:          BadgeId::ConsistencyChampion3,
    name:        "Consistency Champion III",
    description: "Reach 20 streaks in total.",
    counter:     Counter::TotalStreaks,
    threshold:   20,
  },
  Badge {
    id:          BadgeId::HabitHacker,
    name:        "Habit Hacker",
    description: "Create 5 habits.",
    counter:     Counter::HabitsCreated,
    threshold:   5,
  },
  Badge {
    id:          BadgeId::ResilientStreak,
    name:        "Resilient Streak",
    description: "Resume a paused habit.",
    counter:     Counter::ResumedHabits,
    threshold:   1,
  },
];

impl BadgeId {
  pub fn badge(self) -> &'static Badge {
    // CATALOG holds one entry per variant, in declaration order.
    &CATALOG[self as usize]
  }
}

// ─── Progress ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BadgeProgress {
  pub streaks_completed: u32,
  pub total_streaks:     u32,
  pub habits_created:    u32,
  pub resumed_habits:    u32,
}

/// Something that happened to one of the user's habits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEvent {
  HabitCreated,
  /// A habit reached its 3-day milestone.
  StreakCompleted,
  /// A paused habit was made active again.
  HabitResumed,
}

impl BadgeProgress {
  /// The only way counters change. Saturating, so never decreasing.
  pub fn apply(&mut self, event: ProgressEvent) {
    match event {
      ProgressEvent::HabitCreated => {
        self.habits_created = self.habits_created.saturating_add(1);
      }
      ProgressEvent::StreakCompleted => {
        self.streaks_completed = self.streaks_completed.saturating_add(1);
        self.total_streaks = self.total_streaks.saturating_add(1);
      }
      ProgressEvent::HabitResumed => {
        self.resumed_habits = self.resumed_habits.saturating_add(1);
      }
    }
  }

  pub fn get(&self, counter: Counter) -> u32 {
    match counter {
      Counter::StreaksCompleted => self.streaks_completed,
      Counter::TotalStreaks => self.total_streaks,
      Counter::HabitsCreated => self.habits_created,
      Counter::ResumedHabits => self.resumed_habits,
    }
  }
}

// ─── Eligibility ─────────────────────────────────────────────────────────────

/// Every badge `progress` satisfies, not only newly earned ones.
pub fn check_eligibility(progress: &BadgeProgress) -> BTreeSet<BadgeId> {
  BadgeId::iter()
    .filter(|id| {
      let badge = id.badge();
      progress.get(badge.counter) >= badge.threshold
    })
    .collect()
}

/// Eligible badges the user does not hold yet.
pub fn newly_earned(
  progress: &BadgeProgress,
  already_awarded: &BTreeSet<BadgeId>,
) -> BTreeSet<BadgeId> {
  check_eligibility(progress)
    .difference(already_awarded)
    .copied()
    .collect()
}

/// A badge held by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardedBadge {
  pub badge_id:   BadgeId,
  pub awarded_at: DateTime<Utc>,
}
