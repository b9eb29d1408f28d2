//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, reminder times are `HH:MM:SS`, the streak
//! history is compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveTime, Utc};
use streak_core::{
  badge::{AwardedBadge, BadgeId, BadgeProgress},
  habit::{Habit, HabitStatus, StreakPeriod},
  store::{SyncMarker, SyncStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveTime ───────────────────────────────────────────────────────────────

const TIME_FORMAT: &str = "%H:%M:%S";

pub fn encode_time(t: NaiveTime) -> String { t.format(TIME_FORMAT).to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, TIME_FORMAT).map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<HabitStatus> {
  s.parse().map_err(|_| Error::Corrupt {
    column: "status",
    value:  s.to_owned(),
  })
}

pub fn decode_sync_status(s: &str) -> Result<SyncStatus> {
  s.parse().map_err(|_| Error::Corrupt {
    column: "sync_status",
    value:  s.to_owned(),
  })
}

pub fn decode_badge_id(s: &str) -> Result<BadgeId> {
  s.parse().map_err(|_| Error::Corrupt {
    column: "badge_id",
    value:  s.to_owned(),
  })
}

// ─── Integers ────────────────────────────────────────────────────────────────

/// SQLite integers are `i64`; every counter we store is non-negative.
pub fn decode_count<T: TryFrom<i64>>(column: &'static str, n: i64) -> Result<T> {
  T::try_from(n).map_err(|_| Error::Corrupt {
    column,
    value: n.to_string(),
  })
}

// ─── Streak history ──────────────────────────────────────────────────────────

pub fn encode_history(history: &[StreakPeriod]) -> Result<String> {
  Ok(serde_json::to_string(history)?)
}

pub fn decode_history(s: &str) -> Result<Vec<StreakPeriod>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawHabit::from_row`].
pub const HABIT_COLUMNS: &str = "habit_id, user_id, title, description, status, \
                                 current_streak, total_streaks, last_checked, \
                                 streak_history, reminder_time, created_at";

/// Raw values of a `habits` row, minus the sync marker.
pub struct RawHabit {
  pub habit_id:       String,
  pub user_id:        String,
  pub title:          String,
  pub description:    Option<String>,
  pub status:         String,
  pub current_streak: i64,
  pub total_streaks:  i64,
  pub last_checked:   Option<String>,
  pub streak_history: String,
  pub reminder_time:  Option<String>,
  pub created_at:     String,
}

impl RawHabit {
  /// Read the columns selected by [`HABIT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      habit_id:       row.get(0)?,
      user_id:        row.get(1)?,
      title:          row.get(2)?,
      description:    row.get(3)?,
      status:         row.get(4)?,
      current_streak: row.get(5)?,
      total_streaks:  row.get(6)?,
      last_checked:   row.get(7)?,
      streak_history: row.get(8)?,
      reminder_time:  row.get(9)?,
      created_at:     row.get(10)?,
    })
  }

  pub fn encode(habit: &Habit) -> Result<Self> {
    Ok(Self {
      habit_id:       encode_uuid(habit.id),
      user_id:        encode_uuid(habit.user_id),
      title:          habit.title.clone(),
      description:    habit.description.clone(),
      status:         habit.status.as_ref().to_owned(),
      current_streak: i64::from(habit.current_streak),
      total_streaks:  i64::from(habit.total_streaks),
      last_checked:   habit.last_checked.map(encode_dt),
      streak_history: encode_history(&habit.streak_history)?,
      reminder_time:  habit.reminder_time.map(encode_time),
      created_at:     encode_dt(habit.created_at),
    })
  }

  pub fn into_habit(self) -> Result<Habit> {
    Ok(Habit {
      id:             decode_uuid(&self.habit_id)?,
      user_id:        decode_uuid(&self.user_id)?,
      title:          self.title,
      description:    self.description,
      status:         decode_status(&self.status)?,
      current_streak: decode_count("current_streak", self.current_streak)?,
      total_streaks:  decode_count("total_streaks", self.total_streaks)?,
      last_checked:   self.last_checked.as_deref().map(decode_dt).transpose()?,
      streak_history: decode_history(&self.streak_history)?,
      reminder_time:  self.reminder_time.as_deref().map(decode_time).transpose()?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Raw sync columns of a `habits` row.
pub struct RawSyncMarker {
  pub version:     i64,
  pub status:      String,
  pub last_synced: Option<String>,
  pub updated_at:  String,
}

impl RawSyncMarker {
  pub fn into_marker(self) -> Result<SyncMarker> {
    Ok(SyncMarker {
      version:     decode_count("version", self.version)?,
      status:      decode_sync_status(&self.status)?,
      last_synced: self.last_synced.as_deref().map(decode_dt).transpose()?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values of a `badge_progress` row.
pub struct RawProgress {
  pub streaks_completed: i64,
  pub total_streaks:     i64,
  pub habits_created:    i64,
  pub resumed_habits:    i64,
}

impl RawProgress {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      streaks_completed: row.get(0)?,
      total_streaks:     row.get(1)?,
      habits_created:    row.get(2)?,
      resumed_habits:    row.get(3)?,
    })
  }

  pub fn into_progress(self) -> Result<BadgeProgress> {
    Ok(BadgeProgress {
      streaks_completed: decode_count("streaks_completed", self.streaks_completed)?,
      total_streaks:     decode_count("total_streaks", self.total_streaks)?,
      habits_created:    decode_count("habits_created", self.habits_created)?,
      resumed_habits:    decode_count("resumed_habits", self.resumed_habits)?,
    })
  }
}

/// Raw values of a `badge_awards` row.
pub struct RawAward {
  pub badge_id:   String,
  pub awarded_at: String,
}

impl RawAward {
  pub fn into_award(self) -> Result<AwardedBadge> {
    Ok(AwardedBadge {
      badge_id:   decode_badge_id(&self.badge_id)?,
      awarded_at: decode_dt(&self.awarded_at)?,
    })
  }
}
