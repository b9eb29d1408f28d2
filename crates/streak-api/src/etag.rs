//! ETag computation for per-habit statistics.
//!
//! Statistics are a pure function of the habit's streak data and the
//! requesting day, so a SHA-256 over exactly those inputs identifies a stats
//! response. Titles, descriptions and reminders do not take part.

use axum::http::{HeaderMap, header};
use chrono::{Datelike as _, NaiveDate};
use sha2::{Digest, Sha256};
use streak_core::habit::Habit;

/// Fingerprint of everything `compute_habit_stats` and the trend read.
///
/// Returned quoted, ready for the `ETag` header.
pub fn history_fingerprint(habit: &Habit, today: NaiveDate) -> String {
  let mut hasher = Sha256::new();
  hasher.update(habit.id.as_bytes());
  hasher.update(habit.created_at.timestamp_micros().to_le_bytes());
  hasher.update(AsRef::<str>::as_ref(&habit.status).as_bytes());
  hasher.update([habit.current_streak]);
  hasher.update(today.num_days_from_ce().to_le_bytes());

  for period in &habit.streak_history {
    hasher.update(period.start_date.num_days_from_ce().to_le_bytes());
    hasher.update(period.end_date.num_days_from_ce().to_le_bytes());
    hasher.update([u8::from(period.completed), u8::from(period.continued)]);
  }

  format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Whether the request's `If-None-Match` already names `etag`.
///
/// Accepts `*`, comma-separated lists, weak validators and bare (unquoted)
/// tags.
pub fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  let bare = etag.trim_matches('"');
  headers
    .get_all(header::IF_NONE_MATCH)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .map(str::trim)
    .any(|candidate| {
      candidate == "*"
        || candidate
          .strip_prefix("W/")
          .unwrap_or(candidate)
          .trim_matches('"')
          == bare
    })
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;
  use chrono::{TimeZone as _, Utc};
  use streak_core::habit::{NewHabit, StreakPeriod};
  use uuid::Uuid;

  use super::*;

  fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, d).unwrap() }

  fn habit() -> Habit {
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    Habit::new(Uuid::new_v4(), NewHabit::new("Read"), created)
  }

  fn with_history(mut h: Habit) -> Habit {
    h.streak_history.push(StreakPeriod {
      start_date: day(1),
      end_date:   day(3),
      completed:  true,
      continued:  false,
    });
    h.current_streak = 3;
    h.recount_streaks();
    h
  }

  #[test]
  fn stable_for_same_inputs() {
    let h = habit();
    assert_eq!(history_fingerprint(&h, day(5)), history_fingerprint(&h, day(5)));
  }

  #[test]
  fn cosmetic_edits_do_not_change_it() {
    let h = habit();
    let mut renamed = h.clone();
    renamed.title = "Read more".into();
    renamed.description = Some("fiction".into());
    assert_eq!(history_fingerprint(&h, day(5)), history_fingerprint(&renamed, day(5)));
  }

  #[test]
  fn history_and_day_change_it() {
    let h = habit();
    let before = history_fingerprint(&h, day(5));
    assert_ne!(before, history_fingerprint(&with_history(h.clone()), day(5)));
    assert_ne!(before, history_fingerprint(&h, day(6)));
  }

  #[test]
  fn continued_flag_changes_it() {
    let h = with_history(habit());
    let mut continued = h.clone();
    continued.streak_history[0].continued = true;
    continued.current_streak = 0;
    assert_ne!(history_fingerprint(&h, day(5)), history_fingerprint(&continued, day(5)));
  }

  #[test]
  fn if_none_match_forms() {
    let etag = "\"abc\"";
    let mut headers = HeaderMap::new();
    assert!(!if_none_match(&headers, etag));

    headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"abc\""));
    assert!(if_none_match(&headers, etag));

    headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("abc"));
    assert!(if_none_match(&headers, etag));

    headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"x\", W/\"abc\""));
    assert!(if_none_match(&headers, etag));

    headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("*"));
    assert!(if_none_match(&headers, etag));

    headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"other\""));
    assert!(!if_none_match(&headers, etag));
  }
}
