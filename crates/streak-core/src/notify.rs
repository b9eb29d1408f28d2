//! Outbound reminder requests.
//!
//! Scheduling itself belongs to whatever implements [`Notifier`]; the core
//! only says which habit is due at which local time and never waits for an
//! answer.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueReminder {
  pub user_id:     Uuid,
  pub habit_id:    Uuid,
  pub time_of_day: NaiveTime,
}

/// Fire-and-forget sink for "habit due" requests.
pub trait Notifier: Send + Sync {
  fn habit_due(&self, reminder: DueReminder);
}

/// Drops every request.
impl Notifier for () {
  fn habit_due(&self, _: DueReminder) {}
}
