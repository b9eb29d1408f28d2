//! Reminder sink for the server binary.

use streak_core::notify::{DueReminder, Notifier};

/// Records reminder requests as tracing events.
///
/// Delivery (push, e-mail) is left to whatever consumes the log stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  fn habit_due(&self, reminder: DueReminder) {
    tracing::info!(
      user_id = %reminder.user_id,
      habit_id = %reminder.habit_id,
      time_of_day = %reminder.time_of_day,
      "reminder scheduled"
    );
  }
}
