//! Status transitions: the milestone decision, pausing and resuming.
//!
//! ```text
//!            pause             continue (streak -> 0)
//!   paused <-------- active <--------------------+
//!          --------> active --(3rd day)--> pending decision
//!            resume                              |
//!                               complete         v
//!                                            completed
//! ```
//!
//! Like the engine, these functions never touch storage.

use crate::{
  Error, Result,
  habit::{Habit, HabitStatus, StreakState},
};

/// Apply the user's answer to a pending milestone.
///
/// `continue_streak = true` resets the counter so a new 3-day run can begin and
/// marks the milestone as continued. `false` completes the habit; its counter
/// stays at the goal and no further check-ins are accepted.
///
/// Fails with [`Error::NoPendingMilestone`] unless the habit is waiting for a
/// decision and its last history entry is an unresolved completed period.
pub fn resolve_milestone(habit: &Habit, continue_streak: bool) -> Result<Habit> {
  if habit.streak_state() != StreakState::PendingDecision {
    return Err(Error::NoPendingMilestone(habit.id));
  }

  let mut next = habit.clone();
  let Some(last) = next.streak_history.last_mut() else {
    return Err(Error::NoPendingMilestone(habit.id));
  };
  if !last.completed || last.continued {
    return Err(Error::NoPendingMilestone(habit.id));
  }

  if continue_streak {
    last.continued = true;
    next.current_streak = 0;
  } else {
    last.continued = false;
    next.status = HabitStatus::Completed;
  }
  next.recount_streaks();
  Ok(next)
}

/// Active → paused. The running streak is kept as-is.
pub fn pause(habit: &Habit) -> Result<Habit> {
  match habit.streak_state() {
    StreakState::InProgress(_) => Ok(Habit { status: HabitStatus::Paused, ..habit.clone() }),
    StreakState::PendingDecision => Err(Error::MilestonePending(habit.id)),
    StreakState::Paused(_) | StreakState::Completed => Err(Error::InvalidTransition {
      id:   habit.id,
      from: habit.status,
      to:   HabitStatus::Paused,
    }),
  }
}

/// Paused → active.
pub fn resume(habit: &Habit) -> Result<Habit> {
  if habit.status != HabitStatus::Paused {
    return Err(Error::InvalidTransition {
      id:   habit.id,
      from: habit.status,
      to:   HabitStatus::Active,
    });
  }
  Ok(Habit { status: HabitStatus::Active, ..habit.clone() })
}
