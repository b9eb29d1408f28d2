//! Error types for `streak-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::habit::HabitStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("habit not found: {0}")]
  HabitNotFound(Uuid),

  #[error("habit {id} is {status}, only active habits accept check-ins")]
  HabitNotActive { id: Uuid, status: HabitStatus },

  #[error("habit {0} has reached its milestone and is waiting for a decision")]
  MilestonePending(Uuid),

  #[error("habit {0} has no milestone waiting for a decision")]
  NoPendingMilestone(Uuid),

  #[error("habit {id} cannot move from {from} to {to}")]
  InvalidTransition {
    id:   Uuid,
    from: HabitStatus,
    to:   HabitStatus,
  },

  #[error("check-in for habit {0} is dated before its last check-in")]
  CheckInBeforeLastCheck(Uuid),

  #[error("no authenticated user")]
  Unauthenticated,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse error taxonomy shared by every layer.
///
/// Outer layers (the HTTP API in particular) only need to know which bucket an
/// error falls into, not which backend produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The referenced habit does not exist for this user. Not retried.
  NotFound,
  /// The habit is in the wrong state for the requested operation.
  InvalidState,
  /// No valid user context; rejected before storage is touched.
  Unauthenticated,
  /// Storage or network failure; the caller may retry with backoff.
  TransientIo,
  /// Corrupt data or a bug.
  Internal,
}

/// Implemented by every error type that can surface from a
/// [`HabitStore`](crate::store::HabitStore).
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::HabitNotFound(_) => ErrorKind::NotFound,
      Self::HabitNotActive { .. }
      | Self::MilestonePending(_)
      | Self::NoPendingMilestone(_)
      | Self::InvalidTransition { .. }
      | Self::CheckInBeforeLastCheck(_) => ErrorKind::InvalidState,
      Self::Unauthenticated => ErrorKind::Unauthenticated,
    }
  }
}
