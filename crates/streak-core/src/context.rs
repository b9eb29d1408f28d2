//! The caller's identity, as handed over by whatever does authentication.

use chrono::{DateTime, FixedOffset, Offset as _, Utc};
use uuid::Uuid;

use crate::{Error, Result};

/// Who is acting, and in which UTC offset their calendar days are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserContext {
  pub user_id:       Uuid,
  pub authenticated: bool,
  pub utc_offset:    FixedOffset,
}

impl UserContext {
  pub fn authenticated(user_id: Uuid, utc_offset: FixedOffset) -> Self {
    Self { user_id, authenticated: true, utc_offset }
  }

  /// A context that every operation rejects.
  pub fn anonymous() -> Self {
    Self {
      user_id:       Uuid::nil(),
      authenticated: false,
      utc_offset:    Utc.fix(),
    }
  }

  /// The user id, or [`Error::Unauthenticated`].
  pub fn require(&self) -> Result<Uuid> {
    if self.authenticated { Ok(self.user_id) } else { Err(Error::Unauthenticated) }
  }

  /// Current wall-clock time in the user's offset.
  pub fn now(&self) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&self.utc_offset)
  }
}
