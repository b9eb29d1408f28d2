//! HTTP Basic-auth against the configured user list.
//!
//! A successful check yields the [`UserContext`] the API layer runs under.

use std::{collections::HashMap, sync::Arc};

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::FixedOffset;
use serde::Deserialize;
use streak_core::context::UserContext;
use uuid::Uuid;

use crate::error::Error;

/// One account, as written in `config.toml`.
#[derive(Deserialize, Clone, Debug)]
pub struct UserConfig {
  pub username:           String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash:      String,
  pub user_id:            Uuid,
  /// Offset of the user's calendar day from UTC, e.g. `-300` for UTC-5.
  #[serde(default)]
  pub utc_offset_minutes: i32,
}

struct Account {
  password_hash: String,
  context:       UserContext,
}

/// Accounts accepted by this server instance, keyed by username.
pub struct UserDirectory {
  accounts: HashMap<String, Account>,
}

impl UserDirectory {
  /// Validate the configured users. Fails on duplicate usernames and on
  /// offsets outside ±24h.
  pub fn new(users: &[UserConfig]) -> Result<Self, Error> {
    let mut accounts = HashMap::with_capacity(users.len());
    for user in users {
      let offset = user
        .utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
          Error::Config(format!(
            "utc_offset_minutes {} out of range for {}",
            user.utc_offset_minutes, user.username
          ))
        })?;

      let account = Account {
        password_hash: user.password_hash.clone(),
        context:       UserContext::authenticated(user.user_id, offset),
      };
      if accounts.insert(user.username.clone(), account).is_some() {
        return Err(Error::Config(format!("duplicate username {}", user.username)));
      }
    }
    Ok(Self { accounts })
  }

  pub fn len(&self) -> usize { self.accounts.len() }

  pub fn is_empty(&self) -> bool { self.accounts.is_empty() }
}

/// Verify Basic credentials from `headers` and return the caller's context.
pub fn verify_auth(headers: &HeaderMap, users: &UserDirectory) -> Result<UserContext, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let account = users.accounts.get(username).ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&account.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(account.context)
}

/// Middleware: reject unauthenticated requests, otherwise attach the
/// caller's [`UserContext`] for the API handlers.
pub async fn require_user(
  State(users): State<Arc<UserDirectory>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let ctx = match verify_auth(req.headers(), &users) {
    Ok(ctx) => ctx,
    Err(e) => {
      tracing::debug!(uri = %req.uri(), "rejected credentials");
      return Err(e);
    }
  };
  req.extensions_mut().insert(ctx);
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::{HeaderValue, header};

  fn hash(password: &str) -> String {
    use argon2::{PasswordHasher, password_hash::SaltString};
    use rand_core::OsRng;
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  fn user(name: &str, password: &str, offset_minutes: i32) -> UserConfig {
    UserConfig {
      username:           name.to_string(),
      password_hash:      hash(password),
      user_id:            Uuid::new_v4(),
      utc_offset_minutes: offset_minutes,
    }
  }

  fn basic(user: &str, pass: &str) -> HeaderMap {
    let encoded = B64.encode(format!("{user}:{pass}"));
    let mut headers = HeaderMap::new();
    headers.insert(
      header::AUTHORIZATION,
      HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
    );
    headers
  }

  #[test]
  fn correct_credentials_yield_context() {
    let alice = user("alice", "secret", 120);
    let users = UserDirectory::new(std::slice::from_ref(&alice)).unwrap();

    let ctx = verify_auth(&basic("alice", "secret"), &users).unwrap();
    assert!(ctx.authenticated);
    assert_eq!(ctx.user_id, alice.user_id);
    assert_eq!(ctx.utc_offset.local_minus_utc(), 120 * 60);
  }

  #[test]
  fn wrong_password() {
    let users = UserDirectory::new(&[user("alice", "secret", 0)]).unwrap();
    assert!(matches!(
      verify_auth(&basic("alice", "wrong"), &users),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn unknown_user() {
    let users = UserDirectory::new(&[user("alice", "secret", 0)]).unwrap();
    assert!(matches!(
      verify_auth(&basic("bob", "secret"), &users),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn missing_header() {
    let users = UserDirectory::new(&[user("alice", "secret", 0)]).unwrap();
    assert!(matches!(verify_auth(&HeaderMap::new(), &users), Err(Error::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let users = UserDirectory::new(&[user("alice", "secret", 0)]).unwrap();
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic !!!not-base64!!!"));
    assert!(matches!(verify_auth(&headers, &users), Err(Error::Unauthorized)));
  }

  #[test]
  fn duplicate_usernames_are_rejected() {
    let result = UserDirectory::new(&[user("alice", "a", 0), user("alice", "b", 0)]);
    assert!(matches!(result, Err(Error::Config(_))));
  }

  #[test]
  fn out_of_range_offset_is_rejected() {
    let result = UserDirectory::new(&[user("alice", "a", 24 * 60)]);
    assert!(matches!(result, Err(Error::Config(_))));
  }
}
