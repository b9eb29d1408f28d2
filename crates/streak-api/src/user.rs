//! The [`CurrentUser`] extractor.
//!
//! Authentication happens outside this crate. Whatever authenticates the
//! request inserts a [`UserContext`] into the request extensions; a request
//! without one is treated as anonymous and rejected by the tracker.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use streak_core::context::UserContext;

pub struct CurrentUser(pub UserContext);

impl<S> FromRequestParts<S> for CurrentUser
where
  S: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
    let ctx = parts
      .extensions
      .get::<UserContext>()
      .copied()
      .unwrap_or_else(UserContext::anonymous);
    Ok(CurrentUser(ctx))
  }
}
