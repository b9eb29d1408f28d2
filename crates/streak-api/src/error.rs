//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use streak_core::error::{Classify, ErrorKind};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The operation is not valid in the habit's current state.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unauthenticated")]
  Unauthenticated,

  #[error("storage unavailable: {0}")]
  Unavailable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a tracker or store error onto the HTTP taxonomy by its kind.
  pub fn from_store<E>(e: E) -> Self
  where
    E: Classify + std::error::Error + Send + Sync + 'static,
  {
    match e.kind() {
      ErrorKind::NotFound => ApiError::NotFound(e.to_string()),
      ErrorKind::InvalidState => ApiError::Conflict(e.to_string()),
      ErrorKind::Unauthenticated => ApiError::Unauthenticated,
      ErrorKind::TransientIo => ApiError::Unavailable(e.to_string()),
      ErrorKind::Internal => ApiError::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::Unavailable(m) => {
        tracing::warn!(error = %m, "storage unavailable");
        (StatusCode::SERVICE_UNAVAILABLE, m.clone())
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
