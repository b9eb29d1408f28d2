//! JSON REST API for the streak habit tracker.
//!
//! Exposes an axum [`Router`] backed by a [`HabitTracker`] over any
//! [`HabitStore`]. Authentication, TLS and transport concerns are the
//! caller's responsibility: the caller puts a
//! [`streak_core::context::UserContext`] into the request extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", streak_api::api_router(tracker.clone()))
//! ```

pub mod error;
pub mod etag;
pub mod habits;
pub mod stats;
pub mod user;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use streak_core::{notify::Notifier, store::HabitStore, tracker::HabitTracker};

pub use error::ApiError;

/// Build a fully-materialised API router for `tracker`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(tracker: Arc<HabitTracker<S, N>>) -> Router<()>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    // Habits
    .route("/habits", get(habits::list::<S, N>).post(habits::create::<S, N>))
    .route(
      "/habits/{id}",
      get(habits::get_one::<S, N>)
        .patch(habits::update::<S, N>)
        .delete(habits::delete::<S, N>),
    )
    .route("/habits/{id}/check-in", post(habits::check_in::<S, N>))
    .route("/habits/{id}/milestone", post(habits::milestone::<S, N>))
    .route("/habits/{id}/pause", post(habits::pause::<S, N>))
    .route("/habits/{id}/resume", post(habits::resume::<S, N>))
    .route(
      "/habits/{id}/sync",
      get(habits::sync_marker::<S, N>).post(habits::confirm_sync::<S, N>),
    )
    // Statistics
    .route("/habits/{id}/stats", get(stats::habit_stats::<S, N>))
    .route("/habits/{id}/trend", get(stats::trend::<S, N>))
    .route("/stats", get(stats::overall::<S, N>))
    .route("/badges", get(stats::badges::<S, N>))
    .with_state(tracker)
}
