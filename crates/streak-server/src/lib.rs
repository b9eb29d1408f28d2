//! HTTP server for the streak habit tracker.
//!
//! Wires configuration, Basic auth, the JSON API from `streak-api` and the
//! request-level layers (tracing, timeout) into one axum [`Router`].

pub mod auth;
pub mod error;
pub mod notifier;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Json, Router, middleware, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};
use streak_core::{notify::Notifier, store::HabitStore, tracker::HabitTracker};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use auth::{UserConfig, UserDirectory, require_user};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  pub store_path:           PathBuf,
  /// Requests still running after this long are answered with 408.
  #[serde(default = "default_request_timeout_secs")]
  pub request_timeout_secs: u64,
  #[serde(default)]
  pub users:                Vec<UserConfig>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_request_timeout_secs() -> u64 { 15 }

// ─── Application state ────────────────────────────────────────────────────────

/// Everything the router needs.
pub struct AppState<S, N = ()> {
  pub tracker: Arc<HabitTracker<S, N>>,
  pub users:   Arc<UserDirectory>,
  pub config:  Arc<ServerConfig>,
}

impl<S, N> Clone for AppState<S, N> {
  fn clone(&self) -> Self {
    Self {
      tracker: self.tracker.clone(),
      users:   self.users.clone(),
      config:  self.config.clone(),
    }
  }
}

impl<S, N> AppState<S, N>
where
  S: HabitStore,
  N: Notifier,
{
  /// Validate `config.users` and assemble the state around `tracker`.
  pub fn new(tracker: HabitTracker<S, N>, config: ServerConfig) -> Result<Self, Error> {
    let users = UserDirectory::new(&config.users)?;
    Ok(Self {
      tracker: Arc::new(tracker),
      users:   Arc::new(users),
      config:  Arc::new(config),
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server router: public `/health`, authenticated `/api`.
pub fn router<S, N>(state: AppState<S, N>) -> Router
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  let api = streak_api::api_router(state.tracker.clone())
    .layer(middleware::from_fn_with_state(state.users.clone(), require_user));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TimeoutLayer::new(Duration::from_secs(
      state.config.request_timeout_secs,
    )))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

// ─── Integration tests ────────────────────────────────────────────────────────
