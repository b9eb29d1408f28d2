//! Handlers for statistics and badges.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/habits/:id/stats` | `ETag`; honours `If-None-Match` with 304 |
//! | `GET`  | `/habits/:id/trend` | `?days=N`, default 14, at most 366 |
//! | `GET`  | `/stats` | Across all of the caller's habits |
//! | `GET`  | `/badges` | Counters, eligible set and awards |
//!
//! "Today" is always the caller's local calendar day.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use streak_core::{
  notify::Notifier,
  stats::{OverallStats, TrendPoint},
  store::HabitStore,
  tracker::{BadgeSummary, HabitTracker},
};
use uuid::Uuid;

use crate::{
  error::ApiError,
  etag::{history_fingerprint, if_none_match},
  user::CurrentUser,
};

pub const DEFAULT_TREND_DAYS: u32 = 14;
pub const MAX_TREND_DAYS: u32 = 366;

// ─── Per habit ───────────────────────────────────────────────────────────────

/// `GET /habits/:id/stats`
pub async fn habit_stats<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  let now = ctx.now();
  let (habit, stats) = tracker
    .habit_stats(&ctx, id, now)
    .await
    .map_err(ApiError::from_store)?;

  let etag = history_fingerprint(&habit, now.date_naive());
  if if_none_match(&headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }
  Ok(([(header::ETAG, etag)], Json(stats)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct TrendParams {
  pub days: Option<u32>,
}

/// `GET /habits/:id/trend[?days=N]`
pub async fn trend<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
  Path(id): Path<Uuid>,
  Query(params): Query<TrendParams>,
) -> Result<Json<Vec<TrendPoint>>, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  let days = params.days.unwrap_or(DEFAULT_TREND_DAYS);
  if !(1..=MAX_TREND_DAYS).contains(&days) {
    return Err(ApiError::BadRequest(format!(
      "days must be between 1 and {MAX_TREND_DAYS}"
    )));
  }

  let today = ctx.now().date_naive();
  let series = tracker
    .trend(&ctx, id, days, today)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(series))
}

// ─── Across habits ───────────────────────────────────────────────────────────

/// `GET /stats`
pub async fn overall<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
) -> Result<Json<OverallStats>, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  let stats = tracker
    .overall_stats(&ctx, ctx.now())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(stats))
}

/// `GET /badges`
pub async fn badges<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
) -> Result<Json<BadgeSummary>, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  let summary = tracker.badges(&ctx).await.map_err(ApiError::from_store)?;
  Ok(Json(summary))
}
