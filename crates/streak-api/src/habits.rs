//! Handlers for `/habits` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/habits` | The caller's habits, oldest first |
//! | `POST`   | `/habits` | Body: [`NewHabit`]; returns 201 + habit and new badges |
//! | `GET`    | `/habits/:id` | 404 if not found |
//! | `PATCH`  | `/habits/:id` | Body: [`HabitPatch`] |
//! | `DELETE` | `/habits/:id` | 204 |
//! | `POST`   | `/habits/:id/check-in` | Body: `{"completed":true[,"at":"<rfc3339>"]}`; 400 if `at` is in the future |
//! | `POST`   | `/habits/:id/milestone` | Body: `{"continue":true}` |
//! | `POST`   | `/habits/:id/pause` | |
//! | `POST`   | `/habits/:id/resume` | |
//! | `GET`    | `/habits/:id/sync` | Sync marker |
//! | `POST`   | `/habits/:id/sync` | Body: `{"version":3}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::{Deserialize, Serialize};
use streak_core::{
  habit::{Habit, HabitPatch, NewHabit},
  notify::Notifier,
  store::{HabitStore, SyncMarker},
  tracker::{CheckInReport, HabitTracker, HabitUpdate},
};
use uuid::Uuid;

use crate::{error::ApiError, user::CurrentUser};

fn require_title(title: &str) -> Result<(), ApiError> {
  if title.trim().is_empty() {
    return Err(ApiError::BadRequest("title must not be empty".into()));
  }
  Ok(())
}

// ─── List / create ───────────────────────────────────────────────────────────

/// `GET /habits`
pub async fn list<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
) -> Result<Json<Vec<Habit>>, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  let habits = tracker.list_habits(&ctx).await.map_err(ApiError::from_store)?;
  Ok(Json(habits))
}

/// `POST /habits`
pub async fn create<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
  Json(body): Json<NewHabit>,
) -> Result<(StatusCode, Json<HabitUpdate>), ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  require_title(&body.title)?;
  let update = tracker
    .create_habit(&ctx, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(update)))
}

// ─── Single habit ────────────────────────────────────────────────────────────

/// `GET /habits/:id`
pub async fn get_one<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Habit>, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  let habit = tracker.get_habit(&ctx, id).await.map_err(ApiError::from_store)?;
  Ok(Json(habit))
}

/// `PATCH /habits/:id`
pub async fn update<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
  Path(id): Path<Uuid>,
  Json(patch): Json<HabitPatch>,
) -> Result<Json<Habit>, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  if let Some(title) = &patch.title {
    require_title(title)?;
  }
  let habit = tracker
    .update_habit(&ctx, id, patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(habit))
}

/// `DELETE /habits/:id`
pub async fn delete<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  tracker.delete_habit(&ctx, id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Streaks ─────────────────────────────────────────────────────────────────

/// How far ahead of the server clock a client-supplied `at` may be.
const MAX_CLOCK_SKEW_MINUTES: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct CheckInBody {
  pub completed: bool,
  /// When the check-in happened. Defaults to now; always interpreted in the
  /// caller's own time zone. Must not lie in the future.
  #[serde(default)]
  pub at:        Option<DateTime<FixedOffset>>,
}

/// `POST /habits/:id/check-in`
pub async fn check_in<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<CheckInBody>,
) -> Result<Json<CheckInReport>, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  let current = ctx.now();
  let now = match body.at {
    Some(at) if at > current + TimeDelta::minutes(MAX_CLOCK_SKEW_MINUTES) => {
      return Err(ApiError::BadRequest("check-in time is in the future".into()));
    }
    Some(at) => at.with_timezone(&ctx.utc_offset),
    None => current,
  };
  let report = tracker
    .check_in(&ctx, id, body.completed, now)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct MilestoneBody {
  #[serde(rename = "continue")]
  pub continue_streak: bool,
}

/// `POST /habits/:id/milestone`
pub async fn milestone<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<MilestoneBody>,
) -> Result<Json<Habit>, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  let habit = tracker
    .resolve_milestone(&ctx, id, body.continue_streak)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(habit))
}

/// `POST /habits/:id/pause`
pub async fn pause<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Habit>, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  let habit = tracker.pause_habit(&ctx, id).await.map_err(ApiError::from_store)?;
  Ok(Json(habit))
}

/// `POST /habits/:id/resume`
pub async fn resume<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<HabitUpdate>, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  let update = tracker.resume_habit(&ctx, id).await.map_err(ApiError::from_store)?;
  Ok(Json(update))
}

// ─── Sync ────────────────────────────────────────────────────────────────────

/// `GET /habits/:id/sync`
pub async fn sync_marker<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<SyncMarker>, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  let marker = tracker.sync_marker(&ctx, id).await.map_err(ApiError::from_store)?;
  Ok(Json(marker))
}

#[derive(Debug, Deserialize)]
pub struct SyncBody {
  pub version: u64,
}

#[derive(Debug, Serialize)]
pub struct SyncAck {
  /// `false` when the record changed after `version` was read.
  pub accepted: bool,
  pub marker:   SyncMarker,
}

/// `POST /habits/:id/sync`
pub async fn confirm_sync<S, N>(
  State(tracker): State<Arc<HabitTracker<S, N>>>,
  CurrentUser(ctx): CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<SyncBody>,
) -> Result<Json<SyncAck>, ApiError>
where
  S: HabitStore + 'static,
  N: Notifier + 'static,
{
  let accepted = tracker
    .mark_synced(&ctx, id, body.version)
    .await
    .map_err(ApiError::from_store)?;
  let marker = tracker.sync_marker(&ctx, id).await.map_err(ApiError::from_store)?;
  Ok(Json(SyncAck { accepted, marker }))
}
