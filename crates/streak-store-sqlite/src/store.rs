//! [`SqliteStore`] — the SQLite implementation of [`HabitStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use streak_core::{
  badge::{self, AwardedBadge, BadgeId, BadgeProgress, ProgressEvent},
  habit::{Habit, HabitPatch, NewHabit},
  store::{HabitStore, Recorded, SyncMarker, SyncStatus},
};

use crate::{
  encode::{
    encode_dt, encode_uuid, RawAward, RawHabit, RawProgress, RawSyncMarker, HABIT_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A habit store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All access
/// goes through one background connection, so every `call` runs in order.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn select_habit(
  conn: &rusqlite::Connection,
  user_id: &str,
  habit_id: &str,
) -> rusqlite::Result<Option<RawHabit>> {
  conn
    .query_row(
      &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE habit_id = ?1 AND user_id = ?2"),
      rusqlite::params![habit_id, user_id],
      RawHabit::from_row,
    )
    .optional()
}

/// Overwrite the mutable columns of a habit, bump its version and mark it
/// pending sync.
fn write_habit(conn: &rusqlite::Connection, raw: &RawHabit, now: &str) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE habits SET
       title = ?3, description = ?4, status = ?5,
       current_streak = ?6, total_streaks = ?7, last_checked = ?8,
       streak_history = ?9, reminder_time = ?10,
       version = version + 1, sync_status = ?11, updated_at = ?12
     WHERE habit_id = ?1 AND user_id = ?2",
    rusqlite::params![
      raw.habit_id,
      raw.user_id,
      raw.title,
      raw.description,
      raw.status,
      raw.current_streak,
      raw.total_streaks,
      raw.last_checked,
      raw.streak_history,
      raw.reminder_time,
      SyncStatus::Pending.as_ref(),
      now,
    ],
  )?;
  Ok(())
}

fn select_progress(
  conn: &rusqlite::Connection,
  user_id: &str,
) -> rusqlite::Result<Option<RawProgress>> {
  conn
    .query_row(
      "SELECT streaks_completed, total_streaks, habits_created, resumed_habits
       FROM badge_progress WHERE user_id = ?1",
      rusqlite::params![user_id],
      RawProgress::from_row,
    )
    .optional()
}

fn select_awards(conn: &rusqlite::Connection, user_id: &str) -> rusqlite::Result<Vec<RawAward>> {
  let mut stmt = conn.prepare(
    "SELECT badge_id, awarded_at FROM badge_awards
     WHERE user_id = ?1
     ORDER BY awarded_at, badge_id",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![user_id], |r| {
      Ok(RawAward {
        badge_id:   r.get(0)?,
        awarded_at: r.get(1)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Apply `event` to the owner's counters and insert every badge the new
/// counters unlock. Must run inside the caller's transaction.
fn apply_event(
  conn: &rusqlite::Connection,
  user_id: &str,
  event: ProgressEvent,
  awarded_at: DateTime<Utc>,
) -> Result<Vec<AwardedBadge>> {
  let mut progress = match select_progress(conn, user_id)? {
    Some(raw) => raw.into_progress()?,
    None => BadgeProgress::default(),
  };
  progress.apply(event);

  conn.execute(
    "INSERT INTO badge_progress (
       user_id, streaks_completed, total_streaks, habits_created, resumed_habits
     ) VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (user_id) DO UPDATE SET
       streaks_completed = excluded.streaks_completed,
       total_streaks     = excluded.total_streaks,
       habits_created    = excluded.habits_created,
       resumed_habits    = excluded.resumed_habits",
    rusqlite::params![
      user_id,
      i64::from(progress.streaks_completed),
      i64::from(progress.total_streaks),
      i64::from(progress.habits_created),
      i64::from(progress.resumed_habits),
    ],
  )?;

  let held = select_awards(conn, user_id)?
    .into_iter()
    .map(|raw| raw.into_award().map(|a| a.badge_id))
    .collect::<Result<BTreeSet<BadgeId>>>()?;

  let at_str = encode_dt(awarded_at);
  let mut stmt = conn.prepare(
    "INSERT OR IGNORE INTO badge_awards (user_id, badge_id, awarded_at)
     VALUES (?1, ?2, ?3)",
  )?;
  let mut awarded = Vec::new();
  for badge_id in badge::newly_earned(&progress, &held) {
    if stmt.execute(rusqlite::params![user_id, badge_id.as_ref(), at_str])? > 0 {
      awarded.push(AwardedBadge { badge_id, awarded_at });
    }
  }
  Ok(awarded)
}

// ─── HabitStore impl ─────────────────────────────────────────────────────────

impl HabitStore for SqliteStore {
  type Error = Error;

  // ── Habits ────────────────────────────────────────────────────────────────

  async fn create_habit(&self, user_id: Uuid, input: NewHabit) -> Result<Recorded<Habit>> {
    let now = Utc::now();
    let habit = Habit::new(user_id, input, now);
    let raw = RawHabit::encode(&habit)?;

    let new_badges = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "INSERT INTO habits (
             habit_id, user_id, title, description, status,
             current_streak, total_streaks, last_checked,
             streak_history, reminder_time, created_at,
             version, sync_status, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1, ?12, ?11)",
          rusqlite::params![
            raw.habit_id,
            raw.user_id,
            raw.title,
            raw.description,
            raw.status,
            raw.current_streak,
            raw.total_streaks,
            raw.last_checked,
            raw.streak_history,
            raw.reminder_time,
            raw.created_at,
            SyncStatus::Pending.as_ref(),
          ],
        )?;

        match apply_event(&tx, &raw.user_id, ProgressEvent::HabitCreated, now) {
          Ok(awarded) => {
            tx.commit()?;
            Ok(Ok(awarded))
          }
          Err(e) => Ok(Err(e)),
        }
      })
      .await??;

    Ok(Recorded { value: habit, new_badges })
  }

  async fn get_habit(&self, user_id: Uuid, habit_id: Uuid) -> Result<Option<Habit>> {
    let user_str = encode_uuid(user_id);
    let habit_str = encode_uuid(habit_id);

    let raw = self
      .conn
      .call(move |conn| Ok(select_habit(conn, &user_str, &habit_str)?))
      .await?;

    raw.map(RawHabit::into_habit).transpose()
  }

  async fn list_habits(&self, user_id: Uuid) -> Result<Vec<Habit>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawHabit> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {HABIT_COLUMNS} FROM habits
           WHERE user_id = ?1
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawHabit::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHabit::into_habit).collect()
  }

  async fn update_habit(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
    patch: HabitPatch,
  ) -> Result<Habit> {
    self
      .modify_habit(user_id, habit_id, move |habit| {
        habit.apply_patch(patch);
        Ok(habit.clone())
      })
      .await
  }

  async fn modify_habit<F, T>(&self, user_id: Uuid, habit_id: Uuid, f: F) -> Result<T>
  where
    F: FnOnce(&mut Habit) -> streak_core::Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let recorded = self
      .modify_habit_recording(user_id, habit_id, move |habit| Ok((f(habit)?, None)))
      .await?;
    Ok(recorded.value)
  }

  async fn modify_habit_recording<F, T>(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
    f: F,
  ) -> Result<Recorded<T>>
  where
    F: FnOnce(&mut Habit) -> streak_core::Result<(T, Option<ProgressEvent>)> + Send + 'static,
    T: Send + 'static,
  {
    let user_str = encode_uuid(user_id);
    let habit_str = encode_uuid(habit_id);

    // The whole read-modify-write, including the badge bookkeeping, runs
    // inside one `call` and one IMMEDIATE transaction. Dropping the caller's
    // future cannot split it.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(raw) = select_habit(&tx, &user_str, &habit_str)? else {
          return Ok(Err(Error::Core(streak_core::Error::HabitNotFound(habit_id))));
        };

        let outcome = (|| -> Result<Recorded<T>> {
          let before = raw.into_habit()?;
          let mut habit = before.clone();
          let (value, event) = f(&mut habit)?;

          let now = Utc::now();
          if habit != before {
            write_habit(&tx, &RawHabit::encode(&habit)?, &encode_dt(now))?;
          }
          let new_badges = match event {
            Some(event) => apply_event(&tx, &user_str, event, now)?,
            None => Vec::new(),
          };
          Ok(Recorded { value, new_badges })
        })();

        match outcome {
          Ok(recorded) => {
            tx.commit()?;
            Ok(Ok(recorded))
          }
          // Dropping `tx` rolls back.
          Err(e) => Ok(Err(e)),
        }
      })
      .await?
  }

  async fn delete_habit(&self, user_id: Uuid, habit_id: Uuid) -> Result<bool> {
    let user_str = encode_uuid(user_id);
    let habit_str = encode_uuid(habit_id);

    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM habits WHERE habit_id = ?1 AND user_id = ?2",
          rusqlite::params![habit_str, user_str],
        )?;
        Ok(n > 0)
      })
      .await?;
    Ok(deleted)
  }

  // ── Badge progress ────────────────────────────────────────────────────────

  async fn badge_progress(&self, user_id: Uuid) -> Result<BadgeProgress> {
    let user_str = encode_uuid(user_id);

    let raw = self
      .conn
      .call(move |conn| Ok(select_progress(conn, &user_str)?))
      .await?;

    match raw {
      Some(raw) => raw.into_progress(),
      None => Ok(BadgeProgress::default()),
    }
  }

  async fn awarded_badges(&self, user_id: Uuid) -> Result<Vec<AwardedBadge>> {
    let user_str = encode_uuid(user_id);

    let raws = self
      .conn
      .call(move |conn| Ok(select_awards(conn, &user_str)?))
      .await?;

    raws.into_iter().map(RawAward::into_award).collect()
  }

  // ── Sync ──────────────────────────────────────────────────────────────────

  async fn sync_marker(&self, user_id: Uuid, habit_id: Uuid) -> Result<Option<SyncMarker>> {
    let user_str = encode_uuid(user_id);
    let habit_str = encode_uuid(habit_id);

    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT version, sync_status, last_synced, updated_at
               FROM habits WHERE habit_id = ?1 AND user_id = ?2",
              rusqlite::params![habit_str, user_str],
              |r| {
                Ok(RawSyncMarker {
                  version:     r.get(0)?,
                  status:      r.get(1)?,
                  last_synced: r.get(2)?,
                  updated_at:  r.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSyncMarker::into_marker).transpose()
  }

  async fn mark_synced(&self, user_id: Uuid, habit_id: Uuid, version: u64) -> Result<bool> {
    let user_str = encode_uuid(user_id);
    let habit_str = encode_uuid(habit_id);
    // A version beyond i64 can never match a stored row.
    let Ok(version) = i64::try_from(version) else {
      return Ok(false);
    };
    let now = encode_dt(Utc::now());

    let updated = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE habits SET sync_status = ?4, last_synced = ?5
           WHERE habit_id = ?1 AND user_id = ?2 AND version = ?3",
          rusqlite::params![habit_str, user_str, version, SyncStatus::Synced.as_ref(), now],
        )?;
        Ok(n > 0)
      })
      .await?;
    Ok(updated)
  }
}
