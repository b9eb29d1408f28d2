//! SQL schema for the streak SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per habit. The streak history is a JSON array of periods; it is
-- only ever rewritten as a whole inside the habit's own transaction.
CREATE TABLE IF NOT EXISTS habits (
    habit_id        TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL,
    title           TEXT NOT NULL,
    description     TEXT,
    status          TEXT NOT NULL DEFAULT 'active',   -- 'active' | 'paused' | 'completed'
    current_streak  INTEGER NOT NULL DEFAULT 0
                    CHECK (current_streak BETWEEN 0 AND 3),
    total_streaks   INTEGER NOT NULL DEFAULT 0,
    last_checked    TEXT,                              -- ISO 8601 UTC
    streak_history  TEXT NOT NULL DEFAULT '[]',
    reminder_time   TEXT,                              -- HH:MM:SS local
    created_at      TEXT NOT NULL,
    -- sync marker
    version         INTEGER NOT NULL DEFAULT 1,
    sync_status     TEXT NOT NULL DEFAULT 'pending',   -- 'pending' | 'synced'
    last_synced     TEXT,
    updated_at      TEXT NOT NULL
);

-- Counters only ever grow.
CREATE TABLE IF NOT EXISTS badge_progress (
    user_id           TEXT PRIMARY KEY,
    streaks_completed INTEGER NOT NULL DEFAULT 0,
    total_streaks     INTEGER NOT NULL DEFAULT 0,
    habits_created    INTEGER NOT NULL DEFAULT 0,
    resumed_habits    INTEGER NOT NULL DEFAULT 0
);

-- A badge is awarded at most once per user.
CREATE TABLE IF NOT EXISTS badge_awards (
    user_id    TEXT NOT NULL,
    badge_id   TEXT NOT NULL,
    awarded_at TEXT NOT NULL,
    PRIMARY KEY (user_id, badge_id)
);

CREATE INDEX IF NOT EXISTS habits_user_idx ON habits(user_id, created_at);

PRAGMA user_version = 1;
";
