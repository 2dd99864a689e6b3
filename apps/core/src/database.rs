use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::AppError;

/// The four persisted records. Each is one JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKey {
    Conversation,
    SessionState,
    MoodHistory,
    Theme,
}

impl RecordKey {
    pub const ALL: [RecordKey; 4] = [
        RecordKey::Conversation,
        RecordKey::SessionState,
        RecordKey::MoodHistory,
        RecordKey::Theme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKey::Conversation => "conversation",
            RecordKey::SessionState => "session_state",
            RecordKey::MoodHistory => "mood_history",
            RecordKey::Theme => "theme",
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opens the record store at `db_path`, or an in-memory store when `None`.
pub async fn init_db(db_path: Option<&Path>) -> Result<SqlitePool, AppError> {
    let options = match db_path {
        Some(path) => {
            info!("Initializing database at: {}", path.display());
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
        }
        None => {
            info!("Initializing in-memory database");
            SqliteConnectOptions::from_str("sqlite::memory:")?
        }
    };

    // A single long-lived connection keeps an in-memory database alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )
    .execute(&pool)
    .await?;

    info!("Database initialized.");
    Ok(pool)
}

/// Overwrites `key` with `value`. Last writer wins.
pub async fn save_record<T: Serialize + ?Sized>(
    pool: &SqlitePool,
    key: RecordKey,
    value: &T,
) -> Result<(), AppError> {
    let json = serde_json::to_string(value)?;
    save_raw(pool, key, &json).await?;
    debug!(%key, bytes = json.len(), "Record saved");
    Ok(())
}

/// Loads `key`, or its default when absent.
///
/// A record that no longer parses is logged and treated as absent. Only
/// database failures are returned as errors.
pub async fn load_record<T: DeserializeOwned + Default>(
    pool: &SqlitePool,
    key: RecordKey,
) -> Result<T, AppError> {
    let raw: Option<String> = sqlx::query_scalar("SELECT value FROM records WHERE key = ?")
        .bind(key.as_str())
        .fetch_optional(pool)
        .await?;

    let Some(raw) = raw else {
        return Ok(T::default());
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(%key, "Discarding unreadable record: {}", e);
            Ok(T::default())
        }
    }
}

pub async fn delete_record(pool: &SqlitePool, key: RecordKey) -> Result<(), AppError> {
    sqlx::query("DELETE FROM records WHERE key = ?")
        .bind(key.as_str())
        .execute(pool)
        .await?;
    debug!(%key, "Record deleted");
    Ok(())
}

/// Writes an already-serialized JSON document.
pub async fn save_raw(pool: &SqlitePool, key: RecordKey, raw: &str) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO records (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key.as_str())
    .bind(raw)
    .bind(Utc::now().timestamp_millis())
    .execute(pool)
    .await?;
    Ok(())
}
