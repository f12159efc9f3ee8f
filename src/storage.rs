use chrono::{DateTime, Duration as ChronoDuration, Local, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::app_dirs::AppDirs;
use crate::metrics::Sample;
use crate::session::SessionResult;
use crate::target::Mode;

const CURRENT_SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to create data directory")]
    Io(#[from] io::Error),
    #[error("no data directory available")]
    NoDataDir,
}

/// Where finished results go. The session core never depends on this succeeding.
pub trait ResultSink {
    fn save(&mut self, result: &SessionResult) -> Result<i64, StorageError>;
}

/// A persisted session row
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub id: i64,
    pub started_at: DateTime<Local>,
    pub mode: Mode,
    pub seconds: u64,
    pub words: usize,
    pub quote_id: Option<String>,
    pub target_len: usize,
    pub duration_ms: u64,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub total_typed: usize,
    pub accuracy: f64,
    pub wpm: f64,
    pub raw_wpm: f64,
}

impl StoredSession {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModeStats {
    pub test_count: usize,
    pub average_wpm: f64,
    pub best_wpm: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub total_tests: usize,
    pub total_time: Duration,
    pub average_wpm: f64,
    pub best_wpm: f64,
    pub average_accuracy: f64,
    pub last_7_days_avg_wpm: f64,
    pub last_30_days_avg_wpm: f64,
    pub per_mode: BTreeMap<Mode, ModeStats>,
}

const SESSION_COLUMNS: &str = "id, started_at, mode, seconds, words, quote_id, target_len, \
     duration_ms, correct_chars, incorrect_chars, total_typed, accuracy, wpm, raw_wpm";

/// Timestamps are stored as UTC RFC 3339 so text ordering is chronological
fn encode_timestamp(at: &DateTime<Local>) -> String {
    at.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<StoredSession> {
    let started_at: String = row.get(1)?;
    let mode: String = row.get(2)?;
    let quote_id: String = row.get(5)?;

    Ok(StoredSession {
        id: row.get(0)?,
        started_at: decode_timestamp(1, &started_at)?,
        mode: mode
            .parse()
            .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into()))?,
        seconds: row.get(3)?,
        words: row.get(4)?,
        quote_id: (!quote_id.is_empty()).then_some(quote_id),
        target_len: row.get(6)?,
        duration_ms: row.get(7)?,
        correct_chars: row.get(8)?,
        incorrect_chars: row.get(9)?,
        total_typed: row.get(10)?,
        accuracy: row.get(11)?,
        wpm: row.get(12)?,
        raw_wpm: row.get(13)?,
    })
}

/// SQLite-backed history of finished sessions
#[derive(Debug)]
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open the database at the default location, creating it if needed
    pub fn open_default() -> Result<Self, StorageError> {
        let path = AppDirs::db_path().ok_or(StorageError::NoDataDir)?;
        Self::open(&path)
    }

    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!(target: "storage", path = %path.display(), "database_opened");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let mut store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn default_path() -> Option<PathBuf> {
        AppDirs::db_path()
    }

    pub fn schema_version(&self) -> Result<i64, StorageError> {
        let version = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?;
        Ok(version)
    }

    fn migrate(&mut self) -> Result<(), StorageError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
            [],
        )?;

        let version = self.schema_version()?;
        if version < 1 {
            self.migrate_v1()?;
        }
        debug!(target: "storage", from = version, to = CURRENT_SCHEMA_VERSION, "schema_ready");
        Ok(())
    }

    fn migrate_v1(&mut self) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                started_at TEXT NOT NULL,
                mode TEXT NOT NULL,
                seconds INTEGER NOT NULL DEFAULT 0,
                words INTEGER NOT NULL DEFAULT 0,
                quote_id TEXT NOT NULL DEFAULT '',
                target_len INTEGER NOT NULL,
                duration_ms INTEGER NOT NULL,
                correct_chars INTEGER NOT NULL,
                incorrect_chars INTEGER NOT NULL DEFAULT 0,
                total_typed INTEGER NOT NULL,
                accuracy REAL NOT NULL,
                wpm REAL NOT NULL,
                raw_wpm REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS samples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL,
                time_ms INTEGER NOT NULL,
                wpm REAL NOT NULL,
                raw_wpm REAL NOT NULL,
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_mode ON sessions(mode);
            CREATE INDEX IF NOT EXISTS idx_samples_session_id ON samples(session_id);

            INSERT INTO schema_version (version) VALUES (1);
            "#,
        )?;
        tx.commit()?;
        info!(target: "storage", version = 1, "schema_migrated");
        Ok(())
    }

    /// Persist a session row and its samples in one transaction
    pub fn save_session(&mut self, result: &SessionResult) -> Result<i64, StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO sessions (
                started_at, mode, seconds, words, quote_id, target_len,
                duration_ms, correct_chars, incorrect_chars, total_typed,
                accuracy, wpm, raw_wpm
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                encode_timestamp(&result.started_at),
                result.mode.to_string(),
                result.metadata.seconds,
                result.metadata.word_count,
                result.metadata.quote_id.as_deref().unwrap_or(""),
                result.target_len,
                result.duration.as_millis() as u64,
                result.correct_chars,
                result.incorrect_chars(),
                result.total_typed,
                result.accuracy,
                result.wpm,
                result.raw_wpm,
            ],
        )?;
        let id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO samples (session_id, time_ms, wpm, raw_wpm) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for sample in &result.samples {
                stmt.execute(params![id, sample.elapsed_ms, sample.wpm, sample.raw_wpm])?;
            }
        }

        tx.commit()?;
        info!(target: "storage", id, samples = result.samples.len(), "session_saved");
        Ok(id)
    }

    pub fn get_session(&self, id: i64) -> Result<Option<StoredSession>, StorageError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
        let session = self
            .conn
            .query_row(&sql, [id], session_from_row)
            .optional()?;
        Ok(session)
    }

    pub fn get_samples(&self, session_id: i64) -> Result<Vec<Sample>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT time_ms, wpm, raw_wpm FROM samples WHERE session_id = ?1 ORDER BY time_ms, id",
        )?;
        let samples = stmt
            .query_map([session_id], |row| {
                Ok(Sample::new(row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(samples)
    }

    /// Most recent sessions first, optionally restricted to one mode
    pub fn list_sessions(
        &self,
        limit: usize,
        mode: Option<Mode>,
    ) -> Result<Vec<StoredSession>, StorageError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE (?1 IS NULL OR mode = ?1) \
             ORDER BY started_at DESC, id DESC LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let sessions = stmt
            .query_map(
                params![mode.map(|m| m.to_string()), limit],
                session_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    pub fn get_stats(&self) -> Result<Stats, StorageError> {
        self.get_stats_at(Local::now())
    }

    /// Aggregates with the 7/30 day windows measured back from `now`
    pub fn get_stats_at(&self, now: DateTime<Local>) -> Result<Stats, StorageError> {
        let (total_tests, total_ms, average_wpm, best_wpm, average_accuracy): (
            i64,
            i64,
            f64,
            f64,
            f64,
        ) = self.conn.query_row(
            r#"
            SELECT COUNT(*), COALESCE(SUM(duration_ms), 0),
                   COALESCE(AVG(wpm), 0.0), COALESCE(MAX(wpm), 0.0),
                   COALESCE(AVG(accuracy), 0.0)
            FROM sessions
            "#,
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )?;

        let mut stats = Stats {
            total_tests: total_tests.max(0) as usize,
            total_time: Duration::from_millis(total_ms.max(0) as u64),
            average_wpm,
            best_wpm,
            average_accuracy,
            last_7_days_avg_wpm: self.average_wpm_since(now - ChronoDuration::days(7))?,
            last_30_days_avg_wpm: self.average_wpm_since(now - ChronoDuration::days(30))?,
            per_mode: BTreeMap::new(),
        };

        let mut stmt = self.conn.prepare(
            r#"
            SELECT mode, COUNT(*), COALESCE(AVG(wpm), 0.0), COALESCE(MAX(wpm), 0.0)
            FROM sessions
            GROUP BY mode
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let mode: String = row.get(0)?;
            let mode: Mode = mode.parse().map_err(|e: String| {
                rusqlite::Error::FromSqlConversionFailure(0, Type::Text, e.into())
            })?;
            let count: i64 = row.get(1)?;
            Ok((
                mode,
                ModeStats {
                    test_count: count.max(0) as usize,
                    average_wpm: row.get(2)?,
                    best_wpm: row.get(3)?,
                },
            ))
        })?;
        for row in rows {
            let (mode, mode_stats) = row?;
            stats.per_mode.insert(mode, mode_stats);
        }

        Ok(stats)
    }

    fn average_wpm_since(&self, since: DateTime<Local>) -> Result<f64, StorageError> {
        let avg = self.conn.query_row(
            "SELECT COALESCE(AVG(wpm), 0.0) FROM sessions WHERE started_at >= ?1",
            [encode_timestamp(&since)],
            |row| row.get(0),
        )?;
        Ok(avg)
    }

    /// Remove a session and its samples. Returns whether it existed.
    pub fn delete_session(&mut self, id: i64) -> Result<bool, StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM samples WHERE session_id = ?1", [id])?;
        let removed = tx.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
        tx.commit()?;
        debug!(target: "storage", id, removed, "session_deleted");
        Ok(removed > 0)
    }
}

impl ResultSink for SessionStore {
    fn save(&mut self, result: &SessionResult) -> Result<i64, StorageError> {
        self.save_session(result)
    }
}

/// Keeps results in memory; used where no database should be touched
#[derive(Debug, Default)]
pub struct MemorySink {
    pub results: Vec<SessionResult>,
}

impl ResultSink for MemorySink {
    fn save(&mut self, result: &SessionResult) -> Result<i64, StorageError> {
        self.results.push(result.clone());
        Ok(self.results.len() as i64)
    }
}
