use chrono::{DateTime, Local};
use itertools::Itertools;
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};
use time_humanize::HumanTime;

use crate::app_dirs::AppDirs;
use crate::scoring::GameResult;
use crate::stage::StageDescriptor;
use crate::util::mean;

/// One finished attempt, as stored in the history database.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub stage_id: String,
    pub level: u32,
    pub mode: String,
    pub outcome: String,
    pub final_score: u32,
    pub lives_remaining: u32,
    pub time_remaining_secs: f64,
    pub failure_reason: Option<String>,
    pub played_at: DateTime<Local>,
}

impl AttemptRecord {
    pub fn from_result(stage: &StageDescriptor, result: &GameResult) -> Self {
        Self {
            stage_id: stage.stage_id.clone(),
            level: stage.level,
            mode: stage.mode.to_string(),
            outcome: result.outcome.to_string(),
            final_score: result.final_score,
            lives_remaining: result.lives_remaining,
            time_remaining_secs: result.time_remaining_secs,
            failure_reason: result.failure_reason.map(|r| r.to_string()),
            played_at: Local::now(),
        }
    }
}

/// Per-stage aggregate for the `--history` view.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub stage_id: String,
    pub attempts: usize,
    pub clears: usize,
    pub best_score: u32,
    pub avg_score: f64,
}

/// Database manager for attempt history
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the database under the platform state dir, creating it if needed.
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("snag_history.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        Self::open(Connection::open(&db_path)?)
    }

    /// Open at an explicit path; used by tests.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(Connection::open(path)?)
    }

    fn open(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                stage_id TEXT NOT NULL,
                level INTEGER NOT NULL,
                mode TEXT NOT NULL,
                outcome TEXT NOT NULL,
                final_score INTEGER NOT NULL,
                lives_remaining INTEGER NOT NULL,
                time_remaining_secs REAL NOT NULL,
                failure_reason TEXT,
                played_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_attempts_stage ON attempts(stage_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_attempts_played_at ON attempts(played_at)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    pub fn record_attempt(&self, rec: &AttemptRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO attempts
            (stage_id, level, mode, outcome, final_score, lives_remaining,
             time_remaining_secs, failure_reason, played_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                rec.stage_id,
                rec.level,
                rec.mode,
                rec.outcome,
                rec.final_score,
                rec.lives_remaining,
                rec.time_remaining_secs,
                rec.failure_reason,
                rec.played_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent attempts, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<AttemptRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT stage_id, level, mode, outcome, final_score, lives_remaining,
                   time_remaining_secs, failure_reason, played_at
            FROM attempts
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map(params![limit.min(i64::MAX as usize) as i64], Self::row_to_record)?;
        rows.collect()
    }

    /// Every attempt, oldest first; feeds the CSV export.
    fn all_attempts(&self) -> Result<Vec<AttemptRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT stage_id, level, mode, outcome, final_score, lives_remaining,
                   time_remaining_secs, failure_reason, played_at
            FROM attempts
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], Self::row_to_record)?;
        rows.collect()
    }

    pub fn best_score(&self, stage_id: &str) -> Result<Option<u32>> {
        self.conn.query_row(
            "SELECT MAX(final_score) FROM attempts WHERE stage_id = ?1",
            params![stage_id],
            |row| row.get::<_, Option<u32>>(0),
        )
    }

    pub fn attempt_count(&self) -> Result<usize> {
        self.conn
            .query_row("SELECT COUNT(*) FROM attempts", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
    }

    /// Aggregate attempts per stage, ordered by stage id.
    pub fn stage_summaries(&self) -> Result<Vec<StageSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT stage_id, level, mode, outcome, final_score, lives_remaining,
                   time_remaining_secs, failure_reason, played_at
            FROM attempts
            ORDER BY stage_id, id
            "#,
        )?;
        let rows: Vec<AttemptRecord> = stmt
            .query_map([], Self::row_to_record)?
            .collect::<Result<_>>()?;

        let summaries = rows
            .into_iter()
            .chunk_by(|rec| rec.stage_id.clone())
            .into_iter()
            .map(|(stage_id, group)| {
                let group: Vec<AttemptRecord> = group.collect();
                let scores: Vec<f64> = group.iter().map(|r| r.final_score as f64).collect();
                StageSummary {
                    stage_id,
                    attempts: group.len(),
                    clears: group.iter().filter(|r| r.outcome == "success").count(),
                    best_score: group.iter().map(|r| r.final_score).max().unwrap_or(0),
                    avg_score: mean(&scores).unwrap_or(0.0),
                }
            })
            .collect();
        Ok(summaries)
    }

    /// Export the full attempt log as CSV.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> csv::Result<()> {
        let rows = self
            .all_attempts()
            .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))?;

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "played_at",
            "stage_id",
            "level",
            "mode",
            "outcome",
            "final_score",
            "lives_remaining",
            "time_remaining_secs",
            "failure_reason",
        ])?;
        for rec in rows {
            writer.write_record([
                rec.played_at.to_rfc3339(),
                rec.stage_id,
                rec.level.to_string(),
                rec.mode,
                rec.outcome,
                rec.final_score.to_string(),
                rec.lives_remaining.to_string(),
                format!("{:.2}", rec.time_remaining_secs),
                rec.failure_reason.unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Relative time of the latest attempt, e.g. "2 hours ago".
    pub fn last_played_human(&self) -> Option<String> {
        let latest = self.recent(1).ok()?.into_iter().next()?;
        let secs_ago = (Local::now() - latest.played_at).num_seconds();
        Some(HumanTime::from(-secs_ago).to_string())
    }

    fn row_to_record(row: &rusqlite::Row) -> Result<AttemptRecord> {
        let played_at: String = row.get(8)?;
        Ok(AttemptRecord {
            stage_id: row.get(0)?,
            level: row.get(1)?,
            mode: row.get(2)?,
            outcome: row.get(3)?,
            final_score: row.get(4)?,
            lives_remaining: row.get(5)?,
            time_remaining_secs: row.get(6)?,
            failure_reason: row.get(7)?,
            played_at: DateTime::parse_from_rfc3339(&played_at)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| Local::now()),
        })
    }
}
