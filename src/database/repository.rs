/*!
 * Repository layer for database operations.
 *
 * This module provides the SQLite implementation of `JobStore`,
 * abstracting away the SQL details and providing type-safe access.
 */

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};

use super::connection::{DatabaseConnection, DatabaseStats};
use super::models::{download_url_for, JobRecord};
use crate::captions::{Position, StyleOptions};
use crate::errors::StoreError;
use crate::jobs::state::{JobStatus, COMPLETED_PROGRESS, FAILED_PROGRESS};
use crate::jobs::store::JobStore;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.db.path())
            .finish()
    }
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Job counts and file size
    pub fn stats(&self) -> Result<DatabaseStats> {
        self.db.stats()
    }

    /// Get a job by ID (synchronous version for use within transactions)
    fn get_job_sync(conn: &Connection, job_id: &str) -> Result<Option<JobRecord>> {
        let result = conn
            .query_row(
                r#"
                SELECT j.job_id, j.status_id, j.progress, j.input_path, j.output_path,
                       j.original_filename, j.created_at, j.completed_at, j.download_url,
                       j.failed_message,
                       o.font, o.font_size, o.font_color, o.stroke_color, o.stroke_width,
                       o.position_id, o.shadow_enabled, o.max_chars, o.max_duration, o.max_gap
                FROM jobs j
                JOIN subtitle_options o ON o.job_id = j.job_id
                WHERE j.job_id = ?1
                "#,
                [job_id],
                parse_job_row,
            )
            .optional()?;

        Ok(result)
    }

    /// Current status and progress, used to guard transitions
    fn get_state_sync(conn: &Connection, job_id: &str) -> Result<Option<(JobStatus, u8)>> {
        let row: Option<(i64, u8)> = conn
            .query_row(
                "SELECT status_id, progress FROM jobs WHERE job_id = ?1",
                [job_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((code, progress)) => Ok(Some((JobStatus::from_code(code)?, progress))),
            None => Ok(None),
        }
    }

    /// Apply a terminal write unless the job is already terminal
    async fn finish_job(
        &self,
        job_id: &str,
        status: JobStatus,
        failure_message: Option<String>,
    ) -> Result<bool, StoreError> {
        let id = job_id.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        let changed = self
            .db
            .execute_async(move |conn| {
                let changed = match status {
                    JobStatus::Completed => conn.execute(
                        r#"
                        UPDATE jobs
                        SET status_id = ?1, progress = ?2, completed_at = ?3, download_url = ?4
                        WHERE job_id = ?5 AND status_id NOT IN (?6, ?7)
                        "#,
                        params![
                            status.code(),
                            COMPLETED_PROGRESS,
                            now,
                            download_url_for(&id),
                            id,
                            JobStatus::Completed.code(),
                            JobStatus::Failed.code(),
                        ],
                    )?,
                    _ => conn.execute(
                        r#"
                        UPDATE jobs
                        SET status_id = ?1, progress = ?2, failed_message = ?3
                        WHERE job_id = ?4 AND status_id NOT IN (?5, ?6)
                        "#,
                        params![
                            status.code(),
                            FAILED_PROGRESS,
                            failure_message.unwrap_or_default(),
                            id,
                            JobStatus::Completed.code(),
                            JobStatus::Failed.code(),
                        ],
                    )?,
                };
                Ok(changed > 0)
            })
            .await?;

        if changed {
            debug!("Job {} marked {}", job_id, status);
        } else {
            warn!(
                "Ignoring {} write for job {}: missing or already terminal",
                status, job_id
            );
        }

        Ok(changed)
    }
}

/// Parse a joined jobs/subtitle_options row
fn parse_job_row(row: &rusqlite::Row) -> rusqlite::Result<JobRecord> {
    let status_code: i64 = row.get(1)?;
    let status = JobStatus::from_code(status_code).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Integer, e.into())
    })?;

    let position_code: i64 = row.get(15)?;
    let position = Position::from_code(position_code).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(15, rusqlite::types::Type::Integer, e.into())
    })?;

    let max_chars: i64 = row.get(17)?;

    Ok(JobRecord {
        id: row.get(0)?,
        status,
        progress: row.get(2)?,
        input_path: row.get(3)?,
        output_path: row.get(4)?,
        original_filename: row.get(5)?,
        created_at: row.get(6)?,
        completed_at: row.get(7)?,
        download_url: row.get(8)?,
        failure_message: row.get(9)?,
        style: StyleOptions {
            font: row.get(10)?,
            font_size: row.get(11)?,
            font_color: row.get(12)?,
            stroke_color: row.get(13)?,
            stroke_width: row.get(14)?,
            position,
            shadow: row.get(16)?,
            max_chars: max_chars.max(0) as usize,
            max_duration: row.get(18)?,
            max_gap: row.get(19)?,
        },
    })
}

#[async_trait]
impl JobStore for Repository {
    async fn create(&self, job: &JobRecord) -> Result<(), StoreError> {
        let job = job.clone();

        self.db
            .transaction_async(move |tx| {
                tx.execute(
                    r#"
                    INSERT INTO jobs (
                        job_id, progress, input_path, output_path, original_filename,
                        created_at, completed_at, status_id, download_url, failed_message
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    "#,
                    params![
                        job.id,
                        job.progress,
                        job.input_path,
                        job.output_path,
                        job.original_filename,
                        job.created_at,
                        job.completed_at,
                        job.status.code(),
                        job.download_url,
                        job.failure_message,
                    ],
                )?;

                let style = &job.style;
                tx.execute(
                    r#"
                    INSERT INTO subtitle_options (
                        job_id, font, font_size, font_color, stroke_color, stroke_width,
                        position_id, shadow_enabled, max_chars, max_duration, max_gap
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    "#,
                    params![
                        job.id,
                        style.font,
                        style.font_size,
                        style.font_color,
                        style.stroke_color,
                        style.stroke_width,
                        style.position.code(),
                        style.shadow,
                        style.max_chars as i64,
                        style.max_duration,
                        style.max_gap,
                    ],
                )?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    async fn read(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError> {
        let job_id = job_id.to_string();

        let record = self
            .db
            .execute_async(move |conn| Self::get_job_sync(conn, &job_id))
            .await?;

        Ok(record)
    }

    async fn update_progress(
        &self,
        job_id: &str,
        status: JobStatus,
        progress: u8,
    ) -> Result<bool, StoreError> {
        if status.is_terminal() {
            return Err(StoreError::Database(format!(
                "{} must be written through its terminal operation",
                status
            )));
        }

        let id = job_id.to_string();
        let progress = progress.min(COMPLETED_PROGRESS);

        let changed = self
            .db
            .transaction_async(move |tx| {
                let Some((current, current_progress)) = Self::get_state_sync(tx, &id)? else {
                    return Ok(false);
                };

                // Re-entering NotStarted is the start checkpoint and may reset progress
                let regresses = status == JobStatus::Processing && progress < current_progress;
                if !current.can_transition_to(status) || regresses {
                    return Ok(false);
                }

                tx.execute(
                    "UPDATE jobs SET status_id = ?1, progress = ?2 WHERE job_id = ?3",
                    params![status.code(), progress, id],
                )?;
                Ok(true)
            })
            .await?;

        if changed {
            debug!("Job {} checkpoint: {} {}%", job_id, status, progress);
        } else {
            warn!(
                "Ignoring checkpoint {} {}% for job {}: missing, terminal or regressing",
                status, progress, job_id
            );
        }

        Ok(changed)
    }

    async fn mark_completed(&self, job_id: &str) -> Result<bool, StoreError> {
        self.finish_job(job_id, JobStatus::Completed, None).await
    }

    async fn mark_failed(&self, job_id: &str, message: &str) -> Result<bool, StoreError> {
        self.finish_job(job_id, JobStatus::Failed, Some(message.to_string()))
            .await
    }
}
