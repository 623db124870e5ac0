/*!
 * Shared SQLite handle for the job store.
 *
 * One connection is opened per database and guarded by a mutex. Async callers
 * hop onto the blocking pool for every statement so the runtime never waits on
 * disk I/O; the schema is brought up to date before the handle is returned.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::schema;
use crate::jobs::JobStatus;

/// Path reported for databases that live only in memory
const IN_MEMORY_PATH: &str = ":memory:";

/// How long a statement waits on a locked database file before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Cloneable handle to the job database
#[derive(Clone)]
pub struct DatabaseConnection {
    // @field: Location on disk, or `:memory:`
    db_path: PathBuf,
    // @field: The single connection every clone shares
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseConnection {
    /// Open (or create) the job database at `db_path`
    ///
    /// Missing parent directories are created.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Could not create job database directory {}", parent.display())
            })?;
        }

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Could not open job database {}", db_path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Could not set database busy timeout")?;

        info!("Job database ready at {}", db_path.display());
        Self::from_connection(conn, db_path)
    }

    /// Private database that disappears with the handle
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Could not open in-memory job database")?;
        debug!("Opened in-memory job database");
        Self::from_connection(conn, PathBuf::from(IN_MEMORY_PATH))
    }

    fn from_connection(conn: Connection, db_path: PathBuf) -> Result<Self> {
        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == IN_MEMORY_PATH
    }

    /// Run `f` on the calling thread while holding the connection
    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connection.lock();
        f(&conn)
    }

    /// Run `f` on the blocking pool while holding the connection
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);

        tokio::task::spawn_blocking(move || {
            let conn = connection.lock();
            f(&conn)
        })
        .await
        .map_err(|e| anyhow!("Job database task did not finish: {}", e))?
    }

    /// Run `f` inside one transaction on the blocking pool
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back otherwise.
    pub async fn transaction_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);

        tokio::task::spawn_blocking(move || {
            let mut conn = connection.lock();
            let tx = conn.transaction().context("Could not begin transaction")?;
            let value = f(&tx)?;
            tx.commit().context("Could not commit transaction")?;
            Ok(value)
        })
        .await
        .map_err(|e| anyhow!("Job database transaction did not finish: {}", e))?
    }

    /// Job counts per status plus the size of the database file
    pub fn stats(&self) -> Result<DatabaseStats> {
        let file_size_bytes = if self.is_in_memory() {
            0
        } else {
            std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0)
        };

        self.execute(|conn| {
            let mut stmt = conn.prepare("SELECT status_id, COUNT(*) FROM jobs GROUP BY status_id")?;
            let counts = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let count_of = |status: JobStatus| {
                counts
                    .iter()
                    .find(|(code, _)| *code == status.code())
                    .map_or(0, |(_, n)| *n)
            };

            Ok(DatabaseStats {
                total_jobs: counts.iter().map(|(_, n)| n).sum(),
                processing_jobs: count_of(JobStatus::Processing),
                completed_jobs: count_of(JobStatus::Completed),
                failed_jobs: count_of(JobStatus::Failed),
                file_size_bytes,
            })
        })
    }
}

/// Snapshot of the job table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseStats {
    pub total_jobs: i64,
    pub processing_jobs: i64,
    pub completed_jobs: i64,
    pub failed_jobs: i64,
    pub file_size_bytes: u64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} jobs ({} processing, {} completed, {} failed), {} KB on disk",
            self.total_jobs,
            self.processing_jobs,
            self.completed_jobs,
            self.failed_jobs,
            self.file_size_bytes / 1024
        )
    }
}
