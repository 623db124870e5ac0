/*!
 * Job database schema.
 *
 * The schema is an ordered list of migrations; a database records the last one
 * it applied in `schema_version` and every newer step runs in its own
 * transaction on open. The `status` and `positions` lookup tables are filled
 * from `JobStatus` and `Position`, which own the codes.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};

use crate::captions::Position;
use crate::jobs::state::JobStatus;

/// One forward-only schema step
struct Migration {
    version: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "jobs with per-job subtitle options",
    sql: r#"
        CREATE TABLE status (
            status_id INTEGER PRIMARY KEY,
            status_name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE positions (
            position_id INTEGER PRIMARY KEY,
            position_name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE jobs (
            job_id TEXT PRIMARY KEY,
            progress INTEGER NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
            input_path TEXT NOT NULL,
            output_path TEXT NOT NULL,
            original_filename TEXT NOT NULL,
            created_at TEXT NOT NULL,
            completed_at TEXT,
            status_id INTEGER NOT NULL REFERENCES status(status_id),
            download_url TEXT NOT NULL DEFAULT '',
            failed_message TEXT NOT NULL DEFAULT ''
        );
        CREATE INDEX idx_jobs_status ON jobs(status_id);
        CREATE INDEX idx_jobs_created ON jobs(created_at);

        CREATE TABLE subtitle_options (
            job_id TEXT PRIMARY KEY REFERENCES jobs(job_id) ON DELETE CASCADE,
            font TEXT NOT NULL,
            font_size INTEGER NOT NULL,
            font_color TEXT NOT NULL,
            stroke_color TEXT NOT NULL,
            stroke_width INTEGER NOT NULL,
            position_id INTEGER NOT NULL REFERENCES positions(position_id),
            shadow_enabled INTEGER NOT NULL DEFAULT 0,
            max_chars INTEGER NOT NULL,
            max_duration REAL NOT NULL,
            max_gap REAL NOT NULL
        );
    "#,
}];

/// Version a fully migrated database reports
pub const SCHEMA_VERSION: i32 = MIGRATIONS.len() as i32;

/// Bring `conn` up to `SCHEMA_VERSION` and seed the lookup tables
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // Per connection; SQLite does not persist it in the file
    conn.pragma_update(None, "foreign_keys", true)
        .context("Could not enable foreign keys")?;

    // Lets status reads run while a pipeline writes a checkpoint
    let journal: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    debug!("Journal mode: {}", journal);

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(anyhow!(
            "Job database is at schema v{}, newer than the supported v{}",
            current,
            SCHEMA_VERSION
        ));
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(conn, migration)?;
    }
    if current == SCHEMA_VERSION {
        debug!("Job database schema is current (v{})", current);
    }

    seed_lookup_tables(conn)
}

/// Last applied migration, 0 for a fresh database
fn schema_version(conn: &Connection) -> Result<i32> {
    let version = conn
        .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| row.get(0))
        .optional()
        .context("Could not read schema version")?;

    Ok(version.unwrap_or(0))
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    info!(
        "Applying job database migration v{}: {}",
        migration.version, migration.description
    );

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)
        .with_context(|| format!("Migration v{} failed", migration.version))?;
    tx.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [migration.version],
    )?;
    tx.commit()?;

    Ok(())
}

fn seed_lookup_tables(conn: &Connection) -> Result<()> {
    let mut insert_status =
        conn.prepare("INSERT OR IGNORE INTO status (status_id, status_name) VALUES (?1, ?2)")?;
    for status in JobStatus::all() {
        insert_status.execute(params![status.code(), status.display_name()])?;
    }

    let mut insert_position =
        conn.prepare("INSERT OR IGNORE INTO positions (position_id, position_name) VALUES (?1, ?2)")?;
    for position in Position::all() {
        insert_position.execute(params![position.code(), position.display_name()])?;
    }

    Ok(())
}
