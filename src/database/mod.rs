/*!
 * Database module for persistent storage of captioning jobs.
 *
 * This module provides SQLite-based persistence for:
 * - Job records with status, progress and outcome fields
 * - Per-job subtitle styling options
 * - Status and position lookup tables
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::JobRecord;
pub use repository::Repository;
