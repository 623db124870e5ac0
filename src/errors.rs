/*!
 * Error types for the vidcaption application.
 *
 * This module contains custom error types for the pipeline stages, the job store
 * and the orchestrator, using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a pipeline stage adapter
#[derive(Error, Debug)]
pub enum StageError {
    /// Audio could not be extracted from the source video
    #[error("Failed to convert video to audio: {0}")]
    Extraction(String),

    /// The transcription model failed or produced unusable output
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// Word-to-line segmentation could not complete
    #[error("Segmentation failed: {0}")]
    Segmentation(String),

    /// Compositing the caption layers onto the video failed
    #[error("Rendering failed: {0}")]
    Rendering(String),

    /// Video metadata could not be read
    #[error("Failed to probe video: {0}")]
    Probe(String),

    /// An external tool exited unsuccessfully
    #[error("{program} exited with status {status}: {stderr}")]
    Process {
        /// Program that was executed
        program: String,
        /// Exit status reported by the OS
        status: String,
        /// Filtered stderr output
        stderr: String,
    },
}

/// Errors raised by a job store implementation
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying database call failed
    #[error("Database error: {0}")]
    Database(String),

    /// A stored value could not be decoded
    #[error("Corrupt job record: {0}")]
    Serialization(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast_ref::<rusqlite::Error>() {
            Some(inner) if is_decode_error(inner) => Self::Serialization(format!("{:#}", error)),
            _ => Self::Database(format!("{:#}", error)),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        if is_decode_error(&error) {
            Self::Serialization(error.to_string())
        } else {
            Self::Database(error.to_string())
        }
    }
}

/// Row values that exist but cannot be turned into a job record
fn is_decode_error(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..)
    )
}

/// Errors surfaced by the pipeline orchestrator for a single job
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage reported failure
    #[error(transparent)]
    Stage(#[from] StageError),

    /// The job store could not be reached
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The input artifact is missing
    #[error("Input video not found: {0:?}")]
    MissingInput(PathBuf),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a pipeline stage
    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    /// Error from the job store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from the orchestrator
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// A job was requested that does not exist
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// A job exists but its output cannot be downloaded yet
    #[error("Video processing not completed. Current status: {0}")]
    NotDownloadable(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
