/*!
 * Job views returned to callers.
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::database::models::JobRecord;
use crate::errors::AppError;
use crate::jobs::state::{JobStatus, COMPLETED_PROGRESS};

/// Result of creating a job: where the caller must place the upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedJob {
    pub job_id: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

/// Status query response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub job_id: String,
    pub status_name: String,
    pub status_id: i64,
    pub progress: u8,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub download_url: String,
    /// Failure message, omitted unless the job failed
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub failure_message: String,
}

impl JobStatusView {
    pub fn from_record(record: &JobRecord) -> Self {
        Self {
            job_id: record.id.clone(),
            status_name: record.status.display_name().to_string(),
            status_id: record.status.code(),
            progress: record.progress,
            created_at: record.created_at.clone(),
            completed_at: record.completed_at.clone(),
            download_url: record.download_url.clone(),
            failure_message: record.failure_message.clone(),
        }
    }

    /// Whether the job has reached a terminal state
    pub fn is_finished(&self) -> bool {
        JobStatus::from_code(self.status_id)
            .map(JobStatus::is_terminal)
            .unwrap_or(false)
    }
}

/// Everything a caller needs to serve the captioned video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadInfo {
    pub job_id: String,
    pub status: JobStatus,
    pub status_name: String,
    pub progress: u8,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub download_url: String,
    pub original_filename: String,
}

impl DownloadInfo {
    pub fn from_record(record: &JobRecord) -> Self {
        Self {
            job_id: record.id.clone(),
            status: record.status,
            status_name: record.status.display_name().to_string(),
            progress: record.progress,
            created_at: record.created_at.clone(),
            completed_at: record.completed_at.clone(),
            input_path: PathBuf::from(&record.input_path),
            output_path: PathBuf::from(&record.output_path),
            download_url: record.download_url.clone(),
            original_filename: record.original_filename.clone(),
        }
    }

    /// Suggested filename for the captioned video
    pub fn download_filename(&self) -> String {
        let stem = Path::new(&self.original_filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.job_id.clone());
        format!("captioned_{}.mp4", stem)
    }

    /// Completed, at 100%, with the output file present
    pub fn ensure_downloadable(&self) -> Result<&Path, AppError> {
        if self.status != JobStatus::Completed || self.progress != COMPLETED_PROGRESS {
            return Err(AppError::NotDownloadable(self.status_name.clone()));
        }

        if !self.output_path.exists() {
            return Err(AppError::File(format!(
                "Output file not found: {}",
                self.output_path.display()
            )));
        }

        Ok(&self.output_path)
    }
}
