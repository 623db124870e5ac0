/*!
 * Database entity models.
 *
 * `JobRecord` maps one row of `jobs` joined with its `subtitle_options` row.
 */

use serde::{Deserialize, Serialize};

use crate::captions::StyleOptions;
use crate::jobs::state::JobStatus;

/// Build the download URL published when a job completes
pub fn download_url_for(job_id: &str) -> String {
    format!("/jobs/{}/download", job_id)
}

/// Persisted job record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// UUID v4 job identifier
    pub id: String,
    /// Current lifecycle state
    pub status: JobStatus,
    /// Percentage, 0 to 100
    pub progress: u8,
    /// Path of the uploaded source video
    pub input_path: String,
    /// Path the captioned video is written to
    pub output_path: String,
    /// Filename the video was uploaded under
    pub original_filename: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    /// RFC 3339 completion timestamp, set on success only
    pub completed_at: Option<String>,
    /// Empty until the job completes
    pub download_url: String,
    /// Empty unless the job failed
    pub failure_message: String,
    /// Styling the job was created with
    pub style: StyleOptions,
}

impl JobRecord {
    /// Create a fresh record in the `NotStarted` state
    pub fn new(
        id: impl Into<String>,
        input_path: impl Into<String>,
        output_path: impl Into<String>,
        original_filename: impl Into<String>,
        style: StyleOptions,
    ) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::NotStarted,
            progress: 0,
            input_path: input_path.into(),
            output_path: output_path.into(),
            original_filename: original_filename.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
            completed_at: None,
            download_url: String::new(),
            failure_message: String::new(),
            style,
        }
    }
}
