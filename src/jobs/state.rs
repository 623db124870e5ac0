/*!
 * Job lifecycle states.
 *
 * `NotStarted -> Processing -> {Completed, Failed}`. Processing may be written
 * repeatedly as progress climbs through the checkpoints; the two terminal states
 * are absorbing. Status codes are the persisted representation; the table below is
 * the only place they are spelled out.
 */

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress value written when a job fails
pub const FAILED_PROGRESS: u8 = 0;

/// Progress value written when a job completes
pub const COMPLETED_PROGRESS: u8 = 100;

/// Job status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, pipeline not yet running
    NotStarted,
    /// A stage is running
    Processing,
    /// Captioned video is ready for download
    Completed,
    /// A stage failed; see the failure message
    Failed,
}

impl JobStatus {
    /// Persisted integer code
    pub fn code(self) -> i64 {
        match self {
            JobStatus::NotStarted => 1,
            JobStatus::Processing => 2,
            JobStatus::Completed => 3,
            JobStatus::Failed => 4,
        }
    }

    /// Resolve a persisted integer code
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(JobStatus::NotStarted),
            2 => Ok(JobStatus::Processing),
            3 => Ok(JobStatus::Completed),
            4 => Ok(JobStatus::Failed),
            _ => Err(anyhow!("Invalid job status code: {}", code)),
        }
    }

    /// Human-readable name, as stored in the status lookup table
    pub fn display_name(self) -> &'static str {
        match self {
            JobStatus::NotStarted => "Not Started",
            JobStatus::Processing => "Processing",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether a job in this state may be moved to `next`
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (JobStatus::Processing, JobStatus::NotStarted) => false,
            _ => true,
        }
    }

    pub fn all() -> [JobStatus; 4] {
        [
            JobStatus::NotStarted,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ]
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
