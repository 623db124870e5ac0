/*!
 * Job store contract.
 *
 * The orchestrator writes checkpoints through this trait and status queries read
 * through it. Each call is atomic. Writes against a job that is already terminal
 * are ignored and reported as `Ok(false)`.
 */

use async_trait::async_trait;

use crate::database::models::JobRecord;
use crate::errors::StoreError;
use crate::jobs::state::JobStatus;

/// Persistent job storage
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug {
    /// Insert a new job together with its style options
    async fn create(&self, job: &JobRecord) -> Result<(), StoreError>;

    /// Read a job, `None` if it does not exist
    async fn read(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError>;

    /// Record a checkpoint. Returns whether the record changed.
    async fn update_progress(
        &self,
        job_id: &str,
        status: JobStatus,
        progress: u8,
    ) -> Result<bool, StoreError>;

    /// Move the job to `Completed` with progress 100, download URL and completion time
    async fn mark_completed(&self, job_id: &str) -> Result<bool, StoreError>;

    /// Move the job to `Failed` with progress 0 and the given message
    async fn mark_failed(&self, job_id: &str, message: &str) -> Result<bool, StoreError>;
}
