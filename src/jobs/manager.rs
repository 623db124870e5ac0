/*!
 * Job manager for the captioning job lifecycle.
 *
 * This module handles:
 * - Creating job records and assigning their working paths
 * - Status queries
 * - Download lookups
 */

use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::captions::StyleOptions;
use crate::database::models::JobRecord;
use crate::errors::AppError;

use super::models::{CreatedJob, DownloadInfo, JobStatusView};
use super::store::JobStore;

/// Job manager for creating and querying captioning jobs
#[derive(Debug, Clone)]
pub struct JobManager {
    /// Backing job store
    store: Arc<dyn JobStore>,
    /// Directory that holds uploads and rendered outputs
    temp_dir: PathBuf,
}

impl JobManager {
    /// Create a new job manager over the given store
    pub fn new(store: Arc<dyn JobStore>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            temp_dir: temp_dir.into(),
        }
    }

    /// Get the underlying store
    pub fn store(&self) -> Arc<dyn JobStore> {
        Arc::clone(&self.store)
    }

    /// Input and output paths for a job
    pub fn job_paths(&self, job_id: &str, original_filename: &str) -> (PathBuf, PathBuf) {
        let ext = Path::new(original_filename)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        (
            self.temp_dir.join(format!("{}_input{}", job_id, ext)),
            self.temp_dir.join(format!("{}_output.mp4", job_id)),
        )
    }

    /// Create a new job in the `NotStarted` state
    ///
    /// The caller is responsible for placing the uploaded video at the returned
    /// input path before starting the pipeline.
    pub async fn create_job(
        &self,
        original_filename: &str,
        style: StyleOptions,
    ) -> Result<CreatedJob, AppError> {
        style.validate()?;

        let job_id = Uuid::new_v4().to_string();
        let (input_path, output_path) = self.job_paths(&job_id, original_filename);

        let record = JobRecord::new(
            job_id.clone(),
            input_path.to_string_lossy().to_string(),
            output_path.to_string_lossy().to_string(),
            original_filename,
            style,
        );
        self.store.create(&record).await?;

        info!("Created job {} for {}", &job_id[..8], original_filename);

        Ok(CreatedJob {
            job_id,
            input_path,
            output_path,
        })
    }

    /// Current status of a job, `None` if it does not exist
    pub async fn get_status(&self, job_id: &str) -> Result<Option<JobStatusView>, AppError> {
        let record = self.store.read(job_id).await?;
        debug!("Status query for job {}: found={}", job_id, record.is_some());
        Ok(record.as_ref().map(JobStatusView::from_record))
    }

    /// Download details of a job, `None` if it does not exist
    pub async fn get_download_info(&self, job_id: &str) -> Result<Option<DownloadInfo>, AppError> {
        let record = self.store.read(job_id).await?;
        Ok(record.as_ref().map(DownloadInfo::from_record))
    }
}
