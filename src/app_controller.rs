use anyhow::{Context, Result};
use futures::future::join_all;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::app_config::Config;
use crate::captions::StyleOptions;
use crate::database::{DatabaseConnection, Repository};
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::jobs::{CreatedJob, JobManager, JobStatus, JobStatusView, JobStore};
use crate::pipeline::CaptionPipeline;
use crate::stages::{
    AudioExtractor, FfmpegAudioExtractor, FfmpegRenderer, Renderer, Transcriber,
    WhisperTranscriber,
};

// @module: Application controller for captioning jobs

/// How often a running job's status is polled for the progress bar
const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(250);

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Outcome of one video handed to `process_videos`
#[derive(Debug, Clone)]
pub struct ProcessedVideo {
    pub source: PathBuf,
    pub status: JobStatusView,
    /// Where the captioned copy was written, on success
    pub output: Option<PathBuf>,
}

/// Main application controller for video captioning
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Job creation and queries
    manager: JobManager,
    // @field: Stage wiring
    pipeline: CaptionPipeline,
}

impl Controller {
    // @method: Create a controller backed by SQLite, ffmpeg and whisper
    pub fn with_config(config: Config) -> Result<Self> {
        let db = DatabaseConnection::new(&config.storage.database_path)?;
        let repo = Repository::new(db);
        debug!("Job database: {}", repo.stats()?);

        let extractor = Arc::new(FfmpegAudioExtractor::new(
            config.extraction.ffmpeg_path.clone(),
            config.extraction.audio_codec.clone(),
        ));
        let transcriber = Arc::new(WhisperTranscriber::new(
            config.transcription.command.clone(),
            config.transcription.model.clone(),
            config.transcription.device.clone(),
            config.transcription.language.clone(),
        ));
        let renderer = Arc::new(FfmpegRenderer::new(
            config.rendering.ffmpeg_path.clone(),
            config.rendering.ffprobe_path.clone(),
            config.rendering.video_codec.clone(),
        ));

        Ok(Self::with_components(config, Arc::new(repo), extractor, transcriber, renderer))
    }

    // @method: Create a controller over explicit store and stages
    pub fn with_components(
        config: Config,
        store: Arc<dyn JobStore>,
        extractor: Arc<dyn AudioExtractor>,
        transcriber: Arc<dyn Transcriber>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let manager = JobManager::new(Arc::clone(&store), config.storage.temp_dir.clone());
        let pipeline = CaptionPipeline::new(store, extractor, transcriber, renderer)
            .with_subtitle_dir(config.storage.subtitle_dir.clone())
            .with_max_concurrent_jobs(config.max_concurrent_jobs);

        Self {
            config,
            manager,
            pipeline,
        }
    }

    /// Create the working directories and clear stale files from the temp directory
    ///
    /// Returns the number of stale files removed.
    pub fn prepare_workspace(config: &Config) -> Result<usize> {
        FileManager::ensure_dir(&config.storage.temp_dir)?;
        FileManager::ensure_dir(&config.storage.subtitle_dir)?;
        if let Some(parent) = config.storage.database_path.parent() {
            FileManager::ensure_dir(parent)?;
        }

        let removed = FileManager::cleanup_dir(&config.storage.temp_dir)
            .context("Failed to clean temp directory")?;
        if removed > 0 {
            info!("Removed {} stale files from {}", removed, config.storage.temp_dir.display());
        }

        Ok(removed)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manager(&self) -> &JobManager {
        &self.manager
    }

    pub fn pipeline(&self) -> &CaptionPipeline {
        &self.pipeline
    }

    /// Create a job for `video`, stage the upload and start the pipeline
    pub async fn submit(
        &self,
        video: &Path,
        style: StyleOptions,
    ) -> Result<(CreatedJob, JoinHandle<JobStatus>), AppError> {
        if !FileManager::file_exists(video) {
            return Err(AppError::File(format!("Input file does not exist: {}", video.display())));
        }
        if !FileManager::is_video_file(video) {
            return Err(AppError::File(format!(
                "Invalid file type. Please upload a video file: {}",
                video.display()
            )));
        }

        let limit_mb = self.config.max_upload_mb;
        let size = FileManager::file_size(video)?;
        if size >= limit_mb.saturating_mul(BYTES_PER_MB) {
            return Err(AppError::File(format!("File must be {} MB or less", limit_mb)));
        }

        let original_filename = video
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let job = self.manager.create_job(&original_filename, style.clone()).await?;
        FileManager::copy_file(video, &job.input_path)?;

        let handle = self.pipeline.spawn_pipeline(
            job.job_id.clone(),
            job.input_path.clone(),
            job.output_path.clone(),
            style,
        );

        Ok((job, handle))
    }

    /// Current status of a job
    pub async fn status(&self, job_id: &str) -> Result<JobStatusView, AppError> {
        self.manager
            .get_status(job_id)
            .await?
            .ok_or_else(|| AppError::JobNotFound(job_id.to_string()))
    }

    /// Copy a completed job's video into `output_dir` as `captioned_{stem}.mp4`
    pub async fn download(&self, job_id: &str, output_dir: &Path) -> Result<PathBuf, AppError> {
        let info = self
            .manager
            .get_download_info(job_id)
            .await?
            .ok_or_else(|| AppError::JobNotFound(job_id.to_string()))?;

        let source = info.ensure_downloadable()?;
        let target = output_dir.join(info.download_filename());
        FileManager::copy_file(source, &target)?;

        info!("Success: {}", target.display());
        Ok(target)
    }

    /// Remove every file in the temp directory
    pub fn cleanup(&self) -> Result<usize> {
        FileManager::cleanup_dir(&self.config.storage.temp_dir)
    }

    /// Caption every video concurrently, showing one progress bar per job
    ///
    /// Failures are reported per video; one failing job does not stop the others.
    pub async fn process_videos(
        &self,
        videos: Vec<PathBuf>,
        output_dir: Option<PathBuf>,
        style: StyleOptions,
    ) -> Vec<Result<ProcessedVideo, AppError>> {
        let start_time = std::time::Instant::now();
        let multi_progress = MultiProgress::new();

        let jobs = videos.into_iter().map(|video| {
            let style = style.clone();
            let output_dir = output_dir.clone();
            let multi_progress = &multi_progress;
            async move {
                let output_dir = output_dir
                    .or_else(|| video.parent().map(Path::to_path_buf))
                    .unwrap_or_else(|| PathBuf::from("."));
                self.process_one(video, output_dir, style, multi_progress).await
            }
        });

        let results = join_all(jobs).await;

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        info!(
            "Finished {} of {} videos in {}",
            succeeded,
            results.len(),
            Self::format_duration(start_time.elapsed())
        );

        results
    }

    async fn process_one(
        &self,
        video: PathBuf,
        output_dir: PathBuf,
        style: StyleOptions,
        multi_progress: &MultiProgress,
    ) -> Result<ProcessedVideo, AppError> {
        let (job, handle) = self.submit(&video, style).await.inspect_err(|e| {
            error!("Error processing file {}: {}", video.display(), e);
        })?;

        let progress_bar = multi_progress.add(ProgressBar::new(100));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        let label = video
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| job.job_id.clone());

        while !handle.is_finished() {
            if let Ok(view) = self.status(&job.job_id).await {
                progress_bar.set_position(u64::from(view.progress));
                progress_bar.set_message(format!("{} ({})", label, view.status_name));
            }
            tokio::time::sleep(STATUS_POLL_INTERVAL).await;
        }

        let terminal = handle
            .await
            .map_err(|e| AppError::Unknown(format!("Job task panicked: {}", e)))?;
        let status = self.status(&job.job_id).await?;

        if terminal != JobStatus::Completed {
            progress_bar.abandon_with_message(format!("{} failed", label));
            warn!("{}: {}", label, status.failure_message);
            return Ok(ProcessedVideo {
                source: video,
                status,
                output: None,
            });
        }

        progress_bar.finish_with_message(format!("{} done", label));
        let output = self.download(&job.job_id, &output_dir).await?;

        Ok(ProcessedVideo {
            source: video,
            status,
            output: Some(output),
        })
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
