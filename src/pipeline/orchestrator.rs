/*!
 * Captioning pipeline orchestrator.
 *
 * Runs extract, transcribe, segment and render strictly in sequence for one job,
 * writing a checkpoint after each stage. The first failing stage ends the run.
 * `run_pipeline` maps the outcome onto the job's terminal state and always
 * removes the uploaded input; the extracted audio is removed by `run` itself.
 */

use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::checkpoint::Checkpoint;
use crate::captions::{build_layers, segment_with, srt, StyleOptions, SubtitleLine};
use crate::errors::{PipelineError, StageError};
use crate::jobs::state::JobStatus;
use crate::jobs::store::JobStore;
use crate::stages::{AudioExtractor, Renderer, Transcriber};

/// Failure message used when rendering left no output behind
pub const NO_OUTPUT_MESSAGE: &str = "Error: Unable to process video";

/// Pipeline wiring: the job store and the three stage adapters
#[derive(Debug, Clone)]
pub struct CaptionPipeline {
    store: Arc<dyn JobStore>,
    extractor: Arc<dyn AudioExtractor>,
    transcriber: Arc<dyn Transcriber>,
    renderer: Arc<dyn Renderer>,
    /// Where SRT sidecars are written, if anywhere
    subtitle_dir: Option<PathBuf>,
    /// Caps concurrently running jobs when set
    limiter: Option<Arc<Semaphore>>,
}

impl CaptionPipeline {
    pub fn new(
        store: Arc<dyn JobStore>,
        extractor: Arc<dyn AudioExtractor>,
        transcriber: Arc<dyn Transcriber>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            store,
            extractor,
            transcriber,
            renderer,
            subtitle_dir: None,
            limiter: None,
        }
    }

    /// Write an SRT sidecar per job into `dir`
    pub fn with_subtitle_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.subtitle_dir = Some(dir.into());
        self
    }

    /// Allow at most `max` jobs to run at once; `None` leaves jobs unbounded
    pub fn with_max_concurrent_jobs(mut self, max: Option<usize>) -> Self {
        self.limiter = max.map(|n| Arc::new(Semaphore::new(n)));
        self
    }

    /// Run every stage for one job
    ///
    /// Returns `Ok(true)` when the rendered video exists at `output`, `Ok(false)` when
    /// the renderer reported success without producing it.
    pub async fn run(
        &self,
        job_id: &str,
        input: &Path,
        output: &Path,
        style: &StyleOptions,
    ) -> Result<bool, PipelineError> {
        let mut audio = None;
        let result = self.run_stages(job_id, input, output, style, &mut audio).await;

        if let Some(audio) = audio {
            remove_quietly(&audio).await;
        }

        result
    }

    async fn run_stages(
        &self,
        job_id: &str,
        input: &Path,
        output: &Path,
        style: &StyleOptions,
        audio_artifact: &mut Option<PathBuf>,
    ) -> Result<bool, PipelineError> {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(PipelineError::MissingInput(input.to_path_buf()));
        }

        let audio = self.extractor.extract(input).await?;
        *audio_artifact = Some(audio.clone());
        self.checkpoint(job_id, Checkpoint::AudioExtracted).await;

        let words = self.transcriber.transcribe(&audio).await?;
        self.checkpoint(job_id, Checkpoint::Transcribed).await;

        let word_count = words.len();
        let segment_style = style.clone();
        let lines = tokio::task::spawn_blocking(move || segment_with(&words, &segment_style))
            .await
            .map_err(|e| StageError::Segmentation(e.to_string()))?;
        debug!("Job {}: {} words segmented into {} lines", job_id, word_count, lines.len());
        self.checkpoint(job_id, Checkpoint::Segmented).await;

        self.write_sidecar(job_id, &lines).await;

        let size = self.renderer.video_size(input).await?;
        let layers = build_layers(&lines, style, size);
        self.renderer.render(input, &layers, output).await?;

        Ok(tokio::fs::try_exists(output).await.unwrap_or(false))
    }

    /// Background job entry point
    ///
    /// Never returns an error: every failure ends up on the job record. Returns the
    /// terminal status this run attempted to write.
    pub async fn run_pipeline(
        &self,
        job_id: String,
        input: PathBuf,
        output: PathBuf,
        style: StyleOptions,
    ) -> JobStatus {
        let _permit = match &self.limiter {
            Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
            None => None,
        };

        info!("Starting pipeline for job {}", job_id);
        self.checkpoint(&job_id, Checkpoint::Start).await;

        let outcome = self.run(&job_id, &input, &output, &style).await;

        let status = match outcome {
            Ok(true) => {
                info!("Job {} completed: {}", job_id, output.display());
                if let Err(e) = self.store.mark_completed(&job_id).await {
                    error!("Failed to mark job {} completed: {}", job_id, e);
                }
                JobStatus::Completed
            }
            Ok(false) => {
                warn!("Job {} rendered no output at {}", job_id, output.display());
                self.fail(&job_id, NO_OUTPUT_MESSAGE).await;
                JobStatus::Failed
            }
            Err(e) => {
                warn!("Job {} failed: {}", job_id, e);
                self.fail(&job_id, &format!("Error: {}", e)).await;
                JobStatus::Failed
            }
        };

        remove_quietly(&input).await;
        status
    }

    /// Detach `run_pipeline` onto the runtime
    pub fn spawn_pipeline(
        &self,
        job_id: String,
        input: PathBuf,
        output: PathBuf,
        style: StyleOptions,
    ) -> JoinHandle<JobStatus> {
        let pipeline = self.clone();
        tokio::spawn(async move { pipeline.run_pipeline(job_id, input, output, style).await })
    }

    async fn checkpoint(&self, job_id: &str, checkpoint: Checkpoint) {
        match self
            .store
            .update_progress(job_id, checkpoint.status(), checkpoint.progress())
            .await
        {
            Ok(_) => info!("Job {}: {}%", job_id, checkpoint.progress()),
            Err(e) => error!("Failed to record checkpoint {:?} for job {}: {}", checkpoint, job_id, e),
        }
    }

    async fn fail(&self, job_id: &str, message: &str) {
        if let Err(e) = self.store.mark_failed(job_id, message).await {
            error!("Failed to mark job {} failed: {}", job_id, e);
        }
    }

    async fn write_sidecar(&self, job_id: &str, lines: &[SubtitleLine]) {
        let Some(dir) = &self.subtitle_dir else {
            return;
        };

        let path = dir.join(format!("{}.srt", job_id));
        let write = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, srt::to_srt(lines)).await
        };

        match write.await {
            Ok(()) => debug!("Wrote subtitles to {}", path.display()),
            Err(e) => warn!("Failed to write subtitles to {}: {}", path.display(), e),
        }
    }
}

/// Remove a file, ignoring any failure
async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        debug!("Could not remove {}: {}", path.display(), e);
    }
}
