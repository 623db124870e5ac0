/*!
 * Common test utilities for the vidcaption test suite
 */

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use vidcaption::app_config::{Config, StorageConfig};
use vidcaption::app_controller::Controller;
use vidcaption::captions::WordSpan;
use vidcaption::database::{JobRecord, Repository};
use vidcaption::errors::StoreError;
use vidcaption::jobs::{JobStatus, JobStore};
use vidcaption::stages::mock::{MockExtractor, MockRenderer, MockTranscriber};

/// Route library logs through the test harness; set RUST_LOG to see them
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a placeholder video file
pub fn create_test_video(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, b"not really a video")
}

/// Build words from `(start, end, text)` triples
pub fn words(triples: &[(f64, f64, &str)]) -> Vec<WordSpan> {
    triples.iter()
        .map(|(start, end, text)| WordSpan::new(*start, *end, *text))
        .collect()
}

/// Configuration with every directory inside `root`
pub fn test_config(root: &Path) -> Config {
    Config {
        storage: StorageConfig {
            temp_dir: root.join("temp"),
            subtitle_dir: root.join("subtitles"),
            database_path: root.join("db").join("jobs.db"),
        },
        ..Default::default()
    }
}

/// One write observed by `RecordingStore`
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    Progress(JobStatus, u8),
    Completed,
    Failed(String),
}

/// Job store that records every write before delegating to an in-memory repository
#[derive(Debug)]
pub struct RecordingStore {
    inner: Repository,
    writes: Mutex<Vec<StoreWrite>>,
}

impl RecordingStore {
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: Repository::new_in_memory()?,
            writes: Mutex::new(Vec::new()),
        })
    }

    pub fn writes(&self) -> Vec<StoreWrite> {
        self.writes.lock().clone()
    }
}

#[async_trait]
impl JobStore for RecordingStore {
    async fn create(&self, job: &JobRecord) -> Result<(), StoreError> {
        self.inner.create(job).await
    }

    async fn read(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError> {
        self.inner.read(job_id).await
    }

    async fn update_progress(
        &self,
        job_id: &str,
        status: JobStatus,
        progress: u8,
    ) -> Result<bool, StoreError> {
        self.writes.lock().push(StoreWrite::Progress(status, progress));
        self.inner.update_progress(job_id, status, progress).await
    }

    async fn mark_completed(&self, job_id: &str) -> Result<bool, StoreError> {
        self.writes.lock().push(StoreWrite::Completed);
        self.inner.mark_completed(job_id).await
    }

    async fn mark_failed(&self, job_id: &str, message: &str) -> Result<bool, StoreError> {
        self.writes.lock().push(StoreWrite::Failed(message.to_string()));
        self.inner.mark_failed(job_id, message).await
    }
}

/// Controller wired to a recording store and the given fake stages
pub struct TestHarness {
    pub root: TempDir,
    pub store: Arc<RecordingStore>,
    pub extractor: Arc<MockExtractor>,
    pub transcriber: Arc<MockTranscriber>,
    pub renderer: Arc<MockRenderer>,
    pub controller: Controller,
}

impl TestHarness {
    pub fn new(transcriber: MockTranscriber, renderer: MockRenderer) -> Result<Self> {
        Self::with_config(transcriber, renderer, |_| {})
    }

    pub fn with_config(
        transcriber: MockTranscriber,
        renderer: MockRenderer,
        adjust: impl FnOnce(&mut Config),
    ) -> Result<Self> {
        init_test_logging();
        let root = create_temp_dir()?;
        let mut config = test_config(root.path());
        adjust(&mut config);
        Controller::prepare_workspace(&config)?;

        let store = Arc::new(RecordingStore::new()?);
        let extractor = Arc::new(MockExtractor::working());
        let transcriber = Arc::new(transcriber);
        let renderer = Arc::new(renderer);

        let controller = Controller::with_components(
            config,
            store.clone(),
            extractor.clone(),
            transcriber.clone(),
            renderer.clone(),
        );

        Ok(Self {
            root,
            store,
            extractor,
            transcriber,
            renderer,
            controller,
        })
    }

    /// Directory for source videos, outside the controller's temp dir
    pub fn uploads_dir(&self) -> Result<PathBuf> {
        let dir = self.root.path().join("uploads");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
