/*!
 * Deterministic stage fakes for testing.
 *
 * These stand in for ffmpeg and whisper:
 * - `MockExtractor` writes a placeholder audio file next to the video
 * - `MockTranscriber` returns a fixed word list
 * - `MockRenderer` records the layers it was given and writes a placeholder output
 *
 * Each fake takes a `MockBehavior` and counts its calls.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{AudioExtractor, Renderer, Transcriber};
use crate::captions::{CaptionLayer, VideoSize, WordSpan};
use crate::errors::StageError;

/// Behavior mode for a mock stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always fails with a stage error
    Failing,
    /// Reports success without producing its artifact
    NoOutput,
    /// Succeeds after a delay
    Slow { delay_ms: u64 },
}

impl MockBehavior {
    async fn pause(self) {
        if let MockBehavior::Slow { delay_ms } = self {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        }
    }
}

/// Fake audio extractor
#[derive(Debug)]
pub struct MockExtractor {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
}

impl MockExtractor {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioExtractor for MockExtractor {
    async fn extract(&self, video: &Path) -> Result<PathBuf, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.behavior.pause().await;

        if self.behavior == MockBehavior::Failing {
            return Err(StageError::Extraction("mock extraction failure".to_string()));
        }
        if !video.exists() {
            return Err(StageError::Extraction(format!(
                "Input video not found: {}",
                video.display()
            )));
        }

        let audio = video.with_extension("mp3");
        if self.behavior != MockBehavior::NoOutput {
            tokio::fs::write(&audio, b"mock audio")
                .await
                .map_err(|e| StageError::Extraction(e.to_string()))?;
        }
        Ok(audio)
    }
}

/// Fake transcriber returning a fixed word list
#[derive(Debug)]
pub struct MockTranscriber {
    behavior: MockBehavior,
    words: Vec<WordSpan>,
    calls: Arc<AtomicUsize>,
}

impl MockTranscriber {
    pub fn new(behavior: MockBehavior, words: Vec<WordSpan>) -> Self {
        Self {
            behavior,
            words,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Succeeds with `Hello world ... today` split by a 2.1 s pause
    pub fn working() -> Self {
        Self::new(MockBehavior::Working, Self::sample_words())
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing, Vec::new())
    }

    pub fn with_words(words: Vec<WordSpan>) -> Self {
        Self::new(MockBehavior::Working, words)
    }

    pub fn sample_words() -> Vec<WordSpan> {
        vec![
            WordSpan::new(0.0, 0.4, "Hello "),
            WordSpan::new(0.5, 0.9, "world"),
            WordSpan::new(3.0, 3.4, " today"),
        ]
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Vec<WordSpan>, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.behavior.pause().await;

        if self.behavior == MockBehavior::Failing {
            return Err(StageError::Transcription("mock transcription failure".to_string()));
        }
        if !audio.exists() {
            return Err(StageError::Transcription(format!(
                "Audio file not found: {}",
                audio.display()
            )));
        }
        Ok(self.words.clone())
    }
}

/// Fake renderer that records what it was asked to composite
#[derive(Debug)]
pub struct MockRenderer {
    behavior: MockBehavior,
    size: VideoSize,
    rendered: Mutex<Vec<Vec<CaptionLayer>>>,
}

impl MockRenderer {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            size: VideoSize::new(1280, 720),
            rendered: Mutex::new(Vec::new()),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Succeeds but leaves no output file behind
    pub fn no_output() -> Self {
        Self::new(MockBehavior::NoOutput)
    }

    /// Layer lists passed to each `render` call
    pub fn rendered_layers(&self) -> Vec<Vec<CaptionLayer>> {
        self.rendered.lock().clone()
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn video_size(&self, _video: &Path) -> Result<VideoSize, StageError> {
        Ok(self.size)
    }

    async fn render(
        &self,
        _video: &Path,
        layers: &[CaptionLayer],
        output: &Path,
    ) -> Result<(), StageError> {
        self.behavior.pause().await;
        self.rendered.lock().push(layers.to_vec());

        match self.behavior {
            MockBehavior::Failing => Err(StageError::Rendering("mock render failure".to_string())),
            MockBehavior::NoOutput => Ok(()),
            _ => tokio::fs::write(output, b"mock video")
                .await
                .map_err(|e| StageError::Rendering(e.to_string())),
        }
    }
}
