/*!
 * Pipeline stage adapters.
 *
 * Each heavy stage sits behind a narrow async trait so the orchestrator can be
 * driven by real tools or by deterministic fakes:
 * - `AudioExtractor`: video to audio track (ffmpeg)
 * - `Transcriber`: audio to timed words (whisper CLI)
 * - `Renderer`: caption layers composited over the video (ffprobe + ffmpeg)
 */

use async_trait::async_trait;
use log::debug;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::captions::{CaptionLayer, VideoSize, WordSpan};
use crate::errors::StageError;

pub mod ffmpeg;
pub mod mock;
pub mod whisper;

pub use ffmpeg::{FfmpegAudioExtractor, FfmpegRenderer};
pub use whisper::WhisperTranscriber;

/// Extracts the audio track of a video into a standalone file
#[async_trait]
pub trait AudioExtractor: Send + Sync + Debug {
    /// Extract audio from `video`, returning the path of the produced file
    async fn extract(&self, video: &Path) -> Result<PathBuf, StageError>;
}

/// Speech-to-text with word-level timestamps
#[async_trait]
pub trait Transcriber: Send + Sync + Debug {
    /// Transcribe `audio` into words ordered by start time
    async fn transcribe(&self, audio: &Path) -> Result<Vec<WordSpan>, StageError>;
}

/// Video compositing engine
#[async_trait]
pub trait Renderer: Send + Sync + Debug {
    /// Frame dimensions of `video`
    async fn video_size(&self, video: &Path) -> Result<VideoSize, StageError>;

    /// Composite `layers` over `video` into `output`, in the given order
    async fn render(
        &self,
        video: &Path,
        layers: &[CaptionLayer],
        output: &Path,
    ) -> Result<(), StageError>;
}

/// Run an external tool to completion, returning its stdout
///
/// A non-zero exit becomes `StageError::Process` carrying the filtered stderr.
pub(crate) async fn run_tool(program: &str, args: &[String]) -> Result<Vec<u8>, StageError> {
    debug!("Running {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| StageError::Process {
            program: program.to_string(),
            status: "not started".to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(StageError::Process {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: filter_tool_stderr(&stderr),
        });
    }

    Ok(output.stdout)
}

/// Filter tool stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
pub(crate) fn filter_tool_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "ffprobe version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "title",
        "encoder",
        "Output #",
        "Stream mapping:",
        "Press [q]",
        "size=",
        "video:",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return false;
            }
            !noise_prefixes.iter().any(|p| trimmed.starts_with(p))
        })
        .collect();

    if meaningful.is_empty() {
        "unknown error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}

/// Lossy string form of a path for use as a command argument
pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
