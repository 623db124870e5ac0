use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::captions::StyleOptions;

/// Settings read from conf.json; every section may be omitted
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Working directories and database location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Default styling for new jobs
    #[serde(default)]
    pub style: StyleOptions,

    /// Audio extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Speech-to-text settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Compositing settings
    #[serde(default)]
    pub rendering: RenderingConfig,

    /// Upper bound on concurrently running jobs; unbounded when absent
    #[serde(default)]
    pub max_concurrent_jobs: Option<usize>,

    /// Uploads of this many MiB or more are rejected
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Directory and database locations
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StorageConfig {
    /// Uploads, extracted audio and rendered outputs
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Generated SRT files
    #[serde(default = "default_subtitle_dir")]
    pub subtitle_dir: PathBuf,

    /// SQLite job database
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            subtitle_dir: default_subtitle_dir(),
            database_path: default_database_path(),
        }
    }
}

/// Audio extraction configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffmpeg audio encoder (e.g., "libmp3lame", "pcm_s16le")
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            audio_codec: default_audio_codec(),
        }
    }
}

/// Transcription configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranscriptionConfig {
    /// whisper executable
    #[serde(default = "default_whisper_command")]
    pub command: String,

    /// Model name (e.g., "tiny", "base", "medium", "large")
    #[serde(default = "default_whisper_model")]
    pub model: String,

    /// Inference device (e.g., "cpu", "cuda")
    #[serde(default = "default_whisper_device")]
    pub device: String,

    /// Spoken language; detected by the model when absent
    #[serde(default)]
    pub language: Option<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            command: default_whisper_command(),
            model: default_whisper_model(),
            device: default_whisper_device(),
            language: None,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RenderingConfig {
    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe executable
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// ffmpeg video encoder for the captioned output
    #[serde(default = "default_video_codec")]
    pub video_codec: String,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            video_codec: default_video_codec(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vidcaption")
}

fn default_temp_dir() -> PathBuf {
    data_dir().join("temp")
}

fn default_subtitle_dir() -> PathBuf {
    data_dir().join("subtitles")
}

fn default_database_path() -> PathBuf {
    data_dir().join("jobs.db")
}

fn default_max_upload_mb() -> u64 {
    250
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_audio_codec() -> String {
    "libmp3lame".to_string()
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_whisper_command() -> String {
    "whisper".to_string()
}

fn default_whisper_model() -> String {
    "medium".to_string()
}

fn default_whisper_device() -> String {
    "cpu".to_string()
}

impl Config {
    /// Load the configuration at `path`, writing a default one there if it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;

            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            return Ok(config);
        }

        warn!("No config at '{}', writing defaults there", path.display());

        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).context("Could not serialize default config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Could not write default config: {}", path.display()))?;

        Ok(config)
    }

    /// Reject settings that would only fail later, mid-job
    pub fn validate(&self) -> Result<()> {
        self.style
            .validate()
            .context("Invalid default style options")?;

        let tools = [
            ("extraction.ffmpeg_path", &self.extraction.ffmpeg_path),
            ("extraction.audio_codec", &self.extraction.audio_codec),
            ("transcription.command", &self.transcription.command),
            ("transcription.model", &self.transcription.model),
            ("transcription.device", &self.transcription.device),
            ("rendering.ffmpeg_path", &self.rendering.ffmpeg_path),
            ("rendering.ffprobe_path", &self.rendering.ffprobe_path),
            ("rendering.video_codec", &self.rendering.video_codec),
        ];
        if let Some((name, _)) = tools.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(anyhow!("Configuration value {} must not be empty", name));
        }

        if self.max_concurrent_jobs == Some(0) {
            return Err(anyhow!("max_concurrent_jobs must be at least 1 when set"));
        }

        if self.max_upload_mb == 0 {
            return Err(anyhow!("max_upload_mb must be at least 1"));
        }

        if self.storage.temp_dir.as_os_str().is_empty() {
            return Err(anyhow!("storage.temp_dir must not be empty"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig::default(),
            style: StyleOptions::default(),
            extraction: ExtractionConfig::default(),
            transcription: TranscriptionConfig::default(),
            rendering: RenderingConfig::default(),
            max_concurrent_jobs: None,
            max_upload_mb: default_max_upload_mb(),
            log_level: LogLevel::default(),
        }
    }
}
