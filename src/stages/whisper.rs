/*!
 * Transcription through the openai-whisper command line tool.
 *
 * Whisper is run with word timestamps enabled and JSON output into a scratch
 * directory; the words of every segment are flattened in order.
 */

use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use super::{path_arg, run_tool, Transcriber};
use crate::captions::WordSpan;
use crate::errors::StageError;

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    words: Vec<WhisperWord>,
}

#[derive(Debug, Deserialize)]
struct WhisperWord {
    start: f64,
    end: f64,
    word: String,
}

/// Flatten whisper JSON output into validated words
pub fn parse_whisper_json(json: &str) -> Result<Vec<WordSpan>, StageError> {
    let output: WhisperOutput = serde_json::from_str(json)
        .map_err(|e| StageError::Transcription(format!("Invalid whisper output: {}", e)))?;

    output
        .segments
        .into_iter()
        .flat_map(|segment| segment.words)
        .map(|w| WordSpan::new_validated(w.start, w.end, w.word))
        .collect()
}

/// Words from whisper JSON output or from a bare `[{start, end, text}]` list
///
/// Whisper output is recognised by its `segments` key; its errors are returned
/// as is rather than retried as a bare list.
pub fn parse_word_list(json: &str) -> Result<Vec<WordSpan>, StageError> {
    let invalid = |e: serde_json::Error| StageError::Transcription(format!("Invalid word list: {}", e));
    let value: Value = serde_json::from_str(json).map_err(invalid)?;

    if value.get("segments").is_some() {
        return parse_whisper_json(json);
    }

    let words: Vec<WordSpan> = serde_json::from_value(value).map_err(invalid)?;
    words
        .into_iter()
        .map(|w| WordSpan::new_validated(w.start, w.end, w.text))
        .collect()
}

/// Speech-to-text through the `whisper` CLI
#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    command: String,
    model: String,
    device: String,
    language: Option<String>,
}

impl WhisperTranscriber {
    pub fn new(
        command: impl Into<String>,
        model: impl Into<String>,
        device: impl Into<String>,
        language: Option<String>,
    ) -> Self {
        Self {
            command: command.into(),
            model: model.into(),
            device: device.into(),
            language,
        }
    }

    fn build_args(&self, audio: &Path, output_dir: &Path) -> Vec<String> {
        let mut args = vec![
            path_arg(audio),
            "--model".to_string(),
            self.model.clone(),
            "--device".to_string(),
            self.device.clone(),
            "--word_timestamps".to_string(),
            "True".to_string(),
            "--output_format".to_string(),
            "json".to_string(),
            "--output_dir".to_string(),
            path_arg(output_dir),
            "--verbose".to_string(),
            "False".to_string(),
        ];

        // Half precision is unsupported on CPU
        if self.device == "cpu" {
            args.push("--fp16".to_string());
            args.push("False".to_string());
        }

        if let Some(language) = &self.language {
            args.push("--language".to_string());
            args.push(language.clone());
        }

        args
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<Vec<WordSpan>, StageError> {
        if !audio.exists() {
            return Err(StageError::Transcription(format!(
                "Audio file not found: {}",
                audio.display()
            )));
        }

        let output_dir = tempfile::tempdir().map_err(|e| {
            StageError::Transcription(format!("Failed to create output directory: {}", e))
        })?;

        info!("Transcribing {} with whisper model {}", audio.display(), self.model);
        run_tool(&self.command, &self.build_args(audio, output_dir.path()))
            .await
            .map_err(|e| StageError::Transcription(e.to_string()))?;

        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let json_path = output_dir.path().join(format!("{}.json", stem));

        let json = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            StageError::Transcription(format!(
                "Failed to read whisper output {}: {}",
                json_path.display(),
                e
            ))
        })?;

        let words = parse_whisper_json(&json)?;
        debug!("Whisper produced {} words", words.len());
        Ok(words)
    }
}
