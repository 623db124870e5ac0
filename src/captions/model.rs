/*!
 * Word and line value types.
 *
 * A `WordSpan` is one transcribed word with its timing, as produced by the
 * transcription stage. A `SubtitleLine` is one renderable caption unit assembled
 * from a contiguous run of words by the segmenter.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::StageError;

/// One transcribed word with start/end time in seconds
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct WordSpan {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Word text, carrying its own leading whitespace from the transcriber
    #[serde(alias = "word")]
    pub text: String,
}

impl WordSpan {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Create a word, rejecting inverted or non-finite time ranges
    pub fn new_validated(start: f64, end: f64, text: impl Into<String>) -> Result<Self, StageError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(StageError::Transcription(format!(
                "non-finite word timing: {} -> {}",
                start, end
            )));
        }

        if end < start {
            return Err(StageError::Transcription(format!(
                "word ends before it starts: {} -> {}",
                start, end
            )));
        }

        Ok(Self::new(start, end, text))
    }

    /// Spoken duration of the word
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One caption line spanning a contiguous time range
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SubtitleLine {
    /// Start of the first word
    pub start: f64,
    /// End of the last word
    pub end: f64,
    /// Sum of the constituent word durations; may be less than `end - start`
    pub duration: f64,
    /// Concatenated word text with surrounding whitespace trimmed
    pub text: String,
}

impl SubtitleLine {
    pub fn new(start: f64, end: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            duration,
            text: text.into(),
        }
    }

    /// Wall-clock span the line stays on screen
    pub fn display_duration(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for SubtitleLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2} -> {:.2}] {}", self.start, self.end, self.text)
    }
}
