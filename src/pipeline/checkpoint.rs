//! Progress checkpoints written between pipeline stages.

use crate::jobs::state::JobStatus;

/// A point in the pipeline at which progress is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Job picked up, nothing run yet
    Start,
    /// Audio extraction finished
    AudioExtracted,
    /// Transcription finished
    Transcribed,
    /// Lines segmented
    Segmented,
}

impl Checkpoint {
    pub fn status(self) -> JobStatus {
        match self {
            Checkpoint::Start => JobStatus::NotStarted,
            _ => JobStatus::Processing,
        }
    }

    pub fn progress(self) -> u8 {
        match self {
            Checkpoint::Start => 10,
            Checkpoint::AudioExtracted => 25,
            Checkpoint::Transcribed => 50,
            Checkpoint::Segmented => 65,
        }
    }
}
