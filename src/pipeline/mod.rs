/*!
 * Job pipeline: stage sequencing, checkpoints and terminal outcome.
 */

pub mod checkpoint;
pub mod orchestrator;

pub use checkpoint::Checkpoint;
pub use orchestrator::CaptionPipeline;
