/*!
 * # vidcaption - automatic burned-in captions for videos
 *
 * A Rust library that turns a raw video into a captioned one: the audio track is
 * extracted, transcribed to timed words, segmented into subtitle lines and
 * rendered back onto the video as timed text overlays.
 *
 * ## Features
 *
 * - Word-level transcription through the whisper CLI
 * - Line segmentation bounded by length, duration and pause limits
 * - Configurable caption styling with optional blurred drop shadow
 * - Persistent job tracking with progress checkpoints in SQLite
 * - SRT export of the generated lines
 *
 * ## Architecture
 *
 * A job flows from `app_controller` through `jobs` into `pipeline`, which
 * drives the `stages` and writes checkpoints back through the job store:
 * - `captions`: Word and line model, segmentation, layer building, SRT export
 * - `jobs`: Job state machine, store contract and job manager
 * - `pipeline`: Stage orchestration and checkpoints
 * - `stages`: ffmpeg and whisper adapters behind async traits, plus fakes
 * - `database`: SQLite job store
 * - `app_config`: conf.json loading, defaults and validation
 * - `app_controller`: Submit, status, download and cleanup entry points
 * - `file_utils`: Upload checks, copies and temp cleanup
 * - `errors`: Error enums for each layer
 */

// Crate-wide lint allowances
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod app_controller;
pub mod captions;
pub mod database;
pub mod errors;
pub mod file_utils;
pub mod jobs;
pub mod pipeline;
pub mod stages;

// Re-exports
pub use app_config::Config;
pub use app_controller::Controller;
pub use captions::{segment, StyleOptions, SubtitleLine, WordSpan};
pub use errors::{AppError, PipelineError, StageError, StoreError};
pub use jobs::{JobManager, JobStatus};
pub use pipeline::CaptionPipeline;
