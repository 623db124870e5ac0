/*!
 * Caption domain types and algorithms.
 *
 * - `model`: timed words and assembled subtitle lines
 * - `style`: per-job styling and segmentation limits
 * - `segmenter`: words to lines under length, duration and gap limits
 * - `layers`: lines to positioned, timed overlay layers
 * - `srt`: SRT export of segmented lines
 */

pub mod layers;
pub mod model;
pub mod segmenter;
pub mod srt;
pub mod style;

pub use layers::{build_layers, CaptionLayer, LayerKind, VideoSize};
pub use model::{SubtitleLine, WordSpan};
pub use segmenter::{segment, segment_with, SegmentLimits};
pub use style::{Position, StyleOptions};
