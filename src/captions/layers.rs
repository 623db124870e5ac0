/*!
 * Caption layer construction.
 *
 * Each subtitle line becomes one caption layer, preceded by a blurred shadow layer
 * when the style asks for one. Layers for all lines are flattened into two ordered
 * groups, shadows first and captions second, so every shadow is composited
 * underneath every caption.
 */

use serde::{Deserialize, Serialize};

use super::model::SubtitleLine;
use super::style::StyleOptions;

/// Shadow fill color
pub const SHADOW_COLOR: &str = "black";

/// Gaussian blur strength applied to shadow layers
pub const SHADOW_BLUR_SIGMA: u32 = 5;

/// Pixel offset of the shadow relative to the caption
pub const SHADOW_OFFSET: (i64, i64) = (3, 3);

/// Frame dimensions of the source video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

impl VideoSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Role of a layer in the composite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Shadow,
    Caption,
}

/// One timed text overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionLayer {
    pub kind: LayerKind,
    pub text: String,
    pub font: String,
    pub font_size: u32,
    pub color: String,
    /// Outline color and width; shadows carry no outline
    pub stroke: Option<(String, u32)>,
    /// Blur sigma, shadows only
    pub blur_sigma: Option<u32>,
    /// Seconds from the start of the video
    pub start: f64,
    /// Seconds on screen
    pub duration: f64,
    /// Top edge of the text in pixels; the text is always horizontally centered
    pub y: f64,
}

impl CaptionLayer {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Pixel row where captions are anchored for the given style and frame
pub fn caption_y(style: &StyleOptions, size: VideoSize) -> f64 {
    f64::from(size.height) * style.position.vertical_fraction()
}

/// Build the layers for one line: optional shadow, then the caption itself
pub fn line_layers(line: &SubtitleLine, style: &StyleOptions, size: VideoSize) -> Vec<CaptionLayer> {
    let y = caption_y(style, size);
    let duration = line.display_duration();
    let mut layers = Vec::with_capacity(2);

    if style.shadow {
        layers.push(CaptionLayer {
            kind: LayerKind::Shadow,
            text: line.text.clone(),
            font: style.font.clone(),
            font_size: style.font_size,
            color: SHADOW_COLOR.to_string(),
            stroke: None,
            blur_sigma: Some(SHADOW_BLUR_SIGMA),
            start: line.start,
            duration,
            y: y + SHADOW_OFFSET.1 as f64,
        });
    }

    layers.push(CaptionLayer {
        kind: LayerKind::Caption,
        text: line.text.clone(),
        font: style.font.clone(),
        font_size: style.font_size,
        color: style.font_color.clone(),
        stroke: Some((style.stroke_color.clone(), style.stroke_width)),
        blur_sigma: None,
        start: line.start,
        duration,
        y,
    });

    layers
}

/// Build and flatten the layers for every line, shadow group first
pub fn build_layers(lines: &[SubtitleLine], style: &StyleOptions, size: VideoSize) -> Vec<CaptionLayer> {
    let (shadows, captions): (Vec<_>, Vec<_>) = lines
        .iter()
        .flat_map(|line| line_layers(line, style, size))
        .partition(|layer| layer.kind == LayerKind::Shadow);

    shadows.into_iter().chain(captions).collect()
}
