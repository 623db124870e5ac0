/*!
 * Caption styling options.
 *
 * Styling is supplied once when a job is created and never changes afterwards.
 * Positions are persisted as small integer codes; the code table lives here and
 * nowhere else.
 */

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vertical placement of the caption block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Bottom,
    Center,
    Top,
}

impl Position {
    /// Persisted integer code
    pub fn code(self) -> i64 {
        match self {
            Position::Bottom => 1,
            Position::Center => 2,
            Position::Top => 3,
        }
    }

    /// Resolve a persisted integer code
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Position::Bottom),
            2 => Ok(Position::Center),
            3 => Ok(Position::Top),
            _ => Err(anyhow!("Invalid position code: {}", code)),
        }
    }

    /// Human-readable name, as stored in the positions lookup table
    pub fn display_name(self) -> &'static str {
        match self {
            Position::Bottom => "Bottom",
            Position::Center => "Center",
            Position::Top => "Top",
        }
    }

    /// Fraction of the video height where the caption is anchored
    pub fn vertical_fraction(self) -> f64 {
        match self {
            Position::Bottom => 0.75,
            Position::Center => 0.5,
            Position::Top => 0.1,
        }
    }

    pub fn all() -> [Position; 3] {
        [Position::Bottom, Position::Center, Position::Top]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Position {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bottom" | "1" => Ok(Position::Bottom),
            "center" | "2" => Ok(Position::Center),
            "top" | "3" => Ok(Position::Top),
            _ => Err(anyhow!("Invalid position: {}", s)),
        }
    }
}

/// Styling and segmentation settings for one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleOptions {
    /// Font family
    #[serde(default = "default_font")]
    pub font: String,

    /// Font size in points
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Text fill color
    #[serde(default = "default_font_color")]
    pub font_color: String,

    /// Outline color
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,

    /// Outline thickness in pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,

    /// Vertical placement
    #[serde(default)]
    pub position: Position,

    /// Draw a blurred drop shadow under each caption
    #[serde(default)]
    pub shadow: bool,

    /// Character count at which a line is closed
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Spoken seconds after which a line is closed
    #[serde(default = "default_max_duration")]
    pub max_duration: f64,

    /// Silence in seconds that forces a new line
    #[serde(default = "default_max_gap")]
    pub max_gap: f64,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            font: default_font(),
            font_size: default_font_size(),
            font_color: default_font_color(),
            stroke_color: default_stroke_color(),
            stroke_width: default_stroke_width(),
            position: Position::default(),
            shadow: false,
            max_chars: default_max_chars(),
            max_duration: default_max_duration(),
            max_gap: default_max_gap(),
        }
    }
}

impl StyleOptions {
    /// Check the options for values the segmenter and renderer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.font.trim().is_empty() {
            return Err(anyhow!("Font family must not be empty"));
        }
        if self.font_size == 0 {
            return Err(anyhow!("Font size must be positive"));
        }
        if self.max_chars == 0 {
            return Err(anyhow!("max_chars must be at least 1"));
        }
        if !(self.max_duration.is_finite() && self.max_duration > 0.0) {
            return Err(anyhow!("max_duration must be a positive number of seconds"));
        }
        if !(self.max_gap.is_finite() && self.max_gap >= 0.0) {
            return Err(anyhow!("max_gap must be zero or more seconds"));
        }
        Ok(())
    }
}

fn default_font() -> String {
    "Arial".to_string()
}

fn default_font_size() -> u32 {
    24
}

fn default_font_color() -> String {
    "white".to_string()
}

fn default_stroke_color() -> String {
    "black".to_string()
}

fn default_stroke_width() -> u32 {
    2
}

fn default_max_chars() -> usize {
    30
}

fn default_max_duration() -> f64 {
    2.5
}

fn default_max_gap() -> f64 {
    1.5
}
