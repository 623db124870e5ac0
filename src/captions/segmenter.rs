/*!
 * Word-to-line segmentation.
 *
 * Greedy single pass over the transcribed words. Each word is checked against the
 * line as it stands *before* the word is added; if the line is non-empty and the
 * word would hit the character, duration or gap limit, the line is closed and the
 * word starts a new one. Limits are therefore soft ceilings: one word can carry a
 * line past them. Line `duration` is the sum of spoken word durations, not the
 * wall-clock span.
 */

use super::model::{SubtitleLine, WordSpan};
use super::style::StyleOptions;

/// Limits that close a subtitle line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLimits {
    /// Character count at which the line is closed
    pub max_chars: usize,
    /// Summed spoken seconds after which the line is closed
    pub max_duration: f64,
    /// Silence in seconds between words that forces a break
    pub max_gap: f64,
}

impl SegmentLimits {
    pub fn new(max_chars: usize, max_duration: f64, max_gap: f64) -> Self {
        Self {
            max_chars,
            max_duration,
            max_gap,
        }
    }

    pub fn from_style(style: &StyleOptions) -> Self {
        Self::new(style.max_chars, style.max_duration, style.max_gap)
    }

    /// Whether `word` must start a new line instead of joining `line`
    fn breaks_before(&self, line: &LineBuilder, word: &WordSpan, gap: f64) -> bool {
        let time_hit = (line.duration + word.duration()) > self.max_duration;
        let chars_hit = (line.char_count + word.text.chars().count()) >= self.max_chars;
        let gap_hit = gap > self.max_gap;

        time_hit || chars_hit || gap_hit
    }
}

/// Line under construction. Consumed by `finish` to produce the immutable line.
#[derive(Debug, Default)]
struct LineBuilder {
    start: Option<f64>,
    end: f64,
    duration: f64,
    text: String,
    char_count: usize,
}

impl LineBuilder {
    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn push(mut self, word: &WordSpan) -> Self {
        if self.start.is_none() {
            self.start = Some(word.start);
        }
        self.text.push_str(&word.text);
        self.char_count += word.text.chars().count();
        self.end = word.end;
        self.duration += word.duration();
        self
    }

    fn finish(self) -> Option<SubtitleLine> {
        if self.is_empty() {
            return None;
        }
        let start = self.start?;

        Some(SubtitleLine::new(
            start,
            self.end,
            self.duration,
            self.text.trim(),
        ))
    }
}

/// Group timed words into subtitle lines.
///
/// Words are taken in input order and never split, dropped or reordered.
pub fn segment(
    words: &[WordSpan],
    max_chars: usize,
    max_duration: f64,
    max_gap: f64,
) -> Vec<SubtitleLine> {
    segment_with_limits(words, SegmentLimits::new(max_chars, max_duration, max_gap))
}

/// Group timed words into subtitle lines using the limits carried by `style`
pub fn segment_with(words: &[WordSpan], style: &StyleOptions) -> Vec<SubtitleLine> {
    segment_with_limits(words, SegmentLimits::from_style(style))
}

pub fn segment_with_limits(words: &[WordSpan], limits: SegmentLimits) -> Vec<SubtitleLine> {
    let (mut lines, current) = words.iter().enumerate().fold(
        (Vec::new(), LineBuilder::default()),
        |(mut lines, current), (i, word)| {
            // The first word of the sequence never sees a gap
            let gap = if i > 0 { word.start - words[i - 1].end } else { 0.0 };

            let current = if !current.is_empty() && limits.breaks_before(&current, word, gap) {
                lines.extend(current.finish());
                LineBuilder::default()
            } else {
                current
            };

            (lines, current.push(word))
        },
    );

    lines.extend(current.finish());
    lines
}
