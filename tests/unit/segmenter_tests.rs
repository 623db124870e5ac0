/*!
 * Property tests for word-to-line segmentation
 */

use vidcaption::captions::{segment, SegmentLimits, StyleOptions, SubtitleLine, WordSpan};
use vidcaption::captions::segmenter::segment_with_limits;
use vidcaption::segment as root_segment;
use std::ops::Range;

use crate::common;

/// Deterministic word stream with varied lengths, durations and pauses
fn synthetic_words(count: usize) -> Vec<WordSpan> {
    let vocabulary = ["a ", "caption ", "is ", "burned ", "into ", "the ", "extraordinarily ", "video "];
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let mut clock = 0.0;

    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;

            let text = vocabulary[(state % vocabulary.len() as u64) as usize];
            let duration = 0.1 + (state % 7) as f64 * 0.1;
            let pause = if state % 11 == 0 { 1.5 } else { (state % 3) as f64 * 0.05 };

            let start = clock + pause;
            let end = start + duration;
            clock = end;
            WordSpan::new(start, end, text)
        })
        .collect()
}

fn spoken_duration(words: &[WordSpan]) -> f64 {
    words.iter().fold(0.0, |total, w| total + w.duration())
}

fn char_count(words: &[WordSpan]) -> usize {
    words.iter().map(|w| w.text.chars().count()).sum()
}

/// Word index ranges behind each line; word starts are strictly increasing
fn line_word_ranges(words: &[WordSpan], lines: &[SubtitleLine]) -> Vec<Range<usize>> {
    let starts: Vec<usize> = lines
        .iter()
        .map(|line| {
            words
                .iter()
                .position(|w| w.start == line.start)
                .expect("every line starts on a word")
        })
        .collect();

    starts
        .iter()
        .zip(starts.iter().skip(1).chain(std::iter::once(&words.len())))
        .map(|(&from, &to)| from..to)
        .collect()
}

/// Whether `next` would close a line made of `line` under `limits`
fn closes_line(line: &[WordSpan], next: &WordSpan, gap: f64, limits: SegmentLimits) -> bool {
    let time_hit = spoken_duration(line) + next.duration() > limits.max_duration;
    let chars_hit = char_count(line) + next.text.chars().count() >= limits.max_chars;
    let gap_hit = gap > limits.max_gap;

    time_hit || chars_hit || gap_hit
}

#[test]
fn test_segment_shouldPreserveEveryWordInOrder() {
    let words = synthetic_words(400);
    let lines = segment(&words, 30, 3.0, 1.0);

    let joined_words: String = words.iter().map(|w| w.text.as_str()).collect();
    let joined_lines = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let normalize = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
    assert_eq!(normalize(&joined_words), normalize(&joined_lines));
}

#[test]
fn test_segment_shouldKeepLinesOrderedAndNonOverlapping() {
    let words = synthetic_words(400);
    let lines = segment(&words, 30, 3.0, 1.0);

    assert!(!lines.is_empty());
    for line in &lines {
        assert!(line.start <= line.end, "line ends before it starts: {:?}", line);
    }
    for pair in lines.windows(2) {
        assert!(pair[0].end <= pair[1].start, "overlapping lines: {:?}", pair);
    }
}

#[test]
fn test_segment_lineDurations_shouldSumToSpokenTime() {
    let words = synthetic_words(250);
    let lines = segment(&words, 42, 3.0, 1.0);

    let total: f64 = lines.iter().map(|l| l.duration).sum();
    assert!((total - spoken_duration(&words)).abs() < 1e-6);
}

#[test]
fn test_segment_withLargePauses_shouldNeverSpanAGap() {
    let words = synthetic_words(300);
    let max_gap = 1.0;
    let lines = segment(&words, 1000, 1000.0, max_gap);

    // Every pause above the limit must coincide with a line boundary
    let boundaries: Vec<f64> = lines.iter().map(|l| l.start).collect();
    for pair in words.windows(2) {
        if pair[1].start - pair[0].end > max_gap {
            assert!(
                boundaries.iter().any(|b| (*b - pair[1].start).abs() < 1e-9),
                "pause before {:?} was not a line break",
                pair[1]
            );
        }
    }
}

#[test]
fn test_segment_withCharLimit_shouldOnlyOverflowOnSingleWordLines() {
    let words = vec![
        WordSpan::new(0.0, 0.1, "short "),
        WordSpan::new(0.1, 0.2, "incomprehensibilities "),
        WordSpan::new(0.2, 0.3, "ok "),
        WordSpan::new(0.3, 0.4, "fine"),
    ];
    let lines = segment(&words, 10, 100.0, 100.0);

    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["short", "incomprehensibilities", "ok fine"]);
}

#[test]
fn test_segment_withEmptyInput_shouldReturnNoLines() {
    assert!(segment(&[], 42, 3.0, 1.0).is_empty());
}

#[test]
fn test_segment_withSingleLongWord_shouldEmitOneLine() {
    let words = common::words(&[(1.0, 9.0, "sooooooooooooooooooooooooooooooooooooooooooooooo")]);
    let lines = segment(&words, 5, 1.0, 0.1);

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].start, 1.0);
    assert_eq!(lines[0].end, 9.0);
}

#[test]
fn test_segment_withDefaults_shouldMatchStyleLimits() {
    let words = synthetic_words(120);
    let style = StyleOptions::default();

    let by_style = segment_with_limits(&words, SegmentLimits::from_style(&style));
    let by_values: Vec<SubtitleLine> =
        root_segment(&words, style.max_chars, style.max_duration, style.max_gap);

    assert_eq!(by_style, by_values);
}

#[test]
fn test_segment_withDurationLimit_shouldBreakWhenSpokenTimeWouldExceed() {
    let words = common::words(&[
        (0.0, 1.0, "one "),
        (1.0, 2.0, "two "),
        (2.0, 3.0, "three "),
        (3.0, 4.0, "four"),
    ]);
    let lines = segment(&words, 100, 2.0, 10.0);

    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["one two", "three four"]);
    assert!((lines[0].duration - 2.0).abs() < 1e-9);
    assert_eq!(lines[1].start, 2.0);
}

#[test]
fn test_segment_everyClosedLine_shouldBeClosedByTheNextWord() {
    let words = synthetic_words(500);

    for limits in [
        SegmentLimits::new(30, 3.0, 1.0),
        SegmentLimits::new(12, 1.0, 0.08),
        SegmentLimits::new(80, 6.0, 2.0),
    ] {
        let lines = segment_with_limits(&words, limits);
        let ranges = line_word_ranges(&words, &lines);
        assert_eq!(ranges.last().map(|r| r.end), Some(words.len()));

        for range in ranges.iter().take(ranges.len() - 1) {
            let next = &words[range.end];
            let gap = next.start - words[range.end - 1].end;

            assert!(
                closes_line(&words[range.clone()], next, gap, limits),
                "line {:?} was closed without a limit firing on {:?} ({:?})",
                range,
                next,
                limits
            );
        }
    }
}

#[test]
fn test_segment_everyLineWithoutItsLastWord_shouldBeWithinLimits() {
    let words = synthetic_words(500);

    for limits in [SegmentLimits::new(30, 3.0, 1.0), SegmentLimits::new(12, 1.0, 0.08)] {
        let lines = segment_with_limits(&words, limits);

        for range in line_word_ranges(&words, &lines) {
            // Each word after the first joined the line without tripping a limit
            for i in (range.start + 1)..range.end {
                let gap = words[i].start - words[i - 1].end;
                assert!(
                    !closes_line(&words[range.start..i], &words[i], gap, limits),
                    "word {} joined line {:?} past a limit ({:?})",
                    i,
                    range,
                    limits
                );
            }
        }
    }
}
