//! Grouping of word spans into caption cues.
//!
//! The walk is a two-state machine. `Accumulating` owns the open segment and
//! its start time; `Flushed` remembers where the last forced flush ended, and
//! the next segment opens at that time. A segment is broken whenever its
//! duration or the pause before the current word reaches the configured bound.

use crate::config::SegmentationConfig;
use crate::split::find_split;
use crate::transcript::{Cue, WordSpan};

enum SegmentState<'a> {
    Flushed { baseline: f64 },
    Accumulating { start: f64, words: Vec<&'a WordSpan> },
}

/// Cue segmentation with explicit duration and pause bounds
#[derive(Debug, Clone)]
pub struct Segmenter {
    max_segment_duration: f64,
    max_pause_duration: f64,
    min_cue_duration: f64,
}

impl Segmenter {
    pub fn new(max_segment_duration: f64, max_pause_duration: f64) -> Self {
        Self {
            max_segment_duration,
            max_pause_duration,
            min_cue_duration: SegmentationConfig::default().min_cue_duration,
        }
    }

    pub fn with_min_cue_duration(mut self, min_cue_duration: f64) -> Self {
        self.min_cue_duration = min_cue_duration;
        self
    }

    pub fn from_config(config: &SegmentationConfig) -> Self {
        Self::new(config.max_segment_duration, config.max_pause_duration)
            .with_min_cue_duration(config.min_cue_duration)
    }

    /// Group ordered word spans into cues.
    ///
    /// Every span lands in exactly one cue, in order. Never fails: a segment
    /// that cannot be split is closed as a whole, and a word longer than the
    /// duration bound becomes a cue of its own.
    pub fn segment(&self, spans: &[WordSpan]) -> Vec<Cue> {
        let Some(first) = spans.first() else {
            return Vec::new();
        };

        let mut cues = Vec::new();
        let mut state = SegmentState::Flushed { baseline: first.start };
        let mut previous_end: Option<f64> = None;

        for span in spans {
            let (start, mut words) = match state {
                SegmentState::Flushed { baseline } => (baseline, Vec::new()),
                SegmentState::Accumulating { start, words } => (start, words),
            };
            words.push(span);

            let segment_duration = span.end - start;
            let pause = previous_end.map_or(0.0, |end| span.start - end);
            previous_end = Some(span.end);

            if segment_duration < self.max_segment_duration && pause < self.max_pause_duration {
                state = SegmentState::Accumulating { start, words };
                continue;
            }

            let split = find_split(&words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>());
            if split > 0 && split < words.len() {
                let remainder = words.split_off(split);
                let prefix_end = words[words.len() - 1].end;
                cues.push(self.close(start, prefix_end, &words));

                let remainder_start = remainder[0].start.max(start);
                state = SegmentState::Accumulating {
                    start: remainder_start,
                    words: remainder,
                };
            } else {
                cues.push(self.close(start, span.end, &words));
                state = SegmentState::Flushed { baseline: span.end };
            }
        }

        if let SegmentState::Accumulating { start, words } = state {
            if let Some(last) = spans.last() {
                cues.push(self.close(start, last.end, &words));
            }
        }

        cues
    }

    fn close(&self, start: f64, end: f64, words: &[&WordSpan]) -> Cue {
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let end = end.max(start + self.min_cue_duration);
        Cue::from_parts(start, end, text)
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::from_config(&SegmentationConfig::default())
    }
}

/// Segment spans with the given bounds and the default minimum cue duration
pub fn segment(spans: &[WordSpan], max_segment_duration: f64, max_pause_duration: f64) -> Vec<Cue> {
    Segmenter::new(max_segment_duration, max_pause_duration).segment(spans)
}
