//! Word-level timing data exchanged with the speech-to-text side, and the
//! cues produced from it.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, SubgenixError};

/// The smallest timed unit of a transcript, usually one spoken word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordSpan {
    pub start: f64,
    pub end: f64,
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
}

impl From<(f64, f64, &str)> for WordSpan {
    fn from((start, end, text): (f64, f64, &str)) -> Self {
        WordSpan::new(start, end, text)
    }
}

/// One displayed caption unit.
///
/// Cues are immutable once built. Their sequence number is not part of the
/// cue; the encoder assigns it from the position in the track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cue {
    start: f64,
    end: f64,
    text: String,
}

impl Cue {
    /// Build a cue, rejecting non-finite times and empty durations
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
            return Err(SubgenixError::InvalidInput(format!(
                "cue {:?} has invalid timing {}-{}",
                text, start, end
            )));
        }
        Ok(Self { start, end, text })
    }

    /// Internal constructor for the segmenter, which already guarantees the timing
    pub(crate) fn from_parts(start: f64, end: f64, text: String) -> Self {
        Self { start, end, text }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

// Transcribers disagree on the shape, so accept both triples and objects
#[derive(Deserialize)]
#[serde(untagged)]
enum RawWordSpan {
    Triple(f64, f64, String),
    Object {
        start: f64,
        end: f64,
        #[serde(alias = "word")]
        text: String,
    },
}

impl From<RawWordSpan> for WordSpan {
    fn from(raw: RawWordSpan) -> Self {
        match raw {
            RawWordSpan::Triple(start, end, text) => WordSpan { start, end, text },
            RawWordSpan::Object { start, end, text } => WordSpan { start, end, text },
        }
    }
}

/// Parse word spans from JSON text
pub fn parse_word_spans(content: &str) -> Result<Vec<WordSpan>> {
    let raw: Vec<RawWordSpan> = serde_json::from_str(content)?;
    Ok(raw.into_iter().map(WordSpan::from).collect())
}

/// Load word spans from a JSON file written by the transcription stage
pub async fn load_word_spans<P: AsRef<Path>>(path: P) -> Result<Vec<WordSpan>> {
    let path = path.as_ref();
    info!("Loading word timestamps from {}", path.display());

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| SubgenixError::io(path, e))?;

    let spans = parse_word_spans(&content).map_err(|e| {
        SubgenixError::InvalidInput(format!("{}: {}", path.display(), e))
    })?;

    debug!("Loaded {} word spans", spans.len());
    Ok(spans)
}
