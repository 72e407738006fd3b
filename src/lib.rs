//! Subgenix - caption generation from word-level timestamps
//!
//! Groups the word spans produced by a speech-to-text stage into timed cues
//! and writes them as SRT or WebVTT caption files.

pub mod cache;
pub mod caption;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod preprocess;
pub mod progress;
pub mod segment;
pub mod split;
pub mod timecode;
pub mod transcript;

pub use caption::{encode, CaptionFormat};
pub use error::{Result, SubgenixError};
pub use segment::{segment, Segmenter};
pub use transcript::{Cue, WordSpan};
