use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SubgenixError};
use crate::timecode;
use crate::transcript::Cue;

/// Header line opening every WebVTT document
pub const VTT_HEADER: &str = "WEBVTT";

/// Supported caption framings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionFormat {
    /// SubRip: numbered cues, comma before milliseconds
    #[default]
    Srt,
    /// WebVTT: header line, unnumbered cues, dot before milliseconds
    Vtt,
}

impl CaptionFormat {
    /// File extension matching the format
    pub fn extension(self) -> &'static str {
        match self {
            CaptionFormat::Srt => "srt",
            CaptionFormat::Vtt => "vtt",
        }
    }

    pub fn millisecond_separator(self) -> char {
        match self {
            CaptionFormat::Srt => ',',
            CaptionFormat::Vtt => '.',
        }
    }
}

impl FromStr for CaptionFormat {
    type Err = SubgenixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "srt" => Ok(CaptionFormat::Srt),
            "vtt" | "webvtt" => Ok(CaptionFormat::Vtt),
            _ => Err(SubgenixError::UnsupportedFormat(format!(
                "{:?}. Valid options: srt, vtt",
                s
            ))),
        }
    }
}

impl fmt::Display for CaptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Serialize cues into a caption document.
///
/// Sequence numbers are assigned here, 1-based, from the cue order. An empty
/// cue list gives an empty SRT document or a bare WebVTT header.
pub fn encode(cues: &[Cue], format: CaptionFormat) -> String {
    let mut content = String::new();

    if format == CaptionFormat::Vtt {
        content.push_str(VTT_HEADER);
        content.push_str("\n\n");
    }

    for (index, cue) in cues.iter().enumerate() {
        encode_cue(&mut content, index + 1, cue, format);
    }

    content
}

/// Encode with a format token such as `"srt"` or `"vtt"`
pub fn encode_with(cues: &[Cue], token: &str) -> Result<String> {
    let format = token.parse::<CaptionFormat>()?;
    Ok(encode(cues, format))
}

fn encode_cue(content: &mut String, sequence: usize, cue: &Cue, format: CaptionFormat) {
    if format == CaptionFormat::Srt {
        content.push_str(&format!("{}\n", sequence));
    }

    content.push_str(&format!(
        "{} --> {}\n",
        timecode::format(cue.start(), format),
        timecode::format(cue.end(), format)
    ));

    // A blank line would end the cue early
    for line in cue.text().lines().map(str::trim).filter(|l| !l.is_empty()) {
        content.push_str(line);
        content.push('\n');
    }

    content.push('\n');
}
