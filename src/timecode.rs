use crate::caption::CaptionFormat;

/// Format seconds as a caption timestamp (`HH:MM:SS,mmm` for SRT,
/// `HH:MM:SS.mmm` for WebVTT).
///
/// Rounds half-up to the nearest millisecond. Hours grow past two digits
/// when needed. Negative and non-finite inputs format as zero.
pub fn format(seconds: f64, variant: CaptionFormat) -> String {
    let total_milliseconds = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };

    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours,
        minutes,
        secs,
        variant.millisecond_separator(),
        millis
    )
}
