use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, SubgenixError};
use crate::transcript::WordSpan;

/// Case normalization applied to every word before segmentation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CasePolicy {
    /// Keep the transcriber's casing
    #[default]
    Preserve,
    Lower,
    Upper,
}

impl CasePolicy {
    fn apply(self, text: &str) -> String {
        match self {
            CasePolicy::Preserve => text.to_string(),
            CasePolicy::Lower => text.to_lowercase(),
            CasePolicy::Upper => text.to_uppercase(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CasePolicy::Preserve => "preserve",
            CasePolicy::Lower => "lower",
            CasePolicy::Upper => "upper",
        }
    }
}

impl FromStr for CasePolicy {
    type Err = SubgenixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "preserve" => Ok(CasePolicy::Preserve),
            "lower" => Ok(CasePolicy::Lower),
            "upper" => Ok(CasePolicy::Upper),
            _ => Err(SubgenixError::Config(format!(
                "Invalid case policy: {}. Valid options: preserve, lower, upper",
                s
            ))),
        }
    }
}

/// Trim and case-normalize word spans, dropping the ones left empty.
///
/// Punctuation is kept as-is: the split heuristic relies on trailing
/// sentence marks. Spans must be well formed (finite, non-negative,
/// `end >= start`) and their start times non-decreasing; overlapping
/// spans are accepted.
pub fn preprocess(spans: &[WordSpan], case: CasePolicy) -> Result<Vec<WordSpan>> {
    let mut kept: Vec<WordSpan> = Vec::with_capacity(spans.len());

    for (index, span) in spans.iter().enumerate() {
        let text = span.text.trim();
        if text.is_empty() {
            continue;
        }

        if !span.start.is_finite() || !span.end.is_finite() || span.start < 0.0 {
            return Err(malformed(index, span, "timestamps must be finite and non-negative"));
        }
        if span.end < span.start {
            return Err(malformed(index, span, "end precedes start"));
        }
        if let Some(previous) = kept.last() {
            if span.start < previous.start {
                return Err(malformed(
                    index,
                    span,
                    &format!("start precedes previous word start {:.3}", previous.start),
                ));
            }
        }

        kept.push(WordSpan::new(span.start, span.end, case.apply(text)));
    }

    if kept.is_empty() {
        return Err(SubgenixError::InvalidInput(format!(
            "no words left after preprocessing {} spans",
            spans.len()
        )));
    }

    Ok(kept)
}

fn malformed(index: usize, span: &WordSpan, reason: &str) -> SubgenixError {
    SubgenixError::InvalidInput(format!(
        "span {} ({:.3}-{:.3} {:?}): {}",
        index, span.start, span.end, span.text, reason
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_drops_empty_words() {
        let spans = vec![
            WordSpan::new(0.0, 0.4, "  Hello "),
            WordSpan::new(0.4, 0.5, "   "),
            WordSpan::new(0.5, 0.9, "world.\n"),
        ];

        let result = preprocess(&spans, CasePolicy::Preserve).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "Hello");
        assert_eq!(result[1].text, "world.");
        assert_eq!(result[1].start, 0.5);
    }

    #[test]
    fn test_case_policy_keeps_punctuation() {
        let spans = vec![WordSpan::new(0.0, 1.0, "Hello,"), WordSpan::new(1.0, 2.0, "World!")];

        let lower = preprocess(&spans, CasePolicy::Lower).unwrap();
        assert_eq!(lower[0].text, "hello,");
        assert_eq!(lower[1].text, "world!");

        let upper = preprocess(&spans, CasePolicy::Upper).unwrap();
        assert_eq!(upper[1].text, "WORLD!");
    }

    #[test]
    fn test_empty_result_is_invalid_input() {
        assert!(matches!(
            preprocess(&[], CasePolicy::Preserve),
            Err(SubgenixError::InvalidInput(_))
        ));
        assert!(matches!(
            preprocess(&[WordSpan::new(0.0, 1.0, " ")], CasePolicy::Preserve),
            Err(SubgenixError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_overlap_is_tolerated() {
        let spans = vec![WordSpan::new(0.0, 1.0, "a"), WordSpan::new(0.5, 1.5, "b")];
        assert_eq!(preprocess(&spans, CasePolicy::Preserve).unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_malformed_spans() {
        let backwards = vec![WordSpan::new(1.0, 0.5, "oops")];
        let err = preprocess(&backwards, CasePolicy::Preserve).unwrap_err();
        assert!(err.to_string().contains("oops"));

        let negative = vec![WordSpan::new(-1.0, 0.5, "neg")];
        assert!(preprocess(&negative, CasePolicy::Preserve).is_err());

        let non_monotonic = vec![WordSpan::new(2.0, 2.5, "late"), WordSpan::new(1.0, 1.5, "early")];
        let err = preprocess(&non_monotonic, CasePolicy::Preserve).unwrap_err();
        assert!(err.to_string().contains("span 1"));
    }

    #[test]
    fn test_case_policy_from_str() {
        assert_eq!("LOWER".parse::<CasePolicy>().unwrap(), CasePolicy::Lower);
        assert!("title".parse::<CasePolicy>().is_err());
    }
}
