use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::caption::CaptionFormat;
use crate::error::{Result, SubgenixError};
use crate::preprocess::CasePolicy;

// Default values for segmentation
fn default_max_segment_duration() -> f64 {
    5.0
}

fn default_max_pause_duration() -> f64 {
    2.0
}

fn default_min_cue_duration() -> f64 {
    0.001
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".subgenix").join("cache")
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Longest span (seconds) a cue may cover before it is broken up
    #[serde(default = "default_max_segment_duration")]
    pub max_segment_duration: f64,
    /// Silence between two words (seconds) that forces a break
    #[serde(default = "default_max_pause_duration")]
    pub max_pause_duration: f64,
    /// Shortest duration a cue is stretched to when its words carry no length
    #[serde(default = "default_min_cue_duration")]
    pub min_cue_duration: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Case normalization applied to every word
    #[serde(default)]
    pub case: CasePolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Caption format written when none is requested on the command line
    #[serde(default)]
    pub format: CaptionFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Memoize segmentation results between runs
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory holding the cache index and cue files
    #[serde(default = "default_cache_dir")]
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Render a progress bar instead of plain status lines
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            max_segment_duration: default_max_segment_duration(),
            max_pause_duration: default_max_pause_duration(),
            min_cue_duration: default_min_cue_duration(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_cache_dir(),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { show_progress: true }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubgenixError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SubgenixError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubgenixError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubgenixError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject tunables the segmenter cannot work with
    pub fn validate(&self) -> Result<()> {
        let seg = &self.segmentation;
        let checks = [
            ("max_segment_duration", seg.max_segment_duration),
            ("max_pause_duration", seg.max_pause_duration),
            ("min_cue_duration", seg.min_cue_duration),
        ];

        for (name, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(SubgenixError::InvalidInput(format!(
                    "{} must be a positive number of seconds, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.segmentation.max_segment_duration, 5.0);
        assert_eq!(config.segmentation.max_pause_duration, 2.0);
        assert_eq!(config.output.format, CaptionFormat::Srt);
        assert_eq!(config.preprocess.case, CasePolicy::Preserve);
        assert!(config.cache.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            "[segmentation]\nmax_pause_duration = 1.5\n\n[output]\nformat = \"vtt\"\n",
        )
        .unwrap();
        assert_eq!(config.segmentation.max_pause_duration, 1.5);
        assert_eq!(config.segmentation.max_segment_duration, 5.0);
        assert_eq!(config.output.format, CaptionFormat::Vtt);
        assert!(config.progress.show_progress);
    }

    #[test]
    fn test_validate_rejects_non_positive_bounds() {
        let mut config = Config::default();
        config.segmentation.max_segment_duration = 0.0;
        assert!(matches!(config.validate(), Err(SubgenixError::InvalidInput(_))));

        let mut config = Config::default();
        config.segmentation.max_pause_duration = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.preprocess.case = CasePolicy::Lower;
        config.cache.enabled = false;
        config.save_to_file(&path).unwrap();

        let reloaded = Config::from_file(&path).unwrap();
        assert_eq!(reloaded.preprocess.case, CasePolicy::Lower);
        assert!(!reloaded.cache.enabled);
    }
}
