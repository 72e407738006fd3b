use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit log records as JSON lines
    #[arg(long)]
    pub structured_logging: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a caption file from word-level timestamps
    Generate {
        /// Word timestamp JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output caption file (extension is adjusted to the format)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Caption format: srt or vtt
        #[arg(short, long)]
        format: Option<String>,

        /// Maximum duration of a single cue in seconds
        #[arg(long)]
        max_segment_duration: Option<f64>,

        /// Pause between words in seconds that forces a new cue
        #[arg(long)]
        max_pause_duration: Option<f64>,

        /// Case normalization: preserve, lower or upper
        #[arg(long)]
        case: Option<String>,

        /// Skip the segmentation cache
        #[arg(long)]
        no_cache: bool,

        /// Print plain status lines instead of a progress bar
        #[arg(long)]
        hide_progress: bool,
    },

    /// Manage the segmentation cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// List cached segmentations
    List,

    /// Clear all cached segmentations
    Clear,

    /// Show cache statistics and size
    Info,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let args = Args::try_parse_from([
            "subgenix",
            "-v",
            "generate",
            "-i",
            "words.json",
            "-f",
            "vtt",
            "--max-pause-duration",
            "1.5",
            "--no-cache",
        ])
        .unwrap();

        assert!(args.verbose);
        match args.command {
            Commands::Generate {
                input,
                format,
                max_pause_duration,
                no_cache,
                output,
                ..
            } => {
                assert_eq!(input, PathBuf::from("words.json"));
                assert_eq!(format.as_deref(), Some("vtt"));
                assert_eq!(max_pause_duration, Some(1.5));
                assert!(no_cache);
                assert!(output.is_none());
            }
            _ => panic!("expected generate command"),
        }
    }

    #[test]
    fn test_parse_cache_info() {
        let args = Args::try_parse_from(["subgenix", "cache", "info"]).unwrap();
        assert!(matches!(
            args.command,
            Commands::Cache {
                action: CacheAction::Info
            }
        ));
    }
}
