//! Subgenix - caption generation from word-level timestamps
//!
//! Command-line entry point: loads a word timestamp file produced by a
//! speech-to-text stage and writes an SRT or WebVTT caption file.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subgenix::cache::CueCache;
use subgenix::caption::CaptionFormat;
use subgenix::cli::{Args, CacheAction, Commands};
use subgenix::config::Config;
use subgenix::pipeline::SubtitleGenerator;
use subgenix::preprocess::CasePolicy;
use subgenix::progress::ConsoleProgress;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    let _guard = setup_logging(args.verbose, args.structured_logging)?;
    info!("Starting Subgenix");

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Generate {
            input,
            output,
            format,
            max_segment_duration,
            max_pause_duration,
            case,
            no_cache,
            hide_progress,
        } => {
            // Command-line flags override the configuration file
            if let Some(format) = format {
                config.output.format = format.parse::<CaptionFormat>()?;
            }
            if let Some(duration) = max_segment_duration {
                config.segmentation.max_segment_duration = duration;
            }
            if let Some(duration) = max_pause_duration {
                config.segmentation.max_pause_duration = duration;
            }
            if let Some(case) = case {
                config.preprocess.case = case.parse::<CasePolicy>()?;
            }
            if no_cache {
                config.cache.enabled = false;
            }
            if hide_progress {
                config.progress.show_progress = false;
            }

            let format = config.output.format;
            let output = output.unwrap_or_else(|| input.with_extension(format.extension()));

            info!("Processing word timestamps: {}", input.display());
            info!("Output file: {}", output.display());
            info!("Format: {}", format);
            info!(
                "Max segment duration: {:.2}s, max pause duration: {:.2}s",
                config.segmentation.max_segment_duration, config.segmentation.max_pause_duration
            );

            let observer = Arc::new(ConsoleProgress::new(config.progress.show_progress));
            let cache = config
                .cache
                .enabled
                .then(|| CueCache::new(&config.cache.directory));

            let mut generator = SubtitleGenerator::new(config)?.with_observer(observer);
            if let Some(cache) = cache {
                generator = generator.with_cache(cache);
            }

            let path = generator.generate_from_file(&input, &output, format).await?;
            println!("Subtitles written to {}", path.display());
        }

        Commands::Cache { action } => {
            info!("Managing segmentation cache...");
            let cache = CueCache::new(&config.cache.directory);

            match action {
                CacheAction::List => {
                    let entries = cache.list().await?;

                    if entries.is_empty() {
                        println!("No cached segmentations found.");
                    } else {
                        println!("\nCached Segmentations:");
                        println!("{:<20} {:<10} {:<15} {:<30}", "Key", "Kind", "Cached", "File");
                        println!("{}", "-".repeat(75));

                        for (key, entry) in entries {
                            let cached_ago = Utc::now()
                                .signed_duration_since(entry.cached_at)
                                .num_seconds()
                                .max(0) as u64;

                            println!(
                                "{:<20} {:<10} {:<15} {:<30}",
                                key,
                                entry.kind,
                                format_duration(cached_ago),
                                entry.filename
                            );
                        }
                    }
                }
                CacheAction::Clear => {
                    let removed = cache.clear().await?;
                    println!("Removed {} cached segmentations.", removed);
                }
                CacheAction::Info => {
                    let info = cache.info().await?;

                    println!("\nCache Information:");
                    println!("Directory:      {}", cache.dir().display());
                    println!("Entries:        {}", info.entries);
                    println!("Total size:     {:.2} KB", info.total_size as f64 / 1024.0);

                    if let Some(oldest) = info.oldest_entry {
                        println!("Oldest entry:   {}", oldest.format("%Y-%m-%d %H:%M:%S UTC"));
                    }
                    if let Some(newest) = info.newest_entry {
                        println!("Newest entry:   {}", newest.format("%Y-%m-%d %H:%M:%S UTC"));
                    }
                }
            }
        }

        Commands::InitConfig { output } => {
            if output.exists() {
                anyhow::bail!("Refusing to overwrite existing file {}", output.display());
            }
            config.save_to_file(&output)?;
            println!("Configuration written to {}", output.display());
        }
    }

    info!("Subgenix finished");
    Ok(())
}

fn setup_logging(verbose: bool, structured: bool) -> Result<WorkerGuard> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".subgenix").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "subgenix.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Plain layers, used unless structured logging is requested
    let console_layer = (!structured).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
    });
    let file_layer = (!structured).then(|| {
        fmt::layer()
            .with_writer(non_blocking_file.clone())
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
    });

    // JSON layers
    let json_console_layer = structured.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let json_file_layer = structured.then(|| fmt::layer().json().with_writer(non_blocking_file));

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .with(json_console_layer)
        .with(json_file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - level: {}, file: {}",
        log_level,
        log_dir.join("subgenix.log").display()
    );

    Ok(guard)
}

/// Format duration in seconds to human readable string
fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86_400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86_400, (seconds % 86_400) / 3600)
    }
}
