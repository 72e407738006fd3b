use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::CueCache;
use crate::caption::{encode, CaptionFormat};
use crate::config::Config;
use crate::error::{Result, SubgenixError};
use crate::preprocess::preprocess;
use crate::progress::ProgressObserver;
use crate::segment::Segmenter;
use crate::transcript::{load_word_spans, Cue, WordSpan};

/// Destination for encoded caption documents
#[async_trait]
pub trait CaptionWriter: Send + Sync {
    /// Write `contents` to `path`. On error the destination must be left as it was.
    async fn write(&self, path: &Path, contents: &str) -> Result<()>;
}

/// Writes through a temp file in the destination directory and renames it
/// into place, so a failed write never leaves a partial file behind.
pub struct AtomicFileWriter;

impl AtomicFileWriter {
    async fn write_temp(temp_path: &Path, contents: &str) -> Result<()> {
        let mut file = fs::File::create(temp_path)
            .await
            .map_err(|e| SubgenixError::io(temp_path, e))?;

        file.write_all(contents.as_bytes())
            .await
            .map_err(|e| SubgenixError::io(temp_path, e))?;
        file.flush().await.map_err(|e| SubgenixError::io(temp_path, e))?;
        file.sync_all().await.map_err(|e| SubgenixError::io(temp_path, e))?;

        Ok(())
    }
}

#[async_trait]
impl CaptionWriter for AtomicFileWriter {
    async fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .await
            .map_err(|e| SubgenixError::io(&parent, e))?;

        let file_name = path
            .file_name()
            .ok_or_else(|| {
                SubgenixError::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "output path has no file name"),
                )
            })?
            .to_string_lossy();
        let temp_path = parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        let result = match Self::write_temp(&temp_path, contents).await {
            Ok(()) => fs::rename(&temp_path, path)
                .await
                .map_err(|e| SubgenixError::io(path, e)),
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(e) = fs::remove_file(&temp_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove temp file {}: {}", temp_path.display(), e);
                }
            }
        }

        result
    }
}

/// Give the output path the extension of the requested format.
///
/// A matching extension is kept as written, whatever its case.
pub fn resolve_output_path<P: AsRef<Path>>(requested: P, format: CaptionFormat) -> PathBuf {
    let requested = requested.as_ref();
    let matches = requested
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(format.extension()));

    if matches {
        requested.to_path_buf()
    } else {
        requested.with_extension(format.extension())
    }
}

/// Runs preprocessing, segmentation, encoding and writing for one transcript
pub struct SubtitleGenerator {
    config: Config,
    segmenter: Segmenter,
    writer: Box<dyn CaptionWriter>,
    observer: Option<Arc<dyn ProgressObserver>>,
    cache: Option<CueCache>,
}

impl SubtitleGenerator {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        info!(
            "SubtitleGenerator initialized (max segment {:.2}s, max pause {:.2}s)",
            config.segmentation.max_segment_duration, config.segmentation.max_pause_duration
        );

        Ok(Self {
            segmenter: Segmenter::from_config(&config.segmentation),
            config,
            writer: Box::new(AtomicFileWriter),
            observer: None,
            cache: None,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_writer(mut self, writer: Box<dyn CaptionWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// Memoize segmentation results in `cache`. Without it nothing touches the filesystem
    /// except the caption file itself.
    pub fn with_cache(mut self, cache: CueCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Load word spans from a JSON file and generate captions from them
    pub async fn generate_from_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
        format: CaptionFormat,
    ) -> Result<PathBuf> {
        let spans = load_word_spans(input_path).await?;
        self.generate(&spans, output_path, format).await
    }

    /// Generate a caption file and return the path it was written to
    pub async fn generate<P: AsRef<Path>>(
        &self,
        spans: &[WordSpan],
        output_path: P,
        format: CaptionFormat,
    ) -> Result<PathBuf> {
        let output_path = output_path.as_ref();
        self.notify(|o| o.on_start("Generating subtitles", None));
        info!("Generating {} subtitles for output file: {}", format, output_path.display());

        match self.run(spans, output_path, format).await {
            Ok(path) => {
                self.notify(|o| o.on_complete("Subtitles generated"));
                info!("Subtitles generated successfully: {}", path.display());
                Ok(path)
            }
            Err(e) => {
                error!("Error generating subtitles: {}", e);
                self.notify(|o| o.on_fail("Subtitle generation failed"));
                Err(e)
            }
        }
    }

    /// Preprocess and segment spans, going through the cache when enabled
    pub async fn build_cues(&self, spans: &[WordSpan]) -> Result<Vec<Cue>> {
        let words = preprocess(spans, self.config.preprocess.case)?;
        debug!("{} of {} spans kept after preprocessing", words.len(), spans.len());

        let Some(cache) = &self.cache else {
            return Ok(self.segmenter.segment(&words));
        };

        let key = CueCache::key(&words, &self.config.segmentation, self.config.preprocess.case);
        match cache.get(&key).await {
            Ok(Some(cues)) => {
                info!("Using cached segmentation {}", key);
                return Ok(cues);
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring unreadable cache entry {}: {}", key, e),
        }

        let cues = self.segmenter.segment(&words);
        if let Err(e) = cache.put(&key, &cues).await {
            warn!("Failed to cache segmentation {}: {}", key, e);
        }

        Ok(cues)
    }

    async fn run(&self, spans: &[WordSpan], output_path: &Path, format: CaptionFormat) -> Result<PathBuf> {
        let cues = self.build_cues(spans).await?;
        info!("Grouped {} words into {} cues", spans.len(), cues.len());

        let resolved = resolve_output_path(output_path, format);
        if resolved != output_path {
            debug!("Output path normalized to {}", resolved.display());
        }

        let total = cues.len() as u64;
        self.notify(|o| o.on_start(&format!("Writing {} subtitle segments", total), Some(total)));

        let content = encode(&cues, format);
        self.writer.write(&resolved, &content).await?;

        self.notify(|o| o.on_update(total));
        self.notify(|o| o.on_complete("Subtitle file written"));

        Ok(resolved)
    }

    fn notify<F: FnOnce(&dyn ProgressObserver)>(&self, f: F) {
        if let Some(observer) = &self.observer {
            f(observer.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MockProgressObserver;
    use mockall::predicate::eq;

    fn spans() -> Vec<WordSpan> {
        vec![
            WordSpan::new(0.0, 0.4, "Hello"),
            WordSpan::new(0.5, 0.9, "world."),
            WordSpan::new(3.0, 3.4, "New"),
            WordSpan::new(3.5, 4.0, "sentence."),
        ]
    }

    fn generator() -> SubtitleGenerator {
        SubtitleGenerator::new(Config::default()).unwrap()
    }

    #[test]
    fn test_resolve_output_path() {
        assert_eq!(resolve_output_path("out", CaptionFormat::Srt), PathBuf::from("out.srt"));
        assert_eq!(resolve_output_path("movie.mp4", CaptionFormat::Vtt), PathBuf::from("movie.vtt"));
        assert_eq!(resolve_output_path("a/b.SRT", CaptionFormat::Srt), PathBuf::from("a/b.SRT"));
        assert_eq!(resolve_output_path("a/b.srt", CaptionFormat::Vtt), PathBuf::from("a/b.vtt"));
    }

    #[tokio::test]
    async fn test_generate_srt_file() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator();

        let path = generator
            .generate(&spans(), dir.path().join("out.txt"), CaptionFormat::Srt)
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("out.srt"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "1\n00:00:00,000 --> 00:00:00,900\nHello world.\n\n\
             2\n00:00:03,000 --> 00:00:04,000\nNew sentence.\n\n"
        );

        // Only the caption file remains, no temp files
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_generate_vtt_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("subs").join("out.vtt");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, "old contents").unwrap();

        let path = generator()
            .generate(&spans(), &target, CaptionFormat::Vtt)
            .await
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("WEBVTT\n\n00:00:00.000 --> 00:00:00.900\nHello world.\n\n"));
        assert!(!content.contains("old contents"));
    }

    #[tokio::test]
    async fn test_empty_input_fails_and_notifies() {
        let dir = tempfile::tempdir().unwrap();

        let mut observer = MockProgressObserver::new();
        observer
            .expect_on_start()
            .with(eq("Generating subtitles"), eq(None))
            .times(1)
            .returning(|_, _| ());
        observer
            .expect_on_fail()
            .with(eq("Subtitle generation failed"))
            .times(1)
            .returning(|_| ());
        observer.expect_on_complete().never();

        let generator = generator().with_observer(Arc::new(observer));
        let blanks = vec![WordSpan::new(0.0, 1.0, "  ")];
        let err = generator
            .generate(&blanks, dir.path().join("out.srt"), CaptionFormat::Srt)
            .await
            .unwrap_err();

        assert!(matches!(err, SubgenixError::InvalidInput(_)));
        assert!(!dir.path().join("out.srt").exists());
    }

    #[tokio::test]
    async fn test_successful_run_reports_progress() {
        let dir = tempfile::tempdir().unwrap();

        let mut observer = MockProgressObserver::new();
        observer.expect_on_start().times(2).returning(|_, _| ());
        observer.expect_on_update().with(eq(2)).times(1).returning(|_| ());
        observer.expect_on_complete().times(2).returning(|_| ());
        observer.expect_on_fail().never();

        generator()
            .with_observer(Arc::new(observer))
            .generate(&spans(), dir.path().join("out"), CaptionFormat::Srt)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unwritable_destination_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "a file, not a directory").unwrap();

        let err = generator()
            .generate(&spans(), blocker.join("out.srt"), CaptionFormat::Srt)
            .await
            .unwrap_err();

        match err {
            SubgenixError::Io { path, .. } => assert!(path.starts_with(&blocker)),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_segmentation_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let generator = generator().with_cache(CueCache::new(dir.path().join("cache")));

        let first = generator.build_cues(&spans()).await.unwrap();
        let cache = CueCache::new(dir.path().join("cache"));
        assert_eq!(cache.list().await.unwrap().len(), 1);

        let second = generator.build_cues(&spans()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_is_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.cache.enabled = true;
        config.cache.directory = dir.path().join("cache");

        let generator = SubtitleGenerator::new(config).unwrap();
        generator.build_cues(&spans()).await.unwrap();
        assert!(!dir.path().join("cache").exists());
    }

    #[tokio::test]
    async fn test_generate_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("words.json");
        std::fs::write(
            &input,
            r#"[[0.0, 7.0, "Supercalifragilisticexpialidocious"]]"#,
        )
        .unwrap();

        let path = generator()
            .generate_from_file(&input, dir.path().join("long"), CaptionFormat::Srt)
            .await
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            content,
            "1\n00:00:00,000 --> 00:00:07,000\nSupercalifragilisticexpialidocious\n\n"
        );
    }
}
