//! On-disk memoization of segmentation results.
//!
//! The cache directory holds a flat `metadata.json` index mapping a key to
//! the file that stores the cue list for that key. Keys hash the word spans
//! together with every tunable that influences segmentation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::SegmentationConfig;
use crate::error::{Result, SubgenixError};
use crate::pipeline::{AtomicFileWriter, CaptionWriter};
use crate::preprocess::CasePolicy;
use crate::transcript::{Cue, WordSpan};

const INDEX_FILE: &str = "metadata.json";
const CUES_KIND: &str = "cues";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub filename: String,
    pub kind: String,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CacheInfo {
    pub entries: u64,
    pub total_size: u64,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
struct CachedCue {
    start: f64,
    end: f64,
    text: String,
}

impl From<&Cue> for CachedCue {
    fn from(cue: &Cue) -> Self {
        Self {
            start: cue.start(),
            end: cue.end(),
            text: cue.text().to_string(),
        }
    }
}

type CacheIndex = HashMap<String, CacheEntry>;

/// Segmentation cache rooted at a directory
pub struct CueCache {
    dir: PathBuf,
}

impl CueCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Build the cache key for a segmentation request.
    ///
    /// SHA-256 over the exact float bits and texts, so keys stay the same
    /// across builds and toolchains. The first 8 bytes are used, in hex.
    pub fn key(spans: &[WordSpan], segmentation: &SegmentationConfig, case: CasePolicy) -> String {
        let mut hasher = Sha256::new();

        for span in spans {
            hasher.update(span.start.to_bits().to_le_bytes());
            hasher.update(span.end.to_bits().to_le_bytes());
            hasher.update((span.text.len() as u64).to_le_bytes());
            hasher.update(span.text.as_bytes());
        }
        hasher.update(segmentation.max_segment_duration.to_bits().to_le_bytes());
        hasher.update(segmentation.max_pause_duration.to_bits().to_le_bytes());
        hasher.update(segmentation.min_cue_duration.to_bits().to_le_bytes());
        hasher.update(case.as_str().as_bytes());

        hasher.finalize()[..8]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// Look up cached cues. A stale index entry whose file is gone is a miss.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<Cue>>> {
        let index = self.load_index().await?;
        let Some(entry) = index.get(key) else {
            return Ok(None);
        };

        let path = self.dir.join(&entry.filename);
        if !path.exists() {
            debug!("Cache entry {} points at missing file {}", key, path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| SubgenixError::io(&path, e))?;
        let cached: Vec<CachedCue> = serde_json::from_str(&content)
            .map_err(|e| SubgenixError::Cache(format!("Corrupt cache file {}: {}", path.display(), e)))?;

        let cues = cached
            .into_iter()
            .map(|c| Cue::new(c.start, c.end, c.text))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| SubgenixError::Cache(format!("Invalid cue in {}: {}", path.display(), e)))?;

        debug!("Cache hit for {} ({} cues)", key, cues.len());
        Ok(Some(cues))
    }

    /// Store cues under a key, replacing any previous entry
    pub async fn put(&self, key: &str, cues: &[Cue]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SubgenixError::io(&self.dir, e))?;

        let filename = format!("{}.json", key);
        let path = self.dir.join(&filename);
        let cached: Vec<CachedCue> = cues.iter().map(CachedCue::from).collect();
        AtomicFileWriter.write(&path, &serde_json::to_string(&cached)?).await?;

        let mut index = match self.load_index().await {
            Ok(index) => index,
            Err(e) => {
                warn!("Replacing unreadable cache index: {}", e);
                CacheIndex::new()
            }
        };
        index.insert(
            key.to_string(),
            CacheEntry {
                filename,
                kind: CUES_KIND.to_string(),
                cached_at: Utc::now(),
            },
        );
        self.save_index(&index).await?;

        debug!("Cached {} cues under {}", cues.len(), key);
        Ok(())
    }

    /// Cached entries, oldest first
    pub async fn list(&self) -> Result<Vec<(String, CacheEntry)>> {
        let mut entries: Vec<_> = self.load_index().await?.into_iter().collect();
        entries.sort_by(|a, b| a.1.cached_at.cmp(&b.1.cached_at).then_with(|| a.0.cmp(&b.0)));
        Ok(entries)
    }

    /// Remove every cached entry and the index; returns how many entries were removed.
    ///
    /// An unreadable index does not stop the clear: every cue file in the
    /// directory is removed instead.
    pub async fn clear(&self) -> Result<u64> {
        let index = match self.load_index().await {
            Ok(index) => index,
            Err(e) => {
                warn!("Cache index unreadable, removing all cache files: {}", e);
                return self.clear_unindexed().await;
            }
        };
        let mut removed = 0;

        for (key, entry) in &index {
            let path = self.dir.join(&entry.filename);
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("Cache file for {} already gone", key);
                }
                Err(e) => return Err(SubgenixError::io(&path, e)),
            }
        }

        self.remove_index_and_dir().await?;

        info!("Removed {} cache entries", removed);
        Ok(removed)
    }

    async fn clear_unindexed(&self) -> Result<u64> {
        let mut removed = 0;

        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(SubgenixError::io(&self.dir, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SubgenixError::io(&self.dir, e))?
        {
            let path = entry.path();
            let is_cue_file = path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|name| name != INDEX_FILE);
            let is_leftover = path.extension().is_some_and(|ext| ext == "tmp");

            if is_cue_file || is_leftover {
                fs::remove_file(&path)
                    .await
                    .map_err(|e| SubgenixError::io(&path, e))?;
                if is_cue_file {
                    removed += 1;
                }
            }
        }

        self.remove_index_and_dir().await?;

        info!("Removed {} cache files", removed);
        Ok(removed)
    }

    async fn remove_index_and_dir(&self) -> Result<()> {
        let index_path = self.index_path();
        if index_path.exists() {
            fs::remove_file(&index_path)
                .await
                .map_err(|e| SubgenixError::io(&index_path, e))?;
        }

        if let Err(e) = fs::remove_dir(&self.dir).await {
            debug!("Keeping cache directory {}: {}", self.dir.display(), e);
        }

        Ok(())
    }

    pub async fn info(&self) -> Result<CacheInfo> {
        let index = self.load_index().await?;
        let mut total_size = 0;

        for entry in index.values() {
            match fs::metadata(self.dir.join(&entry.filename)).await {
                Ok(metadata) => total_size += metadata.len(),
                Err(e) => warn!("Cannot stat cache file {}: {}", entry.filename, e),
            }
        }

        Ok(CacheInfo {
            entries: index.len() as u64,
            total_size,
            oldest_entry: index.values().map(|e| e.cached_at).min(),
            newest_entry: index.values().map(|e| e.cached_at).max(),
        })
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    async fn load_index(&self) -> Result<CacheIndex> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(CacheIndex::new());
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| SubgenixError::io(&path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| SubgenixError::Cache(format!("Corrupt cache index {}: {}", path.display(), e)))
    }

    async fn save_index(&self, index: &CacheIndex) -> Result<()> {
        AtomicFileWriter
            .write(&self.index_path(), &serde_json::to_string_pretty(index)?)
            .await
    }
}
