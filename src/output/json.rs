//! JSON file artifact store

use crate::config::OutputConfig;
use crate::extract::FullEntry;
use crate::monitor::Watermark;
use crate::output::rotate::rotate_files;
use crate::output::traits::{ArtifactStore, OutputResult};
use crate::output::WATERMARK_FILE;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Stores artifacts as indented JSON files in one directory
#[derive(Debug, Clone)]
pub struct JsonArtifactStore {
    root: PathBuf,
    cache_dir: PathBuf,
}

impl JsonArtifactStore {
    /// Creates a store writing into `root`, rotating into `root/cache_dir`
    pub fn new(root: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(&config.directory, &config.cache_dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serializes `value` and swaps it into place under `name`
    ///
    /// The data is written to a temporary sibling first, so a crash never
    /// leaves a truncated artifact behind.
    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> OutputResult<PathBuf> {
        fs::create_dir_all(&self.root)?;

        let json = serde_json::to_string_pretty(value)?;
        let path = self.root.join(name);
        let staging = self.root.join(format!("{}.tmp", name));

        fs::write(&staging, json)?;
        fs::rename(&staging, &path)?;
        Ok(path)
    }
}

impl ArtifactStore for JsonArtifactStore {
    fn write_batch(&self, name: &str, entries: &[FullEntry]) -> OutputResult<PathBuf> {
        self.write_json(name, entries)
    }

    fn write_watermark(&self, watermark: &Watermark) -> OutputResult<()> {
        self.write_json(WATERMARK_FILE, watermark)?;
        Ok(())
    }

    fn load_watermark(&self) -> OutputResult<Option<Watermark>> {
        let content = match fs::read_to_string(self.root.join(WATERMARK_FILE)) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn rotate(&self, pattern: &str) -> OutputResult<usize> {
        Ok(rotate_files(&self.root, pattern, &self.cache_dir)?)
    }
}
