//! Artifact store trait and error types

use crate::extract::FullEntry;
use crate::monitor::Watermark;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Persistence for batches and the watermark
///
/// Implementations must be usable from the poll loop while worker tasks run,
/// hence `Send + Sync`.
pub trait ArtifactStore: Send + Sync {
    /// Writes a batch of entries under `name`, returning the written path
    fn write_batch(&self, name: &str, entries: &[FullEntry]) -> OutputResult<PathBuf>;

    /// Persists the watermark, replacing the previous one
    fn write_watermark(&self, watermark: &Watermark) -> OutputResult<()>;

    /// Reads the persisted watermark, if any
    fn load_watermark(&self) -> OutputResult<Option<Watermark>>;

    /// Moves existing top-level artifacts matching `pattern` out of the way
    ///
    /// Returns the number of files moved.
    fn rotate(&self, pattern: &str) -> OutputResult<usize>;
}
