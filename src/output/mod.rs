//! Output module for persisting monitor artifacts
//!
//! This module handles:
//! - Writing fetched batches as pretty-printed JSON
//! - Persisting the watermark between ticks
//! - Rotating artifacts of a previous run into a cache directory

mod json;
mod rotate;
mod traits;

pub use json::JsonArtifactStore;
pub use rotate::{matches_pattern, rotate_files};
pub use traits::{ArtifactStore, OutputError, OutputResult};

use crate::monitor::JobRange;
use chrono::{DateTime, Utc};

/// File holding the persisted watermark
pub const WATERMARK_FILE: &str = "laststart.json";

/// Pattern of the artifacts rotated before a bootstrap run
pub const ARTIFACT_PATTERN: &str = "*.json";

/// Name of the batch written by the bootstrap pass
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use trace_watch::output::bootstrap_batch_name;
///
/// let at = Utc.timestamp_opt(1_760_000_000, 0).unwrap();
/// assert_eq!(bootstrap_batch_name(at), "log_update_1760000000.json");
/// ```
pub fn bootstrap_batch_name(at: DateTime<Utc>) -> String {
    format!("log_update_{}.json", at.timestamp())
}

/// Name of the batch covering `range`, i.e. ids `since + 1` through `until`
///
/// # Examples
///
/// ```
/// use trace_watch::monitor::JobRange;
/// use trace_watch::output::range_batch_name;
///
/// assert_eq!(range_batch_name(JobRange::new(3, 7)), "log_update_4_7.json");
/// ```
pub fn range_batch_name(range: JobRange) -> String {
    format!("log_update_{}_{}.json", range.since + 1, range.until)
}
