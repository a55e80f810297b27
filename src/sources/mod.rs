//! Source list handling
//!
//! A source is the base URL of one monitored `Trace.axd` endpoint. Sources are
//! read from a newline-delimited file and normalized before the monitor starts;
//! any invalid line is fatal.

mod normalize;

pub use normalize::{normalize_source, TRACE_ENDPOINT};

use crate::{SourceError, SourceResult};
use std::path::Path;
use url::Url;

/// Loads and normalizes the source list at `path`
///
/// Blank lines and lines starting with `#` are ignored.
///
/// # Returns
///
/// * `Ok(Vec<Url>)` - Normalized sources in file order
/// * `Err(SourceError::Io)` - The file could not be read
/// * `Err(SourceError::Empty)` - The file holds no sources
/// * `Err(SourceError::InvalidSourceUrl)` - A line is not a Trace.axd URL
pub fn load_sources(path: &Path) -> SourceResult<Vec<Url>> {
    let content = std::fs::read_to_string(path)?;
    parse_sources(&content)
}

/// Normalizes every source line of an already-read list
pub fn parse_sources(content: &str) -> SourceResult<Vec<Url>> {
    let mut sources = Vec::new();

    for line in content.lines() {
        let line = line.trim().trim_start_matches('\u{feff}').trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        sources.push(normalize_source(line)?);
    }

    if sources.is_empty() {
        return Err(SourceError::Empty);
    }

    tracing::debug!("Loaded {} sources", sources.len());
    Ok(sources)
}
