//! Trace-Watch: an incremental Trace.axd request-log monitor
//!
//! This crate polls one or more ASP.NET `Trace.axd` endpoints, detects request
//! entries logged since the previous poll, fetches their detail pages through a
//! bounded worker pool, and persists every batch as a JSON artifact.

pub mod config;
pub mod extract;
pub mod monitor;
pub mod output;
pub mod sources;

use thiserror::Error;

/// Main error type for Trace-Watch operations
#[derive(Debug, Error)]
pub enum TraceWatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source list error: {0}")]
    Source(#[from] SourceError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("HTML extraction error for {url}: {source}")]
    Extract {
        url: String,
        source: extract::ExtractError,
    },

    #[error("No entries found on any monitored source")]
    NoEntriesFound,

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid header '{0}', expected Name:Value")]
    InvalidHeader(String),
}

/// Source list errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read source list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source list is empty")]
    Empty,

    #[error("Invalid source URL '{line}': {reason}")]
    InvalidSourceUrl { line: String, reason: String },
}

/// Result type alias for Trace-Watch operations
pub type Result<T> = std::result::Result<T, TraceWatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for source list operations
pub type SourceResult<T> = std::result::Result<T, SourceError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{FullEntry, StartEntry};
pub use monitor::{JobRange, Watermark};
pub use sources::{load_sources, normalize_source};
