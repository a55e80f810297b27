use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Trace-Watch
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Polling behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between two polls of the index pages
    #[serde(rename = "interval")]
    pub interval_secs: u64,

    /// Number of detail-fetch workers
    pub workers: usize,

    /// Keywords reported when found in fetched entries
    pub keywords: Vec<String>,

    /// Start from the persisted watermark instead of fetching everything
    pub resume: bool,

    /// Report ticks that found nothing new
    pub verbose: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            workers: 5,
            keywords: vec![
                "session".to_string(),
                "auth".to_string(),
                "token".to_string(),
            ],
            resume: false,
            verbose: false,
        }
    }
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Extra request headers in `Name:Value` form
    pub headers: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: format!("trace-watch/{}", env!("CARGO_PKG_VERSION")),
            headers: Vec::new(),
        }
    }
}

/// Artifact output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives batch and watermark files
    pub directory: PathBuf,

    /// Directory, relative to `directory`, where old artifacts are rotated
    #[serde(rename = "cache-dir")]
    pub cache_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            cache_dir: PathBuf::from("cache"),
        }
    }
}
