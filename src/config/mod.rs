//! Configuration module for Trace-Watch
//!
//! Settings come from an optional TOML file; every field has a default so the
//! monitor can also run from command-line flags alone.
//!
//! # Example
//!
//! ```no_run
//! use trace_watch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("trace-watch.toml")).unwrap();
//! println!("Polling every {}s", config.monitor.interval_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, HttpConfig, MonitorConfig, OutputConfig};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::{parse_header, validate};
