use crate::config::types::{Config, HttpConfig, MonitorConfig, OutputConfig};
use crate::ConfigError;

/// Upper bound on the detail worker pool
const MAX_WORKERS: usize = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_monitor_config(&config.monitor)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates polling configuration
fn validate_monitor_config(config: &MonitorConfig) -> Result<(), ConfigError> {
    if config.interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "interval must be >= 1 second, got {}",
            config.interval_secs
        )));
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "keywords cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout must be >= 1 second, got {}",
            config.timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    for header in &config.headers {
        parse_header(header)?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.cache_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "cache-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Splits a `Name:Value` header specification
///
/// The value may itself contain colons; only the first one separates.
///
/// # Examples
///
/// ```
/// use trace_watch::config::parse_header;
///
/// let (name, value) = parse_header("Authorization: Bearer a:b").unwrap();
/// assert_eq!(name, "Authorization");
/// assert_eq!(value, "Bearer a:b");
/// ```
pub fn parse_header(spec: &str) -> Result<(String, String), ConfigError> {
    let (name, value) = spec
        .split_once(':')
        .ok_or_else(|| ConfigError::InvalidHeader(spec.to_string()))?;

    let name = name.trim();
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::InvalidHeader(spec.to_string()));
    }

    Ok((name.to_string(), value.trim().to_string()))
}
