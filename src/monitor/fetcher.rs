//! HTTP fetcher implementation
//!
//! This module handles all outbound requests of the monitor:
//! - Building the shared HTTP client (timeout, user agent, extra headers)
//! - GET requests for index and detail pages
//! - Error classification

use crate::config::{parse_header, HttpConfig};
use crate::{ConfigError, TraceWatchError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// Every request made through the client carries the configured timeout, so a
/// slow endpoint fails that single request instead of stalling its siblings.
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(TraceWatchError)` - A header was invalid or the client failed to build
///
/// # Example
///
/// ```no_run
/// use trace_watch::config::HttpConfig;
/// use trace_watch::monitor::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, TraceWatchError> {
    let mut headers = HeaderMap::new();

    for spec in &config.headers {
        let (name, value) = parse_header(spec)?;
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::InvalidHeader(spec.clone()))?;
        let value =
            HeaderValue::from_str(&value).map_err(|_| ConfigError::InvalidHeader(spec.clone()))?;
        headers.append(name, value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Fetches a page and returns its body text
///
/// # Returns
///
/// * `Ok(String)` - Body of a 2xx response
/// * `Err(TraceWatchError::Timeout)` - The request exceeded the client timeout
/// * `Err(TraceWatchError::Status)` - The server answered with a non-2xx status
/// * `Err(TraceWatchError::Http)` - Any other transport failure
pub async fn fetch_body(client: &Client, url: &str) -> Result<String, TraceWatchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TraceWatchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| classify_error(url, e))
}

fn classify_error(url: &str, error: reqwest::Error) -> TraceWatchError {
    if error.is_timeout() {
        TraceWatchError::Timeout {
            url: url.to_string(),
        }
    } else {
        TraceWatchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
