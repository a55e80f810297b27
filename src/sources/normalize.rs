use crate::{SourceError, SourceResult};
use url::Url;

/// Final path segment every monitored source must point at
pub const TRACE_ENDPOINT: &str = "Trace.axd";

/// Normalizes one line of the source list into a monitor base URL
///
/// # Normalization Steps
///
/// 1. Trim whitespace and a leading byte-order mark
/// 2. Default to `https://` when no scheme is given
/// 3. Parse; reject non-HTTP(S) schemes and URLs without a host
/// 4. Drop a trailing slash, then require the final path segment to be `Trace.axd` (any case)
/// 5. Drop credentials, query and fragment
///
/// The port is kept so endpoints on non-default ports stay reachable.
///
/// # Examples
///
/// ```
/// use trace_watch::sources::normalize_source;
///
/// let url = normalize_source("example.com/Trace.axd").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/Trace.axd");
///
/// assert!(normalize_source("example.com/Other.axd").is_err());
/// ```
pub fn normalize_source(line: &str) -> SourceResult<Url> {
    let trimmed = line.trim().trim_start_matches('\u{feff}').trim();

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&candidate).map_err(|e| invalid(line, e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(
            line,
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid(line, "missing host".to_string()));
    }

    // "Trace.axd/" names the same endpoint
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty();
    }

    let points_at_trace = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .is_some_and(|last| last.eq_ignore_ascii_case(TRACE_ENDPOINT));

    if !points_at_trace {
        return Err(invalid(
            line,
            format!("path must end with {}", TRACE_ENDPOINT),
        ));
    }

    // Both setters only fail for cannot-be-a-base URLs, excluded above
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

fn invalid(line: &str, reason: String) -> SourceError {
    SourceError::InvalidSourceUrl {
        line: line.trim().to_string(),
        reason,
    }
}
