use crate::extract::html::{extract_detail_fields, extract_rows, parse_document};
use crate::extract::{ExtractError, FullEntry, StartEntry};
use chrono::NaiveDateTime;

/// Timestamp layout used by the trace viewer (`DD/MM/YYYY HH:MM:SS`)
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Parses a trace viewer timestamp
///
/// # Examples
///
/// ```
/// use trace_watch::extract::parse_timestamp;
///
/// assert!(parse_timestamp("16/10/2026 10:15:30").is_some());
/// assert!(parse_timestamp("2026-10-16").is_none());
/// ```
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT).ok()
}

/// Extracts the summary rows of a Trace.axd index page
///
/// Every row with at least two data cells is considered. The first cell must
/// be a base-10 identifier or the row is skipped; an unparsable timestamp in
/// the second cell falls back to the zero value instead of dropping the row.
pub fn parse_start_entries(html: &str) -> Vec<StartEntry> {
    let document = parse_document(html);

    extract_rows(&document)
        .into_iter()
        .filter_map(|row| match row.as_slice() {
            [id, timestamp, ..] => {
                let id = match id.trim().parse::<u64>() {
                    Ok(id) => id,
                    Err(_) => {
                        tracing::trace!("Skipping row with non-numeric id '{}'", id);
                        return None;
                    }
                };
                let timestamp = parse_timestamp(timestamp).unwrap_or_default();
                Some(StartEntry { id, timestamp })
            }
            _ => None,
        })
        .collect()
}

/// Extracts the detail record of a Trace.axd request page
///
/// # Returns
///
/// * `Ok(FullEntry)` - Entry with every field that was present; `id` is 0
/// * `Err(ExtractError::NotADetailPage)` - No detail section was found
pub fn parse_full_entry(html: &str) -> Result<FullEntry, ExtractError> {
    let document = parse_document(html);
    let fields = extract_detail_fields(&document);

    if fields.is_empty() {
        return Err(ExtractError::NotADetailPage);
    }

    let request_value = |label: &str| {
        fields
            .request
            .get(label)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let url = fields
        .server_variables
        .get("URL")
        .or_else(|| fields.server_variables.get("PATH_INFO"))
        .filter(|path| !path.is_empty())
        .map(|path| match fields.server_variables.get("QUERY_STRING") {
            Some(query) if !query.is_empty() => format!("{}?{}", path, query),
            _ => path.clone(),
        });

    Ok(FullEntry {
        id: 0,
        source: None,
        session_id: request_value("Session Id"),
        method: request_value("Request Type"),
        url,
        status_code: request_value("Status Code").and_then(|code| code.parse().ok()),
        request_time: request_value("Time of Request").and_then(|t| parse_timestamp(&t)),
        trace_info: fields.trace_info,
        headers: fields.headers,
        cookies: fields.cookies,
    })
}
