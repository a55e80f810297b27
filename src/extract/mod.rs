//! HTML extraction for Trace.axd pages
//!
//! This module turns raw Trace.axd HTML into typed records:
//! - Summary rows of the index page into [`StartEntry`] values
//! - A single request detail page into a [`FullEntry`]
//!
//! The monitor only talks to it through the [`EntryExtractor`] trait.

mod entries;
mod html;

pub use entries::{parse_full_entry, parse_start_entries, parse_timestamp, TIMESTAMP_FORMAT};
pub use html::{extract_detail_fields, extract_rows, parse_document, DetailFields};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur while extracting records from HTML
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document contains no Trace.axd detail sections")]
    NotADetailPage,
}

/// One summary row of a Trace.axd index page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartEntry {
    /// Identifier assigned by the remote source (one-based)
    pub id: u64,

    /// When the remote request was logged; the zero value if unparsable
    pub timestamp: NaiveDateTime,
}

/// Full detail record of one logged request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullEntry {
    pub id: u64,

    /// Source base URL the entry was fetched from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_time: Option<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace_info: Vec<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cookies: BTreeMap<String, String>,
}

/// The two extraction operations the monitor depends on
pub trait EntryExtractor: Send + Sync {
    /// Lists the summary rows of an index page
    fn start_entries(&self, html: &str) -> Vec<StartEntry>;

    /// Extracts the detail record of a single request page
    ///
    /// The returned entry's `id` is left for the caller to set.
    fn full_entry(&self, html: &str) -> Result<FullEntry, ExtractError>;
}

/// Extractor for the stock ASP.NET trace viewer markup
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceAxdExtractor;

impl EntryExtractor for TraceAxdExtractor {
    fn start_entries(&self, html: &str) -> Vec<StartEntry> {
        parse_start_entries(html)
    }

    fn full_entry(&self, html: &str) -> Result<FullEntry, ExtractError> {
        parse_full_entry(html)
    }
}
