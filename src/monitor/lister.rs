//! Entry lister
//!
//! Queries the index page of every source concurrently and merges the summary
//! rows into a single listing.

use crate::extract::{EntryExtractor, StartEntry};
use crate::monitor::fetcher::fetch_body;
use crate::TraceWatchError;
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// Merged summary rows of one listing pass
#[derive(Debug, Default)]
pub struct Listing {
    /// Entries of every source that answered, in no particular order
    pub entries: Vec<StartEntry>,

    /// Number of sources that were listed successfully
    pub sources_ok: usize,

    /// Number of sources that failed and contributed nothing
    pub sources_failed: usize,
}

/// Lists the current entries of all sources
#[derive(Clone)]
pub struct EntryLister {
    client: Client,
    extractor: Arc<dyn EntryExtractor>,
}

impl EntryLister {
    pub fn new(client: Client, extractor: Arc<dyn EntryExtractor>) -> Self {
        Self { client, extractor }
    }

    /// Fetches every source's index page, one task per source
    ///
    /// A source that fails (network, status, timeout) is logged and skipped;
    /// it never aborts the other sources.
    pub async fn list(&self, sources: &[Url]) -> Listing {
        let mut tasks = JoinSet::new();

        for source in sources {
            let client = self.client.clone();
            let extractor = Arc::clone(&self.extractor);
            let source = source.clone();

            tasks.spawn(async move {
                let result = list_source(&client, extractor.as_ref(), &source).await;
                (source, result)
            });
        }

        let mut listing = Listing::default();

        // Per-source results are merged here, after each task has finished
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((source, Ok(entries))) => {
                    tracing::debug!("Listed {} entries from {}", entries.len(), source);
                    listing.sources_ok += 1;
                    listing.entries.extend(entries);
                }
                Ok((source, Err(e))) => {
                    tracing::warn!("Failed to list {}: {}", source, e);
                    listing.sources_failed += 1;
                }
                Err(e) => {
                    tracing::error!("Listing task failed: {}", e);
                    listing.sources_failed += 1;
                }
            }
        }

        listing
    }
}

async fn list_source(
    client: &Client,
    extractor: &dyn EntryExtractor,
    source: &Url,
) -> Result<Vec<StartEntry>, TraceWatchError> {
    let body = fetch_body(client, source.as_str()).await?;
    Ok(extractor.start_entries(&body))
}
