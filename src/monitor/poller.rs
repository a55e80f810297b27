//! Poll loop orchestration
//!
//! This module ties the pieces of one tick together:
//! - Listing entries of every source
//! - Comparing the newest entry with the watermark
//! - Fetching the delta range through the worker pool
//! - Persisting the batch, then advancing the watermark
//!
//! The watermark is passed into and out of every tick; the poller itself holds
//! no mutable state.

use crate::config::Config;
use crate::extract::{EntryExtractor, FullEntry, StartEntry, TraceAxdExtractor};
use crate::monitor::clock::Ticker;
use crate::monitor::fetcher::build_http_client;
use crate::monitor::keywords::KeywordScanner;
use crate::monitor::lister::EntryLister;
use crate::monitor::pool::DetailFetcher;
use crate::monitor::watermark::{latest_entry, Advance, JobRange, Watermark};
use crate::output::{bootstrap_batch_name, range_batch_name, ArtifactStore, ARTIFACT_PATTERN};
use crate::TraceWatchError;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No source returned any entry
    NoEntries,

    /// Nothing newer than the watermark was listed
    Unchanged { current: u64 },

    /// The range was fetched and persisted, and the watermark moved
    Advanced {
        range: JobRange,
        fetched: usize,
        failed: usize,
        artifact: PathBuf,
    },

    /// The range was fetched but the batch could not be written; the
    /// watermark stays put so the next tick fetches the range again
    PersistFailed { range: JobRange },
}

/// Drives listing, watermark tracking, detail fetching and persistence
pub struct Poller<S: ArtifactStore> {
    sources: Vec<Url>,
    lister: EntryLister,
    fetcher: DetailFetcher,
    store: S,
    scanner: KeywordScanner,
    resume: bool,
    verbose: bool,
}

impl<S: ArtifactStore> Poller<S> {
    /// Creates a poller from already-built components
    pub fn new(
        sources: Vec<Url>,
        lister: EntryLister,
        fetcher: DetailFetcher,
        store: S,
        scanner: KeywordScanner,
    ) -> Self {
        Self {
            sources,
            lister,
            fetcher,
            store,
            scanner,
            resume: false,
            verbose: false,
        }
    }

    /// Creates a poller with the stock Trace.axd extractor and one shared client
    pub fn from_config(
        config: &Config,
        sources: Vec<Url>,
        store: S,
    ) -> Result<Self, TraceWatchError> {
        let client = build_http_client(&config.http)?;
        let extractor: Arc<dyn EntryExtractor> = Arc::new(TraceAxdExtractor);

        let lister = EntryLister::new(client.clone(), Arc::clone(&extractor));
        let fetcher = DetailFetcher::new(client, extractor, config.monitor.workers);
        let scanner = KeywordScanner::new(&config.monitor.keywords);

        Ok(Self::new(sources, lister, fetcher, store, scanner)
            .with_resume(config.monitor.resume)
            .with_verbose(config.monitor.verbose))
    }

    /// Starts the bootstrap from the persisted watermark instead of zero
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Reports ticks without new entries at info level
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn sources(&self) -> &[Url] {
        &self.sources
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the bootstrap pass, then one tick per `ticker` tick
    ///
    /// Only the bootstrap can fail; once ticking, every error is logged and
    /// the loop continues until the ticker is exhausted.
    pub async fn run<T: Ticker>(&self, mut ticker: T) -> Result<Watermark, TraceWatchError> {
        let mut watermark = self.bootstrap().await?;

        while ticker.tick().await {
            let (next, outcome) = self.tick(watermark).await;
            tracing::trace!("Tick finished: {:?}", outcome);
            watermark = next;
        }

        Ok(watermark)
    }

    /// Initial unconditional pass
    ///
    /// 1. Read the persisted watermark (resume mode only)
    /// 2. Rotate artifacts of the previous run into the cache directory
    /// 3. List all sources; an empty listing is fatal here
    /// 4. Fetch and persist `(start, newest]`, then persist the watermark
    pub async fn bootstrap(&self) -> Result<Watermark, TraceWatchError> {
        let start = if self.resume {
            self.persisted_watermark()
        } else {
            Watermark::default()
        };

        match self.store.rotate(ARTIFACT_PATTERN) {
            Ok(0) => {}
            Ok(moved) => tracing::info!("Rotated {} previous artifacts", moved),
            Err(e) => tracing::warn!("Failed to rotate previous artifacts: {}", e),
        }

        let mut listing = self.lister.list(&self.sources).await;
        let newest = latest_entry(&mut listing.entries)?;
        tracing::info!(
            "Bootstrap listed {} entries from {} sources, newest id {}",
            listing.entries.len(),
            listing.sources_ok,
            newest.id
        );

        let watermark = match start.plan(newest) {
            Advance::Unchanged => {
                tracing::info!("No entries newer than persisted watermark {}", start.id);
                start
            }
            Advance::Fetch { range, candidate } => {
                let name = bootstrap_batch_name(Utc::now());
                self.fetch_and_persist(start, range, candidate, name).await.0
            }
        };

        if let Err(e) = self.store.write_watermark(&watermark) {
            tracing::error!("Failed to persist watermark {}: {}", watermark.id, e);
        }

        Ok(watermark)
    }

    /// One poll cycle against the given watermark
    ///
    /// Returns the watermark to use for the next tick together with what
    /// happened. The returned watermark is never lower than the input.
    pub async fn tick(&self, watermark: Watermark) -> (Watermark, TickOutcome) {
        let mut listing = self.lister.list(&self.sources).await;

        let newest = match latest_entry(&mut listing.entries) {
            Ok(newest) => newest,
            Err(_) => {
                tracing::warn!(
                    "No entries listed ({} of {} sources failed), skipping tick",
                    listing.sources_failed,
                    self.sources.len()
                );
                return (watermark, TickOutcome::NoEntries);
            }
        };

        match watermark.plan(newest) {
            Advance::Unchanged => {
                if self.verbose {
                    tracing::info!("No new entries (watermark {})", watermark.id);
                } else {
                    tracing::debug!("No new entries (watermark {})", watermark.id);
                }
                (
                    watermark,
                    TickOutcome::Unchanged {
                        current: watermark.id,
                    },
                )
            }
            Advance::Fetch { range, candidate } => {
                let name = range_batch_name(range);
                let (watermark, outcome) = self
                    .fetch_and_persist(watermark, range, candidate, name)
                    .await;
                if matches!(outcome, TickOutcome::Advanced { .. }) {
                    if let Err(e) = self.store.write_watermark(&watermark) {
                        tracing::error!("Failed to persist watermark {}: {}", watermark.id, e);
                    }
                }
                (watermark, outcome)
            }
        }
    }

    /// Fetches `range`, writes the batch and advances the watermark
    ///
    /// The watermark only moves once the batch is on disk.
    async fn fetch_and_persist(
        &self,
        mut watermark: Watermark,
        range: JobRange,
        candidate: StartEntry,
        name: String,
    ) -> (Watermark, TickOutcome) {
        tracing::info!(
            "Fetching ids {}..={} from {} sources",
            range.since + 1,
            range.until,
            self.sources.len()
        );

        let batch = self.fetcher.fetch(&self.sources, range).await;
        self.report_keywords(&batch.entries);

        let artifact = match self.store.write_batch(&name, &batch.entries) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("Failed to write {}: {}", name, e);
                return (watermark, TickOutcome::PersistFailed { range });
            }
        };

        watermark.advance(candidate);
        tracing::info!(
            "Saved {} new entries to {} ({} failed)",
            batch.entries.len(),
            artifact.display(),
            batch.failed()
        );

        let outcome = TickOutcome::Advanced {
            range,
            fetched: batch.entries.len(),
            failed: batch.failed(),
            artifact,
        };
        (watermark, outcome)
    }

    fn persisted_watermark(&self) -> Watermark {
        match self.store.load_watermark() {
            Ok(Some(watermark)) => {
                tracing::info!("Resuming from watermark {}", watermark.id);
                watermark
            }
            Ok(None) => Watermark::default(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable watermark: {}", e);
                Watermark::default()
            }
        }
    }

    fn report_keywords(&self, entries: &[FullEntry]) {
        if self.scanner.is_empty() {
            return;
        }
        for entry in entries {
            for hit in self.scanner.scan(entry) {
                tracing::info!(
                    "Keyword '{}' in {} '{}' of id {}",
                    hit.keyword,
                    hit.location,
                    hit.field,
                    hit.id
                );
            }
        }
    }
}
