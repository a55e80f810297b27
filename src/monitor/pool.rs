//! Detail fetcher worker pool
//!
//! This module fetches the detail page of every identifier in a delta range:
//! - The job set is the cartesian product of sources and identifiers
//! - A fixed number of workers consume jobs from one FIFO queue
//! - Successful entries are appended to a mutex-guarded batch
//! - The fetch returns once every worker has drained the queue

use crate::extract::{EntryExtractor, FullEntry};
use crate::monitor::fetcher::fetch_body;
use crate::monitor::watermark::JobRange;
use crate::TraceWatchError;
use reqwest::Client;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use url::Url;

/// Default number of detail workers
pub const DEFAULT_WORKERS: usize = 5;

/// Query parameter selecting a detail page
pub const DETAIL_ID_PARAM: &str = "id";

/// One detail request: a source and a one-based identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub source: Url,
    pub id: u64,
}

impl Job {
    /// Detail page URL for this job
    ///
    /// Detail pages are indexed from zero while listed identifiers start at
    /// one, so identifier `i` is requested as `?id=i-1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use trace_watch::monitor::Job;
    /// use url::Url;
    ///
    /// let job = Job {
    ///     source: Url::parse("https://a.test/Trace.axd").unwrap(),
    ///     id: 4,
    /// };
    /// assert_eq!(job.detail_url().as_str(), "https://a.test/Trace.axd?id=3");
    /// ```
    pub fn detail_url(&self) -> Url {
        let mut url = self.source.clone();
        url.query_pairs_mut()
            .append_pair(DETAIL_ID_PARAM, &self.id.saturating_sub(1).to_string());
        url
    }
}

/// Expands a range into one job per (source, identifier) pair
///
/// Every source contributes the full identifier range, sources in list order.
pub fn expand_jobs(sources: &[Url], range: JobRange) -> impl Iterator<Item = Job> + '_ {
    sources.iter().flat_map(move |source| {
        range.ids().map(move |id| Job {
            source: source.clone(),
            id,
        })
    })
}

/// Result of fetching one delta range
#[derive(Debug, Default)]
pub struct Batch {
    /// Successfully fetched entries, in completion order
    pub entries: Vec<FullEntry>,

    /// Number of jobs handed to the workers
    pub dispatched: usize,
}

impl Batch {
    /// Number of jobs that produced no entry
    pub fn failed(&self) -> usize {
        self.dispatched.saturating_sub(self.entries.len())
    }
}

/// Bounded-concurrency detail fetcher
#[derive(Clone)]
pub struct DetailFetcher {
    client: Client,
    extractor: Arc<dyn EntryExtractor>,
    workers: usize,
}

impl DetailFetcher {
    /// Creates a fetcher with `workers` concurrent workers (at least one)
    pub fn new(client: Client, extractor: Arc<dyn EntryExtractor>, workers: usize) -> Self {
        Self {
            client,
            extractor,
            workers: workers.max(1),
        }
    }

    /// Number of workers in the pool
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fetches the details of every identifier in `range` from every source
    ///
    /// Individual job failures are logged and leave a gap in the batch; they
    /// never fail the call. Returns after every dispatched job was attempted.
    pub async fn fetch(&self, sources: &[Url], range: JobRange) -> Batch {
        let (job_tx, job_rx) = mpsc::channel::<Job>(self.workers * 2);
        let job_rx = Arc::new(tokio::sync::Mutex::new(job_rx));
        let results = Arc::new(Mutex::new(Vec::new()));

        let mut workers = JoinSet::new();
        for worker_id in 0..self.workers {
            workers.spawn(run_worker(
                worker_id,
                self.client.clone(),
                Arc::clone(&self.extractor),
                Arc::clone(&job_rx),
                Arc::clone(&results),
            ));
        }

        let mut dispatched = 0;
        for job in expand_jobs(sources, range) {
            if job_tx.send(job).await.is_err() {
                tracing::error!("All detail workers stopped after {} jobs", dispatched);
                break;
            }
            dispatched += 1;
        }
        // Closing the queue lets idle workers exit
        drop(job_tx);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Detail worker failed: {}", e);
            }
        }

        let entries = std::mem::take(&mut *results.lock().unwrap_or_else(PoisonError::into_inner));

        let batch = Batch {
            entries,
            dispatched,
        };
        tracing::debug!(
            "Fetched {}/{} details for ids {}..={}",
            batch.entries.len(),
            batch.dispatched,
            range.since + 1,
            range.until
        );
        batch
    }
}

async fn run_worker(
    worker_id: usize,
    client: Client,
    extractor: Arc<dyn EntryExtractor>,
    jobs: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    results: Arc<Mutex<Vec<FullEntry>>>,
) {
    loop {
        let next = jobs.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        match fetch_detail(&client, extractor.as_ref(), &job).await {
            Ok(entry) => {
                results
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(entry);
            }
            Err(e) => {
                tracing::warn!("Skipping id {} of {}: {}", job.id, job.source, e);
            }
        }
    }

    tracing::trace!("Detail worker {} finished", worker_id);
}

/// Fetches and parses one detail page, tagging it with the job's identifier
async fn fetch_detail(
    client: &Client,
    extractor: &dyn EntryExtractor,
    job: &Job,
) -> Result<FullEntry, TraceWatchError> {
    let url = job.detail_url();
    let body = fetch_body(client, url.as_str()).await?;

    let mut entry = extractor
        .full_entry(&body)
        .map_err(|source| TraceWatchError::Extract {
            url: url.to_string(),
            source,
        })?;

    entry.id = job.id;
    entry.source = Some(job.source.to_string());
    Ok(entry)
}
