//! Monitor module for incremental Trace.axd polling
//!
//! This module contains the core polling logic, including:
//! - HTTP fetching of index and detail pages
//! - Concurrent listing of every source
//! - Watermark tracking and delta range planning
//! - The bounded detail worker pool
//! - The poll loop and its tick scheduling

mod clock;
mod fetcher;
mod keywords;
mod lister;
mod poller;
mod pool;
mod watermark;

pub use clock::{CountedTicker, IntervalTicker, Ticker};
pub use fetcher::{build_http_client, fetch_body};
pub use keywords::{HitLocation, KeywordHit, KeywordScanner};
pub use lister::{EntryLister, Listing};
pub use poller::{Poller, TickOutcome};
pub use pool::{expand_jobs, Batch, DetailFetcher, Job, DEFAULT_WORKERS, DETAIL_ID_PARAM};
pub use watermark::{latest_entry, Advance, JobRange, Watermark};
