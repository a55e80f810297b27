//! Watermark tracking
//!
//! The watermark is the highest identifier confirmed as logged. Each tick picks
//! the largest identifier currently listed and, if it moved past the
//! watermark, plans a fetch of the delta range `(watermark, candidate]`.

use crate::extract::StartEntry;
use crate::TraceWatchError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Highest identifier seen as of the last completed tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    pub id: u64,
    pub timestamp: NaiveDateTime,
}

/// Identifier range `(since, until]` to fetch details for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobRange {
    pub since: u64,
    pub until: u64,
}

/// What a tick has to do after comparing a candidate with the watermark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Nothing newer than the watermark was listed
    Unchanged,

    /// Fetch `range`, then move the watermark to `candidate`
    Fetch {
        range: JobRange,
        candidate: StartEntry,
    },
}

impl From<StartEntry> for Watermark {
    fn from(entry: StartEntry) -> Self {
        Self {
            id: entry.id,
            timestamp: entry.timestamp,
        }
    }
}

impl Watermark {
    /// Compares a candidate entry against this watermark
    pub fn plan(&self, candidate: StartEntry) -> Advance {
        if candidate.id <= self.id {
            Advance::Unchanged
        } else {
            Advance::Fetch {
                range: JobRange::new(self.id, candidate.id),
                candidate,
            }
        }
    }

    /// Moves the watermark to `candidate` if that is an advance
    ///
    /// Returns true if the watermark changed. The watermark never decreases.
    pub fn advance(&mut self, candidate: StartEntry) -> bool {
        if candidate.id > self.id {
            *self = candidate.into();
            true
        } else {
            false
        }
    }
}

impl JobRange {
    pub fn new(since: u64, until: u64) -> Self {
        Self { since, until }
    }

    /// Returns true if the range yields no identifiers
    pub fn is_empty(&self) -> bool {
        self.since >= self.until
    }

    /// Number of identifiers in the range
    pub fn len(&self) -> u64 {
        self.until.saturating_sub(self.since)
    }

    /// Identifiers `since + 1 ..= until`
    pub fn ids(&self) -> RangeInclusive<u64> {
        if self.is_empty() {
            // An inverted range iterates nothing
            return 1..=0;
        }
        self.since + 1..=self.until
    }
}

/// Selects the entry with the highest identifier
///
/// The entries are sorted ascending by identifier in place, so the order in
/// which sources answered never matters.
///
/// # Returns
///
/// * `Ok(StartEntry)` - The entry with the largest identifier
/// * `Err(TraceWatchError::NoEntriesFound)` - `entries` is empty
pub fn latest_entry(entries: &mut [StartEntry]) -> Result<StartEntry, TraceWatchError> {
    entries.sort_by_key(|entry| entry.id);
    entries
        .last()
        .copied()
        .ok_or(TraceWatchError::NoEntriesFound)
}
