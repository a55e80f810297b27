//! Tick scheduling for the poll loop

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Source of poll ticks
#[async_trait]
pub trait Ticker: Send {
    /// Waits for the next tick
    ///
    /// Returns false once the schedule is exhausted. Interval tickers never are.
    async fn tick(&mut self) -> bool;
}

/// Fixed-period ticker backed by a tokio interval
///
/// The first tick fires one full period after creation, because the bootstrap
/// pass runs immediately before the loop starts.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        // A tick delayed by a slow poll pushes later ticks back instead of bursting
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticker that fires immediately a fixed number of times
#[derive(Debug, Clone, Copy)]
pub struct CountedTicker {
    remaining: usize,
}

impl CountedTicker {
    pub fn new(ticks: usize) -> Self {
        Self { remaining: ticks }
    }
}

#[async_trait]
impl Ticker for CountedTicker {
    async fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}
