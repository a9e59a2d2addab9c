//! Event-driven simulation over the shared price stream.

use super::config::SimConfig;
use super::state::{EventState, Position};
use crate::band::Thresholds;
use crate::data::{BookSeries, PostSeries};
use crate::domain::{PostEvent, Trade};
use crate::metrics::{compute_book_metrics, BookMetrics};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a single post event resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventOutcome {
    /// Arm time falls after the last book update.
    NotArmed,
    /// Armed, but neither stop was crossed before the stream ended.
    NoEntry,
    /// Entered, but the stream ended before any exit fired. No trade is
    /// recorded for these.
    OpenAtEnd(Position),
    Closed(Trade),
}

impl EventOutcome {
    pub fn trade(&self) -> Option<&Trade> {
        match self {
            EventOutcome::Closed(trade) => Some(trade),
            _ => None,
        }
    }
}

/// Counters over all simulated events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    pub events: usize,
    pub armed: usize,
    pub entered: usize,
    pub closed: usize,
    pub skipped_no_arm: usize,
    pub dropped_no_entry: usize,
    pub dropped_open_at_end: usize,
}

impl SimStats {
    fn record(&mut self, outcome: &EventOutcome) {
        self.events += 1;
        match outcome {
            EventOutcome::NotArmed => self.skipped_no_arm += 1,
            EventOutcome::NoEntry => {
                self.armed += 1;
                self.dropped_no_entry += 1;
            }
            EventOutcome::OpenAtEnd(_) => {
                self.armed += 1;
                self.entered += 1;
                self.dropped_open_at_end += 1;
            }
            EventOutcome::Closed(_) => {
                self.armed += 1;
                self.entered += 1;
                self.closed += 1;
            }
        }
    }
}

/// Trades (ascending post time) plus the counters that explain them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationReport {
    pub trades: Vec<Trade>,
    pub stats: SimStats,
}

impl SimulationReport {
    fn from_outcomes(outcomes: Vec<EventOutcome>) -> Self {
        let mut stats = SimStats::default();
        let mut trades = Vec::new();
        for outcome in outcomes {
            stats.record(&outcome);
            if let EventOutcome::Closed(trade) = outcome {
                trades.push(trade);
            }
        }
        Self { trades, stats }
    }
}

/// Read-only view of the price stream with its precomputed metrics.
///
/// Metrics are computed once at construction; every event then reads the
/// same slices.
pub struct Simulator<'a> {
    book: &'a BookSeries,
    metrics: Vec<BookMetrics>,
    config: &'a SimConfig,
}

impl<'a> Simulator<'a> {
    pub fn new(book: &'a BookSeries, config: &'a SimConfig) -> Self {
        let metrics = compute_book_metrics(book, &config.metrics);
        Self {
            book,
            metrics,
            config,
        }
    }

    /// Metrics, index-aligned with the book.
    pub fn metrics(&self) -> &[BookMetrics] {
        &self.metrics
    }

    /// Stop levels an event arming at book index `idx` would use.
    pub fn thresholds_at(&self, idx: usize) -> Thresholds {
        let m = &self.metrics[idx];
        let x_bp = self.config.band.width_bp(m.rolling_stdev_bp);
        Thresholds::from_baseline(m.baseline_high, m.baseline_low, x_bp)
    }

    /// Run one event to completion.
    pub fn run_event(&self, post: &PostEvent) -> EventOutcome {
        let Some(arm_time) = post.timestamp.checked_add_signed(self.config.latency) else {
            debug!(post_time = %post.timestamp, "arm time out of range, skipping");
            return EventOutcome::NotArmed;
        };
        let Some(arm_idx) = self.book.first_at_or_after(arm_time) else {
            debug!(post_time = %post.timestamp, %arm_time, "arm time past end of book, skipping");
            return EventOutcome::NotArmed;
        };

        let mut state = EventState::Idle.arm(post.timestamp, self.thresholds_at(arm_idx));
        for update in &self.book.as_slice()[arm_idx..] {
            state = state.step(update, self.config);
            if let EventState::Closed(trade) = state {
                return EventOutcome::Closed(trade);
            }
        }

        match state {
            EventState::Open(pos) => {
                debug!(
                    post_time = %post.timestamp,
                    side = %pos.side,
                    entry_time = %pos.entry_time,
                    "book ended with position open, dropping"
                );
                EventOutcome::OpenAtEnd(pos)
            }
            EventState::Closed(trade) => EventOutcome::Closed(trade),
            EventState::Idle | EventState::Armed { .. } => EventOutcome::NoEntry,
        }
    }

    /// Zero or one trade for a single event.
    pub fn simulate_event(&self, post: &PostEvent) -> Option<Trade> {
        self.run_event(post).trade().copied()
    }

    /// Simulate every event in parallel. Output order is post order,
    /// independent of scheduling.
    pub fn simulate_with_stats(&self, posts: &PostSeries) -> SimulationReport {
        let outcomes: Vec<EventOutcome> = posts
            .as_slice()
            .par_iter()
            .map(|post| self.run_event(post))
            .collect();
        SimulationReport::from_outcomes(outcomes)
    }

    pub fn simulate_all(&self, posts: &PostSeries) -> Vec<Trade> {
        self.simulate_with_stats(posts).trades
    }

    /// Single-threaded equivalent of [`Simulator::simulate_with_stats`].
    pub fn simulate_sequential(&self, posts: &PostSeries) -> SimulationReport {
        let outcomes = posts.iter().map(|post| self.run_event(post)).collect();
        SimulationReport::from_outcomes(outcomes)
    }
}
