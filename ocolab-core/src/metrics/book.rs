//! Per-update baseline and volatility metrics for the price stream.

use super::window::{MonotonicWindow, RollingMoments};
use crate::data::BookSeries;
use crate::domain::{BookUpdate, BPS};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Window lengths for the metrics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsParams {
    /// Trailing window for the high/low baseline.
    pub baseline_window: Duration,
    /// Trailing window for the volatility estimate.
    pub vol_window: Duration,
}

impl Default for MetricsParams {
    fn default() -> Self {
        Self {
            baseline_window: Duration::seconds(60),
            vol_window: Duration::seconds(1),
        }
    }
}

/// Metrics derived for one book update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookMetrics {
    pub baseline_high: f64,
    pub baseline_low: f64,
    pub rolling_stdev_bp: f64,
}

/// Streaming engine: feed updates in timestamp order, get metrics back.
#[derive(Debug, Clone)]
pub struct BookMetricsEngine {
    high: MonotonicWindow,
    low: MonotonicWindow,
    moments: RollingMoments,
}

impl BookMetricsEngine {
    pub fn new(params: &MetricsParams) -> Self {
        Self {
            high: MonotonicWindow::max(params.baseline_window),
            low: MonotonicWindow::min(params.baseline_window),
            moments: RollingMoments::new(params.vol_window),
        }
    }

    pub fn update(&mut self, u: &BookUpdate) -> BookMetrics {
        let baseline_high = self.high.push(u.timestamp, u.price);
        let baseline_low = self.low.push(u.timestamp, u.price);
        let stdev = self.moments.push(u.timestamp, u.price);
        BookMetrics {
            baseline_high,
            baseline_low,
            rolling_stdev_bp: stdev / u.price * BPS,
        }
    }
}

/// Compute metrics for every update in one pass. Output is index-aligned
/// with `book`.
pub fn compute_book_metrics(book: &BookSeries, params: &MetricsParams) -> Vec<BookMetrics> {
    let mut engine = BookMetricsEngine::new(params);
    book.as_slice().iter().map(|u| engine.update(u)).collect()
}
