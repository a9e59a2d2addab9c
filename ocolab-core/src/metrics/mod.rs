//! Book metrics engine.
//!
//! Single pass over the price stream producing, per update:
//! - `baseline_high` / `baseline_low`: trailing max / min price (default 60s)
//! - `rolling_stdev_bp`: trailing sample stdev of price (default 1s) in bp of
//!   the current price
//!
//! Windows are time-based, not count-based, and hold for irregular spacing.
//! A sample at `s` belongs to the window ending at `t` iff `t - w <= s <= t`.

pub mod book;
pub mod window;

pub use book::{compute_book_metrics, BookMetrics, BookMetricsEngine, MetricsParams};
pub use window::{Extremum, MonotonicWindow, RollingMoments};
