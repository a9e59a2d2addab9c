//! O(1)-amortized trailing-window aggregates keyed by timestamp.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Which extreme a [`MonotonicWindow`] tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Max,
    Min,
}

/// Trailing max or min over a time window (monotonic deque).
///
/// The deque holds candidates in arrival order with values strictly
/// decreasing (max) or increasing (min) from front to back; the front is the
/// current extreme.
#[derive(Debug, Clone)]
pub struct MonotonicWindow {
    window: Duration,
    kind: Extremum,
    deque: VecDeque<(DateTime<Utc>, f64)>,
}

impl MonotonicWindow {
    pub fn new(window: Duration, kind: Extremum) -> Self {
        Self {
            window,
            kind,
            deque: VecDeque::new(),
        }
    }

    pub fn max(window: Duration) -> Self {
        Self::new(window, Extremum::Max)
    }

    pub fn min(window: Duration) -> Self {
        Self::new(window, Extremum::Min)
    }

    /// Add a sample and return the extreme over `[t - window, t]`.
    ///
    /// `t` must not precede the previous sample's timestamp.
    pub fn push(&mut self, t: DateTime<Utc>, value: f64) -> f64 {
        while let Some(&(_, back)) = self.deque.back() {
            let dominated = match self.kind {
                Extremum::Max => back <= value,
                Extremum::Min => back >= value,
            };
            if !dominated {
                break;
            }
            self.deque.pop_back();
        }
        self.deque.push_back((t, value));

        let cutoff = window_start(t, self.window);
        while let Some(&(ts, _)) = self.deque.front() {
            if ts >= cutoff {
                break;
            }
            self.deque.pop_front();
        }

        // The sample just pushed is never evicted, so the deque is non-empty.
        self.deque.front().map_or(value, |&(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.deque.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }
}

/// Oldest timestamp still inside a window ending at `t`. Saturates at the
/// start of the representable range instead of overflowing.
fn window_start(t: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    t.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Running sum / sum-of-squares over a time window.
///
/// Values are accumulated relative to a shift (the first sample of the
/// current run) to keep cancellation small at realistic price levels. When
/// the window collapses to a single sample the sums are rebuilt from scratch,
/// which also clears drift from repeated add/subtract.
#[derive(Debug, Clone)]
pub struct RollingMoments {
    window: Duration,
    samples: VecDeque<(DateTime<Utc>, f64)>,
    shift: f64,
    sum: f64,
    sum_sq: f64,
}

impl RollingMoments {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
            shift: 0.0,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    /// Add a sample, evict expired ones, and return the sample stdev of the
    /// window (0.0 with fewer than two samples).
    pub fn push(&mut self, t: DateTime<Utc>, value: f64) -> f64 {
        if self.samples.is_empty() {
            self.shift = value;
        }
        let d = value - self.shift;
        self.samples.push_back((t, value));
        self.sum += d;
        self.sum_sq += d * d;

        let cutoff = window_start(t, self.window);
        while let Some(&(ts, old)) = self.samples.front() {
            if ts >= cutoff {
                break;
            }
            let d = old - self.shift;
            self.sum -= d;
            self.sum_sq -= d * d;
            self.samples.pop_front();
        }

        if self.samples.len() == 1 {
            self.shift = value;
            self.sum = 0.0;
            self.sum_sq = 0.0;
        }

        self.stdev()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample standard deviation (n - 1 denominator).
    pub fn stdev(&self) -> f64 {
        let n = self.samples.len();
        if n < 2 {
            return 0.0;
        }
        let n = n as f64;
        let var = (self.sum_sq - self.sum * self.sum / n) / (n - 1.0);
        var.max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    #[test]
    fn max_evicts_by_time_not_count() {
        let mut w = MonotonicWindow::max(Duration::seconds(60));
        assert_eq!(w.push(t(0), 105.0), 105.0);
        assert_eq!(w.push(t(10_000), 101.0), 105.0);
        assert_eq!(w.push(t(60_000), 100.0), 105.0, "t-60s is inside the window");
        assert_eq!(w.push(t(60_001), 99.0), 101.0, "105 at t=0 expired");
        assert_eq!(w.push(t(70_001), 98.0), 100.0);
    }

    #[test]
    fn min_tracks_new_lows() {
        let mut w = MonotonicWindow::min(Duration::seconds(60));
        assert_eq!(w.push(t(0), 100.0), 100.0);
        assert_eq!(w.push(t(1_000), 99.0), 99.0);
        assert_eq!(w.push(t(2_000), 101.0), 99.0);
        assert_eq!(w.push(t(61_500), 102.0), 101.0);
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn deque_stays_monotone() {
        let mut w = MonotonicWindow::max(Duration::seconds(60));
        for (i, p) in [1.0, 2.0, 3.0, 4.0].iter().enumerate() {
            w.push(t(i as i64), *p);
        }
        // Each new high dominates everything before it.
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn stdev_needs_two_samples() {
        let mut m = RollingMoments::new(Duration::seconds(1));
        assert_eq!(m.push(t(0), 100.0), 0.0);
        let s = m.push(t(500), 102.0);
        // sample stdev of {100, 102} = sqrt(2)
        assert!((s - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn stdev_window_slides() {
        let mut m = RollingMoments::new(Duration::seconds(1));
        m.push(t(0), 100.0);
        m.push(t(500), 110.0);
        // t=0 and t=500 are both within [t(1000) - 1s, t(1000)]
        let s = m.push(t(1_000), 120.0);
        assert!((s - 10.0).abs() < 1e-9);
        assert_eq!(m.len(), 3);
        // t=0 drops out; {110, 120, 120}
        let s = m.push(t(1_001), 120.0);
        assert_eq!(m.len(), 3);
        let expected = (100.0_f64 / 3.0).sqrt();
        assert!((s - expected).abs() < 1e-9);
    }

    #[test]
    fn stdev_resets_after_gap() {
        let mut m = RollingMoments::new(Duration::seconds(1));
        m.push(t(0), 100.0);
        m.push(t(100), 130.0);
        assert_eq!(m.push(t(5_000), 90.0), 0.0);
        assert_eq!(m.len(), 1);
        assert_eq!(m.push(t(5_400), 92.0), 2.0_f64.sqrt());
    }

    #[test]
    fn window_longer_than_calendar_keeps_everything() {
        let huge = Duration::try_days(365 * 1_000_000).unwrap();
        let mut hi = MonotonicWindow::max(huge);
        let mut m = RollingMoments::new(huge);
        assert_eq!(hi.push(t(0), 101.0), 101.0);
        assert_eq!(hi.push(t(1_000), 100.0), 101.0);
        m.push(t(0), 100.0);
        assert!((m.push(t(1_000), 102.0) - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn constant_prices_have_zero_stdev() {
        let mut m = RollingMoments::new(Duration::seconds(1));
        for i in 0..50 {
            assert_eq!(m.push(t(i * 10), 100.03), 0.0);
        }
    }
}
