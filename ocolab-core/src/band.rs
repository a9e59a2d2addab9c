//! Breakout band: volatility → band width in bp, and the resulting stop
//! levels around the trailing baseline.

use crate::domain::offset_bp;
use serde::{Deserialize, Serialize};

/// `x_bp = clamp(multiplier * stdev_bp, min_bp, max_bp)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandParams {
    pub multiplier: f64,
    pub min_bp: f64,
    pub max_bp: f64,
}

impl Default for BandParams {
    fn default() -> Self {
        Self {
            multiplier: 0.5,
            min_bp: 2.0,
            max_bp: 8.0,
        }
    }
}

impl BandParams {
    /// Band width for a volatility reading. NaN reads as "no volatility".
    pub fn width_bp(&self, stdev_bp: f64) -> f64 {
        if stdev_bp.is_nan() {
            return self.min_bp;
        }
        (self.multiplier * stdev_bp).max(self.min_bp).min(self.max_bp)
    }
}

/// Band width with the default parameters (0.5x, clamped to [2, 8] bp).
pub fn band_width_bp(stdev_bp: f64) -> f64 {
    BandParams::default().width_bp(stdev_bp)
}

/// Breakout stop levels armed for one event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Buy-stop: `baseline_high * (1 + x_bp / 10_000)`.
    pub long_stop: f64,
    /// Sell-stop: `baseline_low * (1 - x_bp / 10_000)`.
    pub short_stop: f64,
    pub x_bp: f64,
}

impl Thresholds {
    pub fn from_baseline(baseline_high: f64, baseline_low: f64, x_bp: f64) -> Self {
        Self {
            long_stop: offset_bp(baseline_high, x_bp),
            short_stop: offset_bp(baseline_low, -x_bp),
            x_bp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_low_volatility() {
        assert_eq!(band_width_bp(0.0), 2.0);
        assert_eq!(band_width_bp(4.0), 2.0);
    }

    #[test]
    fn clamps_high_volatility() {
        assert_eq!(band_width_bp(16.0), 8.0);
        assert_eq!(band_width_bp(1_000.0), 8.0);
        assert_eq!(band_width_bp(f64::INFINITY), 8.0);
    }

    #[test]
    fn linear_in_between() {
        assert_eq!(band_width_bp(5.0), 2.5);
        assert_eq!(band_width_bp(10.0), 5.0);
        assert_eq!(band_width_bp(15.5), 7.75);
    }

    #[test]
    fn nan_maps_to_floor() {
        assert_eq!(band_width_bp(f64::NAN), 2.0);
    }

    #[test]
    fn thresholds_straddle_baseline() {
        let th = Thresholds::from_baseline(100.0, 99.0, 2.0);
        assert!((th.long_stop - 100.02).abs() < 1e-10);
        assert!((th.short_stop - 98.9802).abs() < 1e-10);
    }

    #[test]
    fn thresholds_are_reproducible() {
        let a = Thresholds::from_baseline(101.37, 100.91, band_width_bp(7.3));
        let b = Thresholds::from_baseline(101.37, 100.91, band_width_bp(7.3));
        assert_eq!(a, b);
    }
}
