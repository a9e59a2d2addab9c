//! Simulation parameters.

use crate::band::BandParams;
use crate::metrics::MetricsParams;
use chrono::Duration;

/// Everything the simulator needs besides the data.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Delay from post to arm time.
    pub latency: Duration,
    /// Minimum one-way entry slippage in bp (`slip_bp_param`).
    pub slip_bp: f64,
    pub take_profit_bp: f64,
    pub stop_loss_bp: f64,
    /// Time exit fires at `entry_time + max_hold`.
    pub max_hold: Duration,
    pub band: BandParams,
    pub metrics: MetricsParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            latency: Duration::zero(),
            slip_bp: 1.0,
            take_profit_bp: 12.0,
            stop_loss_bp: 6.0,
            max_hold: Duration::seconds(180),
            band: BandParams::default(),
            metrics: MetricsParams::default(),
        }
    }
}

impl SimConfig {
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_slip_bp(mut self, slip_bp: f64) -> Self {
        self.slip_bp = slip_bp;
        self
    }

    /// Entry slippage for an update: half the quoted spread, floored at
    /// `slip_bp`.
    pub fn slippage_bp(&self, spread_bp: f64) -> f64 {
        (0.5 * spread_bp).max(self.slip_bp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bracket() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.take_profit_bp, 12.0);
        assert_eq!(cfg.stop_loss_bp, 6.0);
        assert_eq!(cfg.max_hold, Duration::seconds(180));
        assert_eq!(cfg.latency, Duration::zero());
    }

    #[test]
    fn slippage_is_half_spread_with_floor() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.slippage_bp(0.0), 1.0);
        assert_eq!(cfg.slippage_bp(1.5), 1.0);
        assert_eq!(cfg.slippage_bp(5.0), 2.5);
        assert_eq!(cfg.with_slip_bp(0.0).slippage_bp(0.0), 0.0);
    }
}
