//! Trade: one completed breakout entry resolved by the OCO bracket.

use super::BPS;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => f.pad("Long"),
            Side::Short => f.pad("Short"),
        }
    }
}

/// Which leg of the bracket closed the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    TimeExit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::TakeProfit => f.pad("TakeProfit"),
            ExitReason::StopLoss => f.pad("StopLoss"),
            ExitReason::TimeExit => f.pad("TimeExit"),
        }
    }
}

/// A round-trip trade triggered by one post event.
///
/// Invariants: `post_time <= entry_time <= exit_time`, both prices positive,
/// and `pnl_bp` has the sign of `(exit_price - entry_price) * side.sign()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub post_time: DateTime<Utc>,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl_bp: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn holding_period(&self) -> Duration {
        self.exit_time - self.entry_time
    }

    pub fn is_winner(&self) -> bool {
        self.pnl_bp > 0.0
    }
}

/// Signed basis-point return in the position's favourable direction.
pub fn pnl_bp(side: Side, entry_price: f64, exit_price: f64) -> f64 {
    side.sign() * (exit_price - entry_price) / entry_price * BPS
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_trade() -> Trade {
        let post = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        Trade {
            post_time: post,
            entry_time: post + Duration::seconds(2),
            exit_time: post + Duration::seconds(40),
            side: Side::Short,
            entry_price: 100.0,
            exit_price: 99.88,
            pnl_bp: pnl_bp(Side::Short, 100.0, 99.88),
            exit_reason: ExitReason::TakeProfit,
        }
    }

    #[test]
    fn pnl_sign_follows_side() {
        assert!((pnl_bp(Side::Long, 100.0, 100.12) - 12.0).abs() < 1e-9);
        assert!((pnl_bp(Side::Long, 100.0, 99.94) + 6.0).abs() < 1e-9);
        assert!((pnl_bp(Side::Short, 100.0, 99.88) - 12.0).abs() < 1e-9);
        assert!((pnl_bp(Side::Short, 100.0, 100.06) + 6.0).abs() < 1e-9);
    }

    #[test]
    fn durations() {
        let trade = sample_trade();
        assert_eq!(trade.holding_period(), Duration::seconds(38));
        assert!(trade.is_winner());
    }

    #[test]
    fn display_names() {
        assert_eq!(Side::Long.to_string(), "Long");
        assert_eq!(ExitReason::TimeExit.to_string(), "TimeExit");
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
