//! Trade summary statistics and console formatting.

use chrono::SecondsFormat;
use ocolab_core::domain::{ExitReason, Side, Trade};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate view over a run's trades.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeSummary {
    pub trade_count: usize,
    /// Mean pnl in bp; 0.0 when there are no trades.
    pub avg_pnl_bp: f64,
    pub total_pnl_bp: f64,
    /// Fraction of trades with positive pnl; 0.0 when there are no trades.
    pub win_rate: f64,
    pub longs: usize,
    pub shorts: usize,
    pub take_profits: usize,
    pub stop_losses: usize,
    pub time_exits: usize,
}

impl TradeSummary {
    pub fn from_trades(trades: &[Trade]) -> Self {
        let mut s = TradeSummary {
            trade_count: trades.len(),
            ..Default::default()
        };
        let mut winners = 0usize;
        for t in trades {
            s.total_pnl_bp += t.pnl_bp;
            if t.is_winner() {
                winners += 1;
            }
            match t.side {
                Side::Long => s.longs += 1,
                Side::Short => s.shorts += 1,
            }
            match t.exit_reason {
                ExitReason::TakeProfit => s.take_profits += 1,
                ExitReason::StopLoss => s.stop_losses += 1,
                ExitReason::TimeExit => s.time_exits += 1,
            }
        }
        if s.trade_count > 0 {
            let n = s.trade_count as f64;
            s.avg_pnl_bp = s.total_pnl_bp / n;
            s.win_rate = winners as f64 / n;
        }
        s
    }
}

impl fmt::Display for TradeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trades={} avg_pnl_bp={:.2} total_pnl_bp={:.2} win_rate={:.1}% long/short={}/{} tp/sl/time={}/{}/{}",
            self.trade_count,
            self.avg_pnl_bp,
            self.total_pnl_bp,
            self.win_rate * 100.0,
            self.longs,
            self.shorts,
            self.take_profits,
            self.stop_losses,
            self.time_exits,
        )
    }
}

/// One console line per trade.
pub fn format_trade_line(t: &Trade) -> String {
    format!(
        "{} {:<5} entry {} @ {:.4} exit {} @ {:.4} {:<10} pnl_bp={:+.2}",
        t.post_time.to_rfc3339_opts(SecondsFormat::Secs, true),
        t.side,
        t.entry_time.to_rfc3339_opts(SecondsFormat::Millis, true),
        t.entry_price,
        t.exit_time.to_rfc3339_opts(SecondsFormat::Millis, true),
        t.exit_price,
        t.exit_reason,
        t.pnl_bp,
    )
}
