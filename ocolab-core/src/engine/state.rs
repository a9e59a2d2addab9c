//! Per-event state machine.
//!
//! A fresh [`EventState`] is built for every post event. It is a plain value:
//! stepping consumes the old state and returns the next one, so nothing can
//! leak between events.

use super::config::SimConfig;
use crate::band::Thresholds;
use crate::domain::{offset_bp, pnl_bp, BookUpdate, ExitReason, Side, Trade};
use chrono::{DateTime, Utc};

/// Breakout check against armed thresholds. Long is tested first, so an
/// update satisfying both sides always enters long.
///
/// Returns the side and the slippage-adjusted fill price.
pub fn entry_fill(
    thresholds: &Thresholds,
    update: &BookUpdate,
    config: &SimConfig,
) -> Option<(Side, f64)> {
    let slip = config.slippage_bp(update.spread_bp);
    if update.price >= thresholds.long_stop {
        Some((Side::Long, offset_bp(thresholds.long_stop, slip)))
    } else if update.price <= thresholds.short_stop {
        Some((Side::Short, offset_bp(thresholds.short_stop, -slip)))
    } else {
        None
    }
}

/// An open position with its live OCO bracket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub post_time: DateTime<Utc>,
    pub side: Side,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub time_exit: DateTime<Utc>,
}

impl Position {
    pub fn open(
        post_time: DateTime<Utc>,
        side: Side,
        entry_time: DateTime<Utc>,
        entry_price: f64,
        config: &SimConfig,
    ) -> Self {
        let sign = side.sign();
        Self {
            post_time,
            side,
            entry_time,
            entry_price,
            take_profit: offset_bp(entry_price, sign * config.take_profit_bp),
            stop_loss: offset_bp(entry_price, -sign * config.stop_loss_bp),
            time_exit: entry_time
                .checked_add_signed(config.max_hold)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// First satisfied exit in priority order TakeProfit → StopLoss →
    /// TimeExit, with its fill price. Bracket legs fill at their level; the
    /// time exit fills at the update's price.
    pub fn exit_check(&self, update: &BookUpdate) -> Option<(ExitReason, f64)> {
        let (hit_tp, hit_sl) = match self.side {
            Side::Long => (
                update.price >= self.take_profit,
                update.price <= self.stop_loss,
            ),
            Side::Short => (
                update.price <= self.take_profit,
                update.price >= self.stop_loss,
            ),
        };
        if hit_tp {
            Some((ExitReason::TakeProfit, self.take_profit))
        } else if hit_sl {
            Some((ExitReason::StopLoss, self.stop_loss))
        } else if update.timestamp >= self.time_exit {
            Some((ExitReason::TimeExit, update.price))
        } else {
            None
        }
    }

    pub fn close(&self, exit_time: DateTime<Utc>, exit_price: f64, reason: ExitReason) -> Trade {
        Trade {
            post_time: self.post_time,
            entry_time: self.entry_time,
            exit_time,
            side: self.side,
            entry_price: self.entry_price,
            exit_price,
            pnl_bp: pnl_bp(self.side, self.entry_price, exit_price),
            exit_reason: reason,
        }
    }
}

/// Lifecycle of one post event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EventState {
    #[default]
    Idle,
    Armed {
        post_time: DateTime<Utc>,
        thresholds: Thresholds,
    },
    Open(Position),
    Closed(Trade),
}

impl EventState {
    /// Idle → Armed. Any other state is returned unchanged.
    pub fn arm(self, post_time: DateTime<Utc>, thresholds: Thresholds) -> Self {
        match self {
            EventState::Idle => EventState::Armed {
                post_time,
                thresholds,
            },
            other => other,
        }
    }

    /// Advance by one book update.
    ///
    /// The bracket is live on the update that opens the position, so a print
    /// that gaps through a leg closes the trade on the spot.
    pub fn step(self, update: &BookUpdate, config: &SimConfig) -> Self {
        match self {
            EventState::Armed {
                post_time,
                thresholds,
            } => match entry_fill(&thresholds, update, config) {
                Some((side, price)) => {
                    let pos = Position::open(post_time, side, update.timestamp, price, config);
                    EventState::Open(pos).step_exit(update)
                }
                None => self,
            },
            EventState::Open(_) => self.step_exit(update),
            EventState::Idle | EventState::Closed(_) => self,
        }
    }

    fn step_exit(self, update: &BookUpdate) -> Self {
        match self {
            EventState::Open(pos) => match pos.exit_check(update) {
                Some((reason, price)) => {
                    EventState::Closed(pos.close(update.timestamp, price, reason))
                }
                None => self,
            },
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventState::Closed(_))
    }

    pub fn trade(&self) -> Option<&Trade> {
        match self {
            EventState::Closed(trade) => Some(trade),
            _ => None,
        }
    }
}
