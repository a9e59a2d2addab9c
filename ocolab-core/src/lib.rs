//! ocolab core: the trade-simulation engine behind post-triggered breakout backtests.
//!
//! This crate contains:
//! - Domain types (book updates, post events, trades)
//! - Ordered, validated input series and the per-second post aligner
//! - Book metrics engine: trailing high/low baseline and short-horizon volatility
//! - Breakout band calculator
//! - Per-event state machine: arm, breakout entry, OCO bracket exit

pub mod band;
pub mod data;
pub mod domain;
pub mod engine;
pub mod metrics;
