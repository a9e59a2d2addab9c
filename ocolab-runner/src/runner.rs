//! Backtest runner. Wires together config, ingestion, metrics and the simulator.
//!
//! Two entry points:
//! - `run_backtest()`: loads config and both CSV tables, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes pre-loaded inputs, no I/O. Used by tests
//!   and by callers sweeping latency over the same data.

use std::path::PathBuf;

use ocolab_core::domain::Trade;
use ocolab_core::engine::{SimStats, Simulator};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, StrategyConfig};
use crate::data_loader::{load_inputs, LoadError, LoadedInputs};
use crate::manifest::RunManifest;
use crate::summary::TradeSummary;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Paths and knobs for one run.
#[derive(Debug, Clone)]
pub struct BacktestRequest {
    pub posts_path: PathBuf,
    pub book_path: PathBuf,
    pub config_path: PathBuf,
    pub latency_ms: u64,
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    /// Ascending by post time.
    pub trades: Vec<Trade>,
    pub stats: SimStats,
    pub summary: TradeSummary,
    pub manifest: RunManifest,
}

/// Load everything named in `req` and run it.
pub fn run_backtest(req: &BacktestRequest) -> Result<BacktestResult, RunError> {
    let config = StrategyConfig::from_file(&req.config_path)?;
    let inputs = load_inputs(&req.book_path, &req.posts_path)?;
    run_backtest_from_data(&inputs, &config, req.latency_ms)
}

/// Run a backtest with pre-loaded inputs, no I/O.
pub fn run_backtest_from_data(
    inputs: &LoadedInputs,
    config: &StrategyConfig,
    latency_ms: u64,
) -> Result<BacktestResult, RunError> {
    let sim_config = config.to_sim_config(latency_ms)?;
    let simulator = Simulator::new(&inputs.book, &sim_config);
    let report = simulator.simulate_with_stats(&inputs.posts);

    let summary = TradeSummary::from_trades(&report.trades);
    let stats = report.stats;
    info!(
        events = stats.events,
        armed = stats.armed,
        entered = stats.entered,
        trades = summary.trade_count,
        dropped_no_entry = stats.dropped_no_entry,
        dropped_open_at_end = stats.dropped_open_at_end,
        latency_ms,
        "simulation finished"
    );
    if report.trades.is_empty() {
        warn!(
            events = stats.events,
            "no trades produced; check that post timestamps overlap the book"
        );
    }

    let manifest = RunManifest {
        schema_version: SCHEMA_VERSION,
        config_hash: config.config_hash(),
        dataset_hash: inputs.dataset_hash.clone(),
        latency_ms,
        trade_count: summary.trade_count,
        stats,
        summary: summary.clone(),
    };

    Ok(BacktestResult {
        trades: report.trades,
        stats,
        summary,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use ocolab_core::data::{align_posts, BookSeries};
    use ocolab_core::domain::{BookUpdate, ExitReason, Side};

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    /// Flat at 100 for a minute, then a clean breakout to the upside.
    fn breakout_inputs() -> LoadedInputs {
        let mut updates: Vec<BookUpdate> = (0..=60)
            .map(|s| BookUpdate::new(at_ms(s * 1_000), 100.0))
            .collect();
        updates.push(BookUpdate::new(at_ms(61_000), 100.05));
        updates.push(BookUpdate::new(at_ms(62_000), 100.30));
        let book = BookSeries::new(updates).unwrap();
        let posts = align_posts(&[at_ms(60_000)]).unwrap();
        LoadedInputs::new(book, posts)
    }

    #[test]
    fn breakout_run_takes_profit() {
        let inputs = breakout_inputs();
        let result = run_backtest_from_data(&inputs, &StrategyConfig::default(), 0).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.side, Side::Long);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);
        assert_eq!(trade.entry_time, at_ms(61_000));
        assert_eq!(result.summary.trade_count, 1);
        assert_eq!(result.manifest.trade_count, 1);
        assert_eq!(result.stats.closed, 1);
    }

    #[test]
    fn manifest_is_deterministic() {
        let inputs = breakout_inputs();
        let cfg = StrategyConfig::default();
        let a = run_backtest_from_data(&inputs, &cfg, 0).unwrap();
        let b = run_backtest_from_data(&inputs, &cfg, 0).unwrap();
        assert_eq!(a.manifest, b.manifest);
        assert_eq!(a.manifest.schema_version, SCHEMA_VERSION);

        let c = run_backtest_from_data(&inputs, &cfg, 500).unwrap();
        assert_ne!(a.manifest.run_id(), c.manifest.run_id());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let inputs = breakout_inputs();
        let cfg = StrategyConfig {
            take_profit_bp: -1.0,
            ..StrategyConfig::default()
        };
        assert!(matches!(
            run_backtest_from_data(&inputs, &cfg, 0),
            Err(RunError::Config(ConfigError::Invalid { key: "take_profit_bp", .. }))
        ));
    }

    #[test]
    fn out_of_range_latency_is_a_config_error() {
        let inputs = breakout_inputs();
        let res = run_backtest_from_data(&inputs, &StrategyConfig::default(), 10_000_000_000_000_000);
        assert!(matches!(
            res,
            Err(RunError::Config(ConfigError::Invalid { key: "latency_ms", .. }))
        ));
    }

    #[test]
    fn oversized_window_never_reaches_the_engine() {
        let inputs = breakout_inputs();
        let cfg = StrategyConfig {
            baseline_window_s: 10_000_000_000_000,
            ..StrategyConfig::default()
        };
        assert!(matches!(
            run_backtest_from_data(&inputs, &cfg, 0),
            Err(RunError::Config(ConfigError::Invalid { key: "baseline_window_s", .. }))
        ));
    }

    #[test]
    fn posts_outside_book_yield_no_trades() {
        let mut inputs = breakout_inputs();
        inputs.posts = align_posts(&[at_ms(3_600_000)]).unwrap();
        let result = run_backtest_from_data(&inputs, &StrategyConfig::default(), 0).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.stats.skipped_no_arm, 1);
        assert_eq!(result.summary.avg_pnl_bp, 0.0);
    }
}
