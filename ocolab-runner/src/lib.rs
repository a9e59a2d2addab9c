//! ocolab runner: backtest orchestration on top of `ocolab-core`.
//!
//! This crate provides:
//! - Strategy configuration loading and validation (JSON or TOML)
//! - CSV ingestion of the price stream and post log
//! - Single-run orchestration with stats and summary
//! - Trade log and annotated book export (CSV or Parquet)
//! - Run manifest with BLAKE3 config and dataset hashes

pub mod config;
pub mod data_loader;
pub mod export;
pub mod manifest;
pub mod runner;
pub mod summary;

pub use config::{ConfigError, StrategyConfig};
pub use data_loader::{load_book, load_inputs, load_posts, LoadError, LoadedInputs, Table};
pub use export::{export_book_metrics, export_trades, ExportError, OutputFormat};
pub use manifest::RunManifest;
pub use runner::{run_backtest, run_backtest_from_data, BacktestRequest, BacktestResult, RunError};
pub use summary::TradeSummary;
