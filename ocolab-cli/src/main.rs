//! ocolab CLI: post-triggered breakout backtests.
//!
//! Commands:
//! - `run`: simulate every post event against the price stream and export the trade log
//! - `metrics`: export the price stream annotated with baselines, volatility and post counts

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ocolab_core::metrics::compute_book_metrics;
use ocolab_runner::manifest::{manifest_path, write_manifest};
use ocolab_runner::summary::format_trade_line;
use ocolab_runner::{
    export_book_metrics, export_trades, load_inputs, run_backtest, BacktestRequest,
    StrategyConfig,
};

#[derive(Parser)]
#[command(
    name = "ocolab",
    about = "ocolab: breakout entry and OCO bracket simulator for post-triggered trades"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the backtest and write the trade log.
    Run {
        /// CSV of post timestamps (column `timestamp`).
        #[arg(long)]
        posts: PathBuf,

        /// CSV of price updates (`timestamp`, `price`, optional `spread_bp`).
        #[arg(long)]
        book: PathBuf,

        /// Delay between a post and arming the bracket, in milliseconds.
        #[arg(long, alias = "latency_ms", default_value_t = 0)]
        latency_ms: u64,

        /// Strategy config (JSON or TOML).
        #[arg(long)]
        config: PathBuf,

        /// Trade log output (.csv or .parquet).
        #[arg(long)]
        out: PathBuf,

        /// Skip writing `<out>.manifest.json`.
        #[arg(long, default_value_t = false)]
        no_manifest: bool,
    },
    /// Export per-update metrics joined with per-second post counts.
    Metrics {
        #[arg(long)]
        posts: PathBuf,

        #[arg(long)]
        book: PathBuf,

        /// Output file (.csv or .parquet).
        #[arg(long)]
        out: PathBuf,

        /// Strategy config for the window lengths. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            posts,
            book,
            latency_ms,
            config,
            out,
            no_manifest,
        } => run_cmd(
            BacktestRequest {
                posts_path: posts,
                book_path: book,
                config_path: config,
                latency_ms,
            },
            &out,
            !no_manifest,
        ),
        Commands::Metrics {
            posts,
            book,
            out,
            config,
        } => metrics_cmd(&posts, &book, &out, config.as_deref()),
    }
}

fn run_cmd(req: BacktestRequest, out: &Path, with_manifest: bool) -> Result<()> {
    let result = run_backtest(&req).with_context(|| {
        format!(
            "backtest failed (config {}, book {}, posts {})",
            req.config_path.display(),
            req.book_path.display(),
            req.posts_path.display()
        )
    })?;

    for trade in &result.trades {
        println!("{}", format_trade_line(trade));
    }
    println!("{}", result.summary);

    export_trades(out, &result.trades)
        .with_context(|| format!("writing trade log {}", out.display()))?;
    info!(path = %out.display(), trades = result.trades.len(), "trade log written");

    if with_manifest {
        let path = manifest_path(out);
        write_manifest(&path, &result.manifest)?;
        info!(path = %path.display(), run_id = %result.manifest.run_id(), "manifest written");
    }
    Ok(())
}

fn metrics_cmd(posts: &Path, book: &Path, out: &Path, config: Option<&Path>) -> Result<()> {
    let strategy = match config {
        Some(path) => StrategyConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StrategyConfig::default(),
    };
    let sim_config = strategy.to_sim_config(0)?;
    let inputs = load_inputs(book, posts).context("loading inputs")?;

    let metrics = compute_book_metrics(&inputs.book, &sim_config.metrics);
    export_book_metrics(out, &inputs.book, &metrics, &inputs.posts)
        .with_context(|| format!("writing metrics {}", out.display()))?;
    info!(path = %out.display(), rows = metrics.len(), "book metrics written");
    Ok(())
}
