//! Trade log and annotated book export.
//!
//! Two formats, chosen by the output path's extension:
//! - **CSV** via the `csv` crate, timestamps as RFC 3339 with milliseconds
//! - **Parquet** via Polars, timestamps as `Datetime(ms)`

use chrono::{DateTime, SecondsFormat, Utc};
use ocolab_core::data::{BookSeries, PostSeries};
use ocolab_core::domain::Trade;
use ocolab_core::metrics::BookMetrics;
use polars::prelude::{Column, DataFrame, DataType, ParquetWriter, TimeUnit};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Trade log columns, in output order.
pub const TRADE_COLUMNS: [&str; 8] = [
    "post_time",
    "entry_time",
    "exit_time",
    "side",
    "entry_price",
    "exit_price",
    "pnl_bp",
    "exit_reason",
];

/// Annotated book columns, in output order.
pub const BOOK_METRICS_COLUMNS: [&str; 7] = [
    "timestamp",
    "price",
    "spread_bp",
    "baseline_high",
    "baseline_low",
    "rolling_stdev_bp",
    "post_count",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported output format '{0}' (expected .csv or .parquet)")]
    UnsupportedFormat(String),

    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet write failed: {0}")]
    Parquet(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("book has {book} rows but {metrics} metric rows were supplied")]
    LengthMismatch { book: usize, metrics: usize },
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" | "pq" => Ok(OutputFormat::Parquet),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

// ─── Trade log ──────────────────────────────────────────────────────

/// Write the trade log to `path` in the format implied by its extension.
pub fn export_trades(path: &Path, trades: &[Trade]) -> Result<(), ExportError> {
    match OutputFormat::from_path(path)? {
        OutputFormat::Csv => trades_to_csv(create(path)?, trades),
        OutputFormat::Parquet => write_parquet(path, trades_frame(trades)?),
    }
}

pub fn trades_to_csv<W: Write>(writer: W, trades: &[Trade]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(TRADE_COLUMNS)?;
    for t in trades {
        wtr.write_record([
            fmt_ts(t.post_time),
            fmt_ts(t.entry_time),
            fmt_ts(t.exit_time),
            t.side.to_string(),
            format!("{:.6}", t.entry_price),
            format!("{:.6}", t.exit_price),
            format!("{:.4}", t.pnl_bp),
            t.exit_reason.to_string(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn trades_frame(trades: &[Trade]) -> Result<DataFrame, ExportError> {
    let sides: Vec<String> = trades.iter().map(|t| t.side.to_string()).collect();
    let reasons: Vec<String> = trades.iter().map(|t| t.exit_reason.to_string()).collect();

    DataFrame::new(vec![
        datetime_column("post_time", trade_millis(trades, |t| t.post_time))?,
        datetime_column("entry_time", trade_millis(trades, |t| t.entry_time))?,
        datetime_column("exit_time", trade_millis(trades, |t| t.exit_time))?,
        Column::new("side".into(), sides),
        Column::new(
            "entry_price".into(),
            trades.iter().map(|t| t.entry_price).collect::<Vec<f64>>(),
        ),
        Column::new(
            "exit_price".into(),
            trades.iter().map(|t| t.exit_price).collect::<Vec<f64>>(),
        ),
        Column::new(
            "pnl_bp".into(),
            trades.iter().map(|t| t.pnl_bp).collect::<Vec<f64>>(),
        ),
        Column::new("exit_reason".into(), reasons),
    ])
    .map_err(|e| ExportError::Parquet(format!("dataframe creation: {e}")))
}

// ─── Annotated book ─────────────────────────────────────────────────

/// Write every book update with its metrics and the number of posts aligned
/// to exactly that timestamp.
pub fn export_book_metrics(
    path: &Path,
    book: &BookSeries,
    metrics: &[BookMetrics],
    posts: &PostSeries,
) -> Result<(), ExportError> {
    if book.len() != metrics.len() {
        return Err(ExportError::LengthMismatch {
            book: book.len(),
            metrics: metrics.len(),
        });
    }
    match OutputFormat::from_path(path)? {
        OutputFormat::Csv => book_metrics_to_csv(create(path)?, book, metrics, posts),
        OutputFormat::Parquet => write_parquet(path, book_metrics_frame(book, metrics, posts)?),
    }
}

pub fn book_metrics_to_csv<W: Write>(
    writer: W,
    book: &BookSeries,
    metrics: &[BookMetrics],
    posts: &PostSeries,
) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(BOOK_METRICS_COLUMNS)?;
    for (u, m) in book.as_slice().iter().zip(metrics) {
        wtr.write_record([
            fmt_ts(u.timestamp),
            u.price.to_string(),
            u.spread_bp.to_string(),
            m.baseline_high.to_string(),
            m.baseline_low.to_string(),
            format!("{:.6}", m.rolling_stdev_bp),
            posts.count_at(u.timestamp).to_string(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn book_metrics_frame(
    book: &BookSeries,
    metrics: &[BookMetrics],
    posts: &PostSeries,
) -> Result<DataFrame, ExportError> {
    let updates = book.as_slice();
    let stamps: Vec<i64> = updates.iter().map(|u| u.timestamp.timestamp_millis()).collect();
    let counts: Vec<u32> = updates.iter().map(|u| posts.count_at(u.timestamp)).collect();

    DataFrame::new(vec![
        datetime_column("timestamp", stamps)?,
        Column::new("price".into(), updates.iter().map(|u| u.price).collect::<Vec<f64>>()),
        Column::new(
            "spread_bp".into(),
            updates.iter().map(|u| u.spread_bp).collect::<Vec<f64>>(),
        ),
        Column::new(
            "baseline_high".into(),
            metrics.iter().map(|m| m.baseline_high).collect::<Vec<f64>>(),
        ),
        Column::new(
            "baseline_low".into(),
            metrics.iter().map(|m| m.baseline_low).collect::<Vec<f64>>(),
        ),
        Column::new(
            "rolling_stdev_bp".into(),
            metrics.iter().map(|m| m.rolling_stdev_bp).collect::<Vec<f64>>(),
        ),
        Column::new("post_count".into(), counts),
    ])
    .map_err(|e| ExportError::Parquet(format!("dataframe creation: {e}")))
}

// ─── Helpers ────────────────────────────────────────────────────────

fn fmt_ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn trade_millis(trades: &[Trade], field: impl Fn(&Trade) -> DateTime<Utc>) -> Vec<i64> {
    trades.iter().map(|t| field(t).timestamp_millis()).collect()
}

fn datetime_column(name: &str, millis: Vec<i64>) -> Result<Column, ExportError> {
    Column::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map_err(|e| ExportError::Parquet(format!("{name} cast: {e}")))
}

fn create(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_parquet(path: &Path, mut df: DataFrame) -> Result<(), ExportError> {
    let file = create(path)?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| ExportError::Parquet(format!("write {}: {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use ocolab_core::data::align_posts;
    use ocolab_core::domain::{pnl_bp, BookUpdate, ExitReason, Side};
    use ocolab_core::metrics::{compute_book_metrics, MetricsParams};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    fn sample_trade() -> Trade {
        Trade {
            post_time: t0(),
            entry_time: t0() + Duration::milliseconds(1_250),
            exit_time: t0() + Duration::seconds(181),
            side: Side::Long,
            entry_price: 100.030002,
            exit_price: 100.03,
            pnl_bp: pnl_bp(Side::Long, 100.030002, 100.03),
            exit_reason: ExitReason::TimeExit,
        }
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("out.csv")).unwrap(), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_path(Path::new("out.PARQUET")).unwrap(),
            OutputFormat::Parquet
        );
        assert!(matches!(
            OutputFormat::from_path(Path::new("out.xlsx")),
            Err(ExportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn trade_csv_has_expected_header_and_row() {
        let mut buf = Vec::new();
        trades_to_csv(&mut buf, &[sample_trade()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "post_time,entry_time,exit_time,side,entry_price,exit_price,pnl_bp,exit_reason"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2020-01-01T00:00:00.000Z,2020-01-01T00:00:01.250Z,2020-01-01T00:03:01.000Z,Long,100.030002,100.030000,-0.0002,TimeExit"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_trade_log_still_has_header() {
        let mut buf = Vec::new();
        trades_to_csv(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 1);
    }

    #[test]
    fn trade_frame_has_one_row_per_trade() {
        let df = trades_frame(&[sample_trade(), sample_trade()]).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), TRADE_COLUMNS.len());
    }

    #[test]
    fn book_metrics_join_post_counts_on_exact_second() {
        let book = BookSeries::new(vec![
            BookUpdate::new(t0() + Duration::seconds(59), 100.0),
            BookUpdate::new(t0() + Duration::milliseconds(59_500), 100.1),
            BookUpdate::new(t0() + Duration::seconds(60), 100.2),
        ])
        .unwrap();
        let posts = align_posts(&[
            t0() + Duration::seconds(59),
            t0() + Duration::milliseconds(60_700),
        ])
        .unwrap();
        let metrics = compute_book_metrics(&book, &MetricsParams::default());

        let mut buf = Vec::new();
        book_metrics_to_csv(&mut buf, &book, &metrics, &posts).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let counts: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|l| l.rsplit(',').next().unwrap())
            .collect();
        assert_eq!(counts, vec!["1", "0", "1"]);
    }

    #[test]
    fn book_metrics_length_mismatch() {
        let book = BookSeries::new(vec![BookUpdate::new(t0(), 100.0)]).unwrap();
        let posts = align_posts(&[t0()]).unwrap();
        let err = export_book_metrics(Path::new("x.csv"), &book, &[], &posts).unwrap_err();
        assert!(matches!(err, ExportError::LengthMismatch { book: 1, metrics: 0 }));
    }
}
