//! CSV ingestion for the two input tables.
//!
//! Book table: `timestamp`, `price`, optional `spread_bp`.
//! Posts table: `timestamp`; every other column is ignored.
//!
//! Both tables are validated before any simulation runs: required columns
//! present, at least one row, parseable values, and timestamps in
//! non-decreasing order.

use chrono::{DateTime, NaiveDateTime, Utc};
use ocolab_core::data::{align_posts, BookSeries, PostSeries, SeriesError};
use ocolab_core::domain::BookUpdate;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Which input table an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Book,
    Posts,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Book => f.pad("book"),
            Table::Posts => f.pad("posts"),
        }
    }
}

/// Errors from the input loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {table} table {}: {source}", path.display())]
    Io {
        table: Table,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {table} CSV: {source}")]
    Csv {
        table: Table,
        #[source]
        source: csv::Error,
    },

    #[error("{table} table is missing required column '{column}'")]
    MissingColumn { table: Table, column: &'static str },

    #[error("{table} table row {row}: cannot parse {column} value '{value}'")]
    BadValue {
        table: Table,
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("{table} table: {source}")]
    Series {
        table: Table,
        #[source]
        source: SeriesError,
    },
}

/// Both inputs, validated and ready to simulate.
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub book: BookSeries,
    pub posts: PostSeries,
    /// BLAKE3 over every book update and aligned post count.
    pub dataset_hash: String,
}

impl LoadedInputs {
    pub fn new(book: BookSeries, posts: PostSeries) -> Self {
        let dataset_hash = compute_dataset_hash(&book, &posts);
        Self {
            book,
            posts,
            dataset_hash,
        }
    }
}

/// Load and validate both tables.
pub fn load_inputs(book_path: &Path, posts_path: &Path) -> Result<LoadedInputs, LoadError> {
    let book = load_book(book_path)?;
    let posts = load_posts(posts_path)?;
    info!(
        book_updates = book.len(),
        post_seconds = posts.len(),
        raw_posts = posts.total_posts(),
        first = %book.first_timestamp(),
        last = %book.last_timestamp(),
        "inputs loaded"
    );
    Ok(LoadedInputs::new(book, posts))
}

pub fn load_book(path: &Path) -> Result<BookSeries, LoadError> {
    read_book(open(Table::Book, path)?)
}

/// Load raw posts and align them to per-second counts.
pub fn load_posts(path: &Path) -> Result<PostSeries, LoadError> {
    read_posts(open(Table::Posts, path)?)
}

pub fn read_book<R: Read>(reader: R) -> Result<BookSeries, LoadError> {
    let table = Table::Book;
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers().map_err(|source| LoadError::Csv { table, source })?.clone();
    let ts_col = require_column(table, &headers, "timestamp")?;
    let price_col = require_column(table, &headers, "price")?;
    let spread_col = find_column(&headers, "spread_bp");

    let mut updates = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(|source| LoadError::Csv { table, source })?;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let timestamp = parse_field(table, row, "timestamp", field(ts_col), parse_timestamp)?;
        let price = parse_field(table, row, "price", field(price_col), parse_f64)?;
        let spread_bp = match spread_col.map(field) {
            Some(raw) if !raw.is_empty() => parse_field(table, row, "spread_bp", raw, parse_f64)?,
            _ => 0.0,
        };
        updates.push(BookUpdate {
            timestamp,
            price,
            spread_bp,
        });
    }

    BookSeries::new(updates).map_err(|source| LoadError::Series { table, source })
}

pub fn read_posts<R: Read>(reader: R) -> Result<PostSeries, LoadError> {
    let table = Table::Posts;
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers().map_err(|source| LoadError::Csv { table, source })?.clone();
    let ts_col = require_column(table, &headers, "timestamp")?;

    let mut raw = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(|source| LoadError::Csv { table, source })?;
        let value = record.get(ts_col).unwrap_or("");
        raw.push(parse_field(table, row, "timestamp", value, parse_timestamp)?);
    }

    align_posts(&raw).map_err(|source| LoadError::Series { table, source })
}

/// Parse an RFC 3339 timestamp, or a naive `YYYY-MM-DD HH:MM:SS[.fff]`
/// (space or `T` separated) read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(t.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|n| n.and_utc())
}

fn parse_f64(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok()
}

fn parse_field<T>(
    table: Table,
    row: usize,
    column: &'static str,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, LoadError> {
    parse(raw).ok_or_else(|| LoadError::BadValue {
        table,
        row,
        column,
        value: raw.to_string(),
    })
}

fn open(table: Table, path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        table,
        path: path.to_path_buf(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn require_column(
    table: Table,
    headers: &csv::StringRecord,
    column: &'static str,
) -> Result<usize, LoadError> {
    find_column(headers, column).ok_or(LoadError::MissingColumn { table, column })
}

fn compute_dataset_hash(book: &BookSeries, posts: &PostSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"book");
    for u in book.as_slice() {
        hasher.update(&u.timestamp.timestamp_micros().to_le_bytes());
        hasher.update(&u.price.to_le_bytes());
        hasher.update(&u.spread_bp.to_le_bytes());
    }
    hasher.update(b"posts");
    for e in posts.iter() {
        hasher.update(&e.timestamp.timestamp().to_le_bytes());
        hasher.update(&e.count.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
