//! Timestamp-indexed containers for the price stream and aligned posts.

use crate::domain::{BookUpdate, PostEvent};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Structural problems with an input series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("series is empty")]
    Empty,

    #[error("timestamps out of order at row {index}: {timestamp} follows {previous}")]
    NonChronological {
        index: usize,
        previous: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    #[error("invalid price {price} at row {index} (must be finite and positive)")]
    InvalidPrice { index: usize, price: f64 },

    #[error("invalid spread {spread_bp} at row {index} (must be finite and non-negative)")]
    InvalidSpread { index: usize, spread_bp: f64 },
}

/// The price stream, loaded once and never mutated.
///
/// Timestamps are non-decreasing; several updates may share a timestamp.
#[derive(Debug, Clone)]
pub struct BookSeries {
    updates: Vec<BookUpdate>,
}

impl BookSeries {
    pub fn new(updates: Vec<BookUpdate>) -> Result<Self, SeriesError> {
        if updates.is_empty() {
            return Err(SeriesError::Empty);
        }
        for (index, u) in updates.iter().enumerate() {
            if !(u.price.is_finite() && u.price > 0.0) {
                return Err(SeriesError::InvalidPrice {
                    index,
                    price: u.price,
                });
            }
            if !(u.spread_bp.is_finite() && u.spread_bp >= 0.0) {
                return Err(SeriesError::InvalidSpread {
                    index,
                    spread_bp: u.spread_bp,
                });
            }
        }
        if let Some(index) = first_decrease(updates.iter().map(|u| u.timestamp)) {
            return Err(SeriesError::NonChronological {
                index,
                previous: updates[index - 1].timestamp,
                timestamp: updates[index].timestamp,
            });
        }
        Ok(Self { updates })
    }

    pub fn as_slice(&self) -> &[BookUpdate] {
        &self.updates
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Always false: construction rejects empty streams.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn first_timestamp(&self) -> DateTime<Utc> {
        self.updates[0].timestamp
    }

    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.updates[self.updates.len() - 1].timestamp
    }

    /// Index of the first update with `timestamp >= t`, or `None` when `t`
    /// lies strictly after the end of the stream.
    pub fn first_at_or_after(&self, t: DateTime<Utc>) -> Option<usize> {
        let idx = self.updates.partition_point(|u| u.timestamp < t);
        (idx < self.updates.len()).then_some(idx)
    }
}

/// Per-second post counts, strictly increasing by timestamp.
#[derive(Debug, Clone)]
pub struct PostSeries {
    events: Vec<PostEvent>,
}

impl PostSeries {
    pub fn new(events: Vec<PostEvent>) -> Result<Self, SeriesError> {
        if events.is_empty() {
            return Err(SeriesError::Empty);
        }
        if let Some(index) = first_non_increase(events.iter().map(|e| e.timestamp)) {
            return Err(SeriesError::NonChronological {
                index,
                previous: events[index - 1].timestamp,
                timestamp: events[index].timestamp,
            });
        }
        Ok(Self { events })
    }

    pub fn as_slice(&self) -> &[PostEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PostEvent> {
        self.events.iter()
    }

    /// Number of posts aligned to exactly `second` (0 if none).
    pub fn count_at(&self, second: DateTime<Utc>) -> u32 {
        self.events
            .binary_search_by_key(&second, |e| e.timestamp)
            .map(|i| self.events[i].count)
            .unwrap_or(0)
    }

    /// Total number of raw posts across all seconds.
    pub fn total_posts(&self) -> u64 {
        self.events.iter().map(|e| u64::from(e.count)).sum()
    }
}

/// First index whose timestamp is earlier than its predecessor.
pub(crate) fn first_decrease(ts: impl Iterator<Item = DateTime<Utc>>) -> Option<usize> {
    first_violation(ts, |prev, cur| cur < prev)
}

fn first_non_increase(ts: impl Iterator<Item = DateTime<Utc>>) -> Option<usize> {
    first_violation(ts, |prev, cur| cur <= prev)
}

fn first_violation(
    ts: impl Iterator<Item = DateTime<Utc>>,
    bad: impl Fn(DateTime<Utc>, DateTime<Utc>) -> bool,
) -> Option<usize> {
    let mut prev: Option<DateTime<Utc>> = None;
    for (i, t) in ts.enumerate() {
        if let Some(p) = prev {
            if bad(p, t) {
                return Some(i);
            }
        }
        prev = Some(t);
    }
    None
}
