//! Market and social inputs: price updates and aggregated post events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tick of the price stream.
///
/// `spread_bp` is the quoted spread in basis points; feeds that carry no
/// spread load it as 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookUpdate {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    #[serde(default)]
    pub spread_bp: f64,
}

impl BookUpdate {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self {
            timestamp,
            price,
            spread_bp: 0.0,
        }
    }

    pub fn with_spread(mut self, spread_bp: f64) -> Self {
        self.spread_bp = spread_bp;
        self
    }
}

/// Posts that landed in one wall-clock second.
///
/// `timestamp` is always second-aligned (see [`crate::data::align_posts`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostEvent {
    pub timestamp: DateTime<Utc>,
    pub count: u32,
}
