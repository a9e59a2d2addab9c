//! Post alignment: raw post timestamps → per-second counts.
//!
//! Timestamps are floored (never rounded) to the whole second, so a post can
//! only ever be attributed to the second it happened in or earlier. There is
//! no lookahead across second or minute boundaries.

use super::series::{first_decrease, PostSeries, SeriesError};
use crate::domain::PostEvent;
use chrono::{DateTime, SubsecRound, Utc};

/// Drop the sub-second part of `t`.
pub fn floor_to_second(t: DateTime<Utc>) -> DateTime<Utc> {
    t.trunc_subsecs(0)
}

/// Aggregate raw post timestamps into a [`PostSeries`] of per-second counts.
///
/// `raw` must be non-empty and in non-decreasing order.
pub fn align_posts(raw: &[DateTime<Utc>]) -> Result<PostSeries, SeriesError> {
    if raw.is_empty() {
        return Err(SeriesError::Empty);
    }
    if let Some(index) = first_decrease(raw.iter().copied()) {
        return Err(SeriesError::NonChronological {
            index,
            previous: raw[index - 1],
            timestamp: raw[index],
        });
    }

    let mut events: Vec<PostEvent> = Vec::new();
    for &t in raw {
        let second = floor_to_second(t);
        match events.last_mut() {
            Some(last) if last.timestamp == second => last.count += 1,
            _ => events.push(PostEvent {
                timestamp: second,
                count: 1,
            }),
        }
    }

    PostSeries::new(events)
}
