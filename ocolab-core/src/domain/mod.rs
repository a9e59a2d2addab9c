//! Domain types for ocolab

pub mod book;
pub mod trade;

pub use book::{BookUpdate, PostEvent};
pub use trade::{pnl_bp, ExitReason, Side, Trade};

/// Basis points per unit of return (1 bp = 0.01%).
pub const BPS: f64 = 10_000.0;

/// Scale `price` by `bp` basis points: `price * (1 + bp / 10_000)`.
///
/// Negative `bp` moves the price down.
#[inline]
pub fn offset_bp(price: f64, bp: f64) -> f64 {
    price * (1.0 + bp / BPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_bp_moves_both_ways() {
        assert!((offset_bp(100.0, 12.0) - 100.12).abs() < 1e-10);
        assert!((offset_bp(100.0, -6.0) - 99.94).abs() < 1e-10);
        assert_eq!(offset_bp(100.0, 0.0), 100.0);
    }
}
