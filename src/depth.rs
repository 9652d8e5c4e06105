//! Liquidity imbalance from an order-book snapshot.

use crate::okx::OrderBook;

/// Aggregate ask depth over aggregate bid depth, plus total ask volume.
///
/// A missing or empty snapshot reads `(1.0, 0.0)`: neutral, not a measured
/// ratio of one. The zero total-ask volume is the tell. A book with asks
/// but no bids also reads a neutral 1.0 rather than an infinite imbalance.
pub fn wall_ratio(book: &OrderBook) -> (f64, f64) {
    let asks: f64 = book.asks.iter().map(|l| l.size).sum();
    let bids: f64 = book.bids.iter().map(|l| l.size).sum();
    let ratio = if bids > 0.0 { asks / bids } else { 1.0 };
    (ratio, asks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::okx::BookLevel;

    fn level(price: f64, size: f64) -> BookLevel {
        BookLevel { price, size }
    }

    #[test]
    fn test_empty_book_is_neutral() {
        assert_eq!(wall_ratio(&OrderBook::default()), (1.0, 0.0));
    }

    #[test]
    fn test_zero_bids_guarded() {
        let book = OrderBook {
            asks: vec![level(10.0, 3.0), level(10.1, 2.0)],
            bids: vec![],
        };
        assert_eq!(wall_ratio(&book), (1.0, 5.0));
    }

    #[test]
    fn test_measured_ratio() {
        let book = OrderBook {
            asks: vec![level(10.0, 6.0), level(10.1, 2.0)],
            bids: vec![level(9.9, 1.0), level(9.8, 1.0)],
        };
        let (ratio, total_ask) = wall_ratio(&book);
        assert!((ratio - 4.0).abs() < 1e-9);
        assert!((total_ask - 8.0).abs() < 1e-9);
    }
}
