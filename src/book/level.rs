//! Book levels and raw two-sided snapshots.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One price level of a book side.
///
/// `reference_id` carries the upstream sequence/update id for bookkeeping and
/// takes no part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub amount: Decimal,
    #[serde(default)]
    pub reference_id: u64,
}

impl PriceLevel {
    pub fn new(price: Decimal, amount: Decimal, reference_id: u64) -> Self {
        Self {
            price,
            amount,
            reference_id,
        }
    }
}

impl PartialEq for PriceLevel {
    fn eq(&self, other: &Self) -> bool {
        self.price == other.price && self.amount == other.amount
    }
}

/// A raw snapshot of the mirrored exchange's book as delivered by a connector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookSnapshot {
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
}

impl BookSnapshot {
    pub fn new(bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) -> Self {
        Self { bids, asks }
    }

    /// Highest bid price, if any.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.iter().map(|l| l.price).max()
    }

    /// Lowest ask price, if any.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.iter().map(|l| l.price).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reference_id_not_compared() {
        let a = PriceLevel::new(dec!(100.0), dec!(1), 7);
        let b = PriceLevel::new(dec!(100), dec!(1.00), 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "bids": [{"price": "99.5", "amount": "2", "reference_id": 12}, {"price": "100", "amount": "1"}],
            "asks": [{"price": "101", "amount": "3"}]
        }"#;
        let snapshot: BookSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.bids.len(), 2);
        assert_eq!(snapshot.bids[0].reference_id, 12);
        assert_eq!(snapshot.best_bid(), Some(dec!(100)));
        assert_eq!(snapshot.best_ask(), Some(dec!(101)));
    }
}
