//! Equity/crypto position bookkeeping (spec §3 "PositionEntry").

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionEntry {
    pub symbol: String,
    pub entry_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub entry_sentiment: f64,
    pub entry_social_volume: u64,
    pub entry_sources: Vec<String>,
    pub entry_reason: String,
    pub peak_price: Decimal,
    pub peak_sentiment: f64,
}

impl PositionEntry {
    pub fn new(
        symbol: impl Into<String>,
        entry_time: DateTime<Utc>,
        entry_price: Decimal,
        entry_sentiment: f64,
        entry_social_volume: u64,
        entry_sources: Vec<String>,
        entry_reason: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            entry_time,
            entry_price,
            entry_sentiment,
            entry_social_volume,
            entry_sources,
            entry_reason: entry_reason.into(),
            peak_price: entry_price,
            peak_sentiment: entry_sentiment,
        }
    }

    /// Track the running peak price/sentiment (non-decreasing), used by
    /// staleness scoring and trailing-stop style exits on the equity book.
    pub fn observe(&mut self, price: Decimal, sentiment: f64) {
        if price > self.peak_price {
            self.peak_price = price;
        }
        if sentiment > self.peak_sentiment {
            self.peak_sentiment = sentiment;
        }
    }

    pub fn hold_duration(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.entry_time)
    }

    pub fn pl_pct(&self, current_price: Decimal) -> f64 {
        if self.entry_price.is_zero() {
            return 0.0;
        }
        ((current_price - self.entry_price) / self.entry_price * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn observe_keeps_peak_monotonic() {
        let mut pos = PositionEntry::new(
            "AAPL",
            Utc::now(),
            dec!(100),
            0.5,
            10,
            vec!["wsb".into()],
            "sentiment spike",
        );
        pos.observe(dec!(110), 0.8);
        pos.observe(dec!(105), 0.3);
        assert_eq!(pos.peak_price, dec!(110));
        assert_eq!(pos.peak_sentiment, 0.8);
    }

    #[test]
    fn pl_pct_computes_percent_gain() {
        let pos = PositionEntry::new(
            "AAPL",
            Utc::now(),
            dec!(100),
            0.5,
            10,
            vec![],
            "test",
        );
        assert!((pos.pl_pct(dec!(110)) - 10.0).abs() < 1e-9);
    }
}
