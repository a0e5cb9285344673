//! Broker-facing trading primitives (spec §6 "Broker adapter").

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    Day,
    Gtc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetClass {
    UsEquity,
    Crypto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    /// Notional dollar amount (spec §4.4 "Notional market order"). `qty` is
    /// used instead when sizing in shares/coins is more natural (sells).
    pub notional: Option<Decimal>,
    pub qty: Option<Decimal>,
    pub time_in_force: TimeInForce,
    pub limit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub cash: Decimal,
    pub equity: Decimal,
    pub daytrade_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub qty: Decimal,
    pub market_value: Decimal,
    pub current_price: Decimal,
    pub unrealized_pl: Decimal,
    pub unrealized_plpc: f64,
    pub avg_entry_price: Decimal,
    pub asset_class: AssetClass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketClock {
    pub is_open: bool,
    pub now: DateTime<Utc>,
    pub next_open: DateTime<Utc>,
    pub next_close: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetInfo {
    pub symbol: String,
    pub exchange: String,
    pub tradable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub symbol: String,
    pub price: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionRight {
    Call,
    Put,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionContract {
    pub symbol: String,
    pub underlying: String,
    pub expiration: chrono::NaiveDate,
    pub strike: Decimal,
    pub right: OptionRight,
    pub delta: Option<f64>,
    pub bid: Decimal,
    pub ask: Decimal,
}

/// An open options contract position (spec §4.7 "options sub-flow"), booked
/// separately from [`Position`] since it is sized in contracts, not shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionPosition {
    pub contract_symbol: String,
    pub underlying: String,
    pub expiration: chrono::NaiveDate,
    pub strike: Decimal,
    pub right: OptionRight,
    pub entry_time: DateTime<Utc>,
    pub entry_mid_price: Decimal,
    pub contracts: u32,
}

impl OptionPosition {
    pub fn pl_pct(&self, current_mid: Decimal) -> f64 {
        if self.entry_mid_price.is_zero() {
            return 0.0;
        }
        ((current_mid - self.entry_mid_price) / self.entry_mid_price * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn option_position_pl_pct() {
        let pos = OptionPosition {
            contract_symbol: "FOO260130C00100000".into(),
            underlying: "FOO".into(),
            expiration: chrono::NaiveDate::from_ymd_opt(2026, 1, 30).unwrap(),
            strike: dec!(100),
            right: OptionRight::Call,
            entry_time: Utc::now(),
            entry_mid_price: dec!(2.00),
            contracts: 3,
        };
        assert!((pos.pl_pct(dec!(3.00)) - 50.0).abs() < 1e-9);
    }
}
