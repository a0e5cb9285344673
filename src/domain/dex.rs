//! DEX paper-trading domain types (spec §3, §4.3): positions, tiers, trade
//! ledger and exit reasons. Grounded on the teacher's state-machine style in
//! `application/risk_management/{circuit_breaker_service,trailing_stops}.rs`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum Tier {
    Microspray,
    Breakout,
    Lottery,
    Early,
    Established,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Microspray => "microspray",
            Tier::Breakout => "breakout",
            Tier::Lottery => "lottery",
            Tier::Early => "early",
            Tier::Established => "established",
        }
    }

    /// Default max concurrent positions per tier (spec §4.3 table); `Early`
    /// and `Established` share the global `max_positions` budget instead.
    pub fn fixed_max_concurrent(self) -> Option<usize> {
        match self {
            Tier::Microspray => Some(10),
            Tier::Breakout => Some(5),
            Tier::Lottery => Some(5),
            Tier::Early | Tier::Established => None,
        }
    }

    /// Whether lost-momentum and trailing-stop use the tier's "fast" profile
    /// (lottery_trailing_activation/20% distance) vs the standard profile.
    pub fn uses_lottery_trailing_profile(self) -> bool {
        matches!(self, Tier::Lottery | Tier::Microspray | Tier::Breakout)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    TrailingStop,
    LostMomentum,
    Manual,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::TakeProfit => "take_profit",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::LostMomentum => "lost_momentum",
            ExitReason::Manual => "manual",
        }
    }

    /// Whether this exit reason starts a stop-loss cooldown (spec §4.3
    /// "On exit" + invariant 3: only stop_loss/trailing_stop).
    pub fn starts_cooldown(self) -> bool {
        matches!(self, ExitReason::StopLoss | ExitReason::TrailingStop)
    }

    /// Whether this exit counts toward the circuit breaker's rolling window
    /// (spec §4.3 "Circuit breaker": "On every stop_loss").
    pub fn counts_toward_breaker(self) -> bool {
        matches!(self, ExitReason::StopLoss)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SlippageModel {
    None,
    Conservative,
    Realistic,
}

impl SlippageModel {
    /// `(base, multiplier)` per spec §4.3.
    pub fn params(self) -> (f64, f64) {
        match self {
            SlippageModel::None => (0.0, 0.0),
            SlippageModel::Conservative => (0.005, 2.0),
            SlippageModel::Realistic => (0.01, 5.0),
        }
    }
}

/// `slippage = base + (position_usd / max(liquidity_usd,1)) * multiplier`,
/// capped at 15% (spec §4.3).
pub fn slippage_fraction(model: SlippageModel, position_usd: f64, liquidity_usd: f64) -> f64 {
    let (base, multiplier) = model.params();
    let denom = liquidity_usd.max(1.0);
    (base + (position_usd / denom) * multiplier).min(0.15).max(0.0)
}

/// Buys inflate, sells deflate the execution price.
pub fn apply_slippage(mid_price: f64, fraction: f64, is_buy: bool) -> f64 {
    if is_buy {
        mid_price * (1.0 + fraction)
    } else {
        mid_price * (1.0 - fraction)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexPosition {
    pub token_address: String,
    pub symbol: String,
    pub entry_price: Decimal,
    pub entry_stake_sol: Decimal,
    pub entry_time: DateTime<Utc>,
    pub token_amount: Decimal,
    pub peak_price: Decimal,
    pub entry_momentum_score: f64,
    pub entry_liquidity: f64,
    pub tier: Tier,
    pub missed_scans: u32,
}

impl DexPosition {
    pub fn new(
        token_address: impl Into<String>,
        symbol: impl Into<String>,
        entry_price: Decimal,
        entry_stake_sol: Decimal,
        entry_time: DateTime<Utc>,
        token_amount: Decimal,
        entry_momentum_score: f64,
        entry_liquidity: f64,
        tier: Tier,
    ) -> Self {
        Self {
            token_address: token_address.into(),
            symbol: symbol.into(),
            entry_price,
            entry_stake_sol,
            entry_time,
            token_amount,
            peak_price: entry_price,
            entry_momentum_score,
            entry_liquidity,
            tier,
            missed_scans: 0,
        }
    }

    /// Mark the peak price, enforcing the non-decreasing invariant (spec
    /// invariant 2).
    pub fn observe_price(&mut self, price: Decimal) {
        if price > self.peak_price {
            self.peak_price = price;
        }
    }

    pub fn pl_pct(&self, current_price: Decimal) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        if self.entry_price.is_zero() {
            return 0.0;
        }
        ((current_price - self.entry_price) / self.entry_price * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0)
    }

    pub fn peak_gain_pct(&self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        if self.entry_price.is_zero() {
            return 0.0;
        }
        ((self.peak_price - self.entry_price) / self.entry_price * Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0)
    }

    pub fn mark_to_market_usd(&self, current_price: Decimal) -> Decimal {
        self.token_amount * current_price
    }
}

/// Immutable ledger row written at exit (spec §3 "DexTradeRecord").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexTradeRecord {
    pub symbol: String,
    pub token_address: String,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub entry_stake_sol: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub pnl_pct: f64,
    pub pnl_sol: Decimal,
    pub exit_reason: ExitReason,
}

/// Per-token stop-loss cooldown entry (spec §3, §4.3 "Stop-loss cooldown").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownEntry {
    pub exit_price: Decimal,
    pub exit_time: DateTime<Utc>,
    pub fallback_expiry: DateTime<Utc>,
}

/// A recent stop-loss event tracked for the circuit breaker's rolling window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopLossEvent {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
}

/// A scanned momentum candidate, as returned by the DEX provider port (spec
/// §6 "DEX provider").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexCandidate {
    pub token_address: String,
    pub symbol: String,
    pub name: String,
    pub url: String,
    pub price_usd: f64,
    pub price_change_5m: Option<f64>,
    pub price_change_6h: f64,
    pub price_change_24h: f64,
    pub volume_24h: f64,
    pub liquidity_usd: f64,
    pub age_hours: f64,
    pub age_days: f64,
    pub momentum_score: f64,
    pub legitimacy_score: f64,
    pub tier: Tier,
    pub dex_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn slippage_is_capped_at_15_pct() {
        let f = slippage_fraction(SlippageModel::Realistic, 1_000_000.0, 100.0);
        assert_eq!(f, 0.15);
    }

    #[test]
    fn slippage_monotonic_in_position_size() {
        let liquidity = 50_000.0;
        let mut last = 0.0;
        for usd in [100.0, 1_000.0, 5_000.0, 20_000.0, 80_000.0] {
            let f = slippage_fraction(SlippageModel::Realistic, usd, liquidity);
            assert!(f >= last, "slippage should not decrease as size grows");
            assert!((0.0..=0.15).contains(&f));
            last = f;
        }
    }

    #[test]
    fn buy_inflates_sell_deflates() {
        let buy = apply_slippage(1.0, 0.05, true);
        let sell = apply_slippage(1.0, 0.05, false);
        assert!(buy > 1.0);
        assert!(sell < 1.0);
    }

    #[test]
    fn observe_price_is_monotonic() {
        let mut pos = DexPosition::new(
            "addr",
            "FOO",
            dec!(1.0),
            dec!(0.01),
            Utc::now(),
            dec!(100),
            70.0,
            20000.0,
            Tier::Lottery,
        );
        pos.observe_price(dec!(1.8));
        pos.observe_price(dec!(1.3));
        assert_eq!(pos.peak_price, dec!(1.8));
    }

    #[test]
    fn mark_to_market_usd_is_token_amount_times_price() {
        // A $200 entry price has no bearing on the USD mark at a later
        // price: 100 tokens at $2 is $200, full stop, regardless of
        // `entry_price` or the SOL/USD rate.
        let pos = DexPosition::new(
            "addr",
            "FOO",
            dec!(200.0),
            dec!(1.0),
            Utc::now(),
            dec!(100),
            70.0,
            20000.0,
            Tier::Lottery,
        );
        assert_eq!(pos.mark_to_market_usd(dec!(2.0)), dec!(200.0));
    }

    #[test]
    fn exit_reason_cooldown_gating() {
        assert!(ExitReason::StopLoss.starts_cooldown());
        assert!(ExitReason::TrailingStop.starts_cooldown());
        assert!(!ExitReason::TakeProfit.starts_cooldown());
        assert!(!ExitReason::LostMomentum.starts_cooldown());
    }
}
