//! Derived DEX trading metrics (spec §4.3 "Derived on read") and the
//! streak/drawdown updater run after every trade. Metrics are always
//! recomputed from `dex_trade_history` — "no running sums trusted" — so
//! [`calculate_metrics`] is a pure function of the trade slice (spec §8
//! "Metrics idempotence").

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::dex::{DexTradeRecord, ExitReason};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DexTradingMetrics {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    pub expectancy: f64,
    pub profit_factor: f64,
    pub sharpe: f64,
}

/// Recompute every derived metric from the trade history alone (spec §4.3,
/// §8 "Metrics idempotence": `calculateDexTradingMetrics(history)` depends
/// only on history and state counters, no time).
pub fn calculate_metrics(history: &[DexTradeRecord]) -> DexTradingMetrics {
    if history.is_empty() {
        return DexTradingMetrics::default();
    }

    let wins: Vec<&DexTradeRecord> = history.iter().filter(|t| t.pnl_pct > 0.0).collect();
    let losses: Vec<&DexTradeRecord> = history.iter().filter(|t| t.pnl_pct <= 0.0).collect();

    let total = history.len();
    let win_rate = wins.len() as f64 / total as f64;

    let avg_win_pct = if wins.is_empty() {
        0.0
    } else {
        wins.iter().map(|t| t.pnl_pct).sum::<f64>() / wins.len() as f64
    };
    let avg_loss_pct = if losses.is_empty() {
        0.0
    } else {
        losses.iter().map(|t| t.pnl_pct).sum::<f64>() / losses.len() as f64
    };

    // expectancy = wr*aw - (1-wr)*|al|
    let expectancy = win_rate * avg_win_pct - (1.0 - win_rate) * avg_loss_pct.abs();

    let win_sol: Decimal = wins.iter().map(|t| t.pnl_sol).filter(|p| *p > Decimal::ZERO).sum();
    let loss_sol: Decimal = losses
        .iter()
        .map(|t| t.pnl_sol)
        .filter(|p| *p < Decimal::ZERO)
        .sum::<Decimal>()
        .abs();
    let profit_factor = if loss_sol.is_zero() {
        if win_sol.is_zero() {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        (win_sol / loss_sol).to_f64().unwrap_or(0.0)
    };

    let returns: Vec<f64> = history.iter().map(|t| t.pnl_pct).collect();
    let sharpe = sharpe_ratio(&returns);

    DexTradingMetrics {
        total_trades: total,
        wins: wins.len(),
        losses: losses.len(),
        win_rate,
        avg_win_pct,
        avg_loss_pct,
        expectancy,
        profit_factor,
        sharpe,
    }
}

fn sharpe_ratio(returns: &[f64]) -> f64 {
    use statrs::statistics::{Data, Distribution};
    if returns.len() < 2 {
        return 0.0;
    }
    let data = Data::new(returns.to_vec());
    let (Some(mean), Some(stdev)) = (data.mean(), data.std_dev()) else {
        return 0.0;
    };
    if stdev == 0.0 {
        0.0
    } else {
        mean / stdev
    }
}

/// Running streak/drawdown counters, updated after every closed trade (spec
/// §4.3 "Streak & drawdown metrics"). Replaying the full trade history
/// through this function from scratch must reproduce the same
/// `max_consecutive_losses`/`max_drawdown_pct` as incremental updates (spec
/// §8 "Streak roundtrip").
#[derive(Debug, Clone, Default)]
pub struct StreakState {
    pub current_loss_streak: u32,
    pub max_consecutive_losses: u32,
    pub peak_balance: Decimal,
    pub max_drawdown_pct: f64,
    pub max_drawdown_duration_ms: i64,
    pub drawdown_start_time: Option<DateTime<Utc>>,
}

impl StreakState {
    pub fn starting_at(balance: Decimal) -> Self {
        Self {
            peak_balance: balance,
            ..Default::default()
        }
    }

    /// Apply one closed trade's effect on the running balance and streak.
    pub fn record_trade(&mut self, trade: &DexTradeRecord, balance_after: Decimal, now: DateTime<Utc>) {
        if trade.pnl_sol < Decimal::ZERO {
            self.current_loss_streak += 1;
            self.max_consecutive_losses = self.max_consecutive_losses.max(self.current_loss_streak);
        } else {
            self.current_loss_streak = 0;
        }

        if balance_after > self.peak_balance {
            if let Some(start) = self.drawdown_start_time.take() {
                let duration = now.signed_duration_since(start).num_milliseconds();
                self.max_drawdown_duration_ms = self.max_drawdown_duration_ms.max(duration);
            }
            self.peak_balance = balance_after;
        } else if !self.peak_balance.is_zero() {
            let dd = ((self.peak_balance - balance_after) / self.peak_balance
                * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0);
            self.max_drawdown_pct = self.max_drawdown_pct.max(dd);
            if self.drawdown_start_time.is_none() {
                self.drawdown_start_time = Some(now);
            }
        }
    }

    /// Replay a full trade history from a known starting balance, used both
    /// to seed state on load and to property-test idempotence (spec §8).
    pub fn replay(history: &[DexTradeRecord], starting_balance: Decimal) -> Self {
        let mut state = Self::starting_at(starting_balance);
        let mut balance = starting_balance;
        for trade in history {
            balance += trade.pnl_sol;
            state.record_trade(trade, balance, trade.exit_time);
        }
        state
    }
}

/// Whether `exit_reason` should feed the rolling circuit-breaker window
/// (spec §4.3 "Circuit breaker": "On every stop_loss").
pub fn counts_toward_breaker(reason: ExitReason) -> bool {
    reason.counts_toward_breaker()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn trade(pnl_pct: f64, pnl_sol: Decimal, reason: ExitReason) -> DexTradeRecord {
        DexTradeRecord {
            symbol: "FOO".into(),
            token_address: "addr".into(),
            entry_price: dec!(1.0),
            exit_price: dec!(1.0),
            entry_stake_sol: dec!(0.1),
            entry_time: Utc::now(),
            exit_time: Utc::now(),
            pnl_pct,
            pnl_sol,
            exit_reason: reason,
        }
    }

    #[test]
    fn metrics_empty_history_is_zeroed() {
        let m = calculate_metrics(&[]);
        assert_eq!(m.total_trades, 0);
        assert_eq!(m.win_rate, 0.0);
    }

    #[test]
    fn profit_factor_and_expectancy_match_formula() {
        let history = vec![
            trade(50.0, dec!(0.05), ExitReason::TakeProfit),
            trade(-20.0, dec!(-0.02), ExitReason::StopLoss),
        ];
        let m = calculate_metrics(&history);
        assert_eq!(m.win_rate, 0.5);
        assert!((m.avg_win_pct - 50.0).abs() < 1e-9);
        assert!((m.avg_loss_pct - (-20.0)).abs() < 1e-9);
        let expected_expectancy = 0.5 * 50.0 - 0.5 * 20.0;
        assert!((m.expectancy - expected_expectancy).abs() < 1e-9);
        assert!((m.profit_factor - 2.5).abs() < 1e-9);
    }

    #[test]
    fn metrics_idempotence_depends_only_on_history() {
        let history = vec![
            trade(10.0, dec!(0.01), ExitReason::TakeProfit),
            trade(-5.0, dec!(-0.005), ExitReason::StopLoss),
            trade(30.0, dec!(0.03), ExitReason::TrailingStop),
        ];
        let m1 = calculate_metrics(&history);
        let m2 = calculate_metrics(&history);
        assert_eq!(m1.win_rate, m2.win_rate);
        assert_eq!(m1.profit_factor, m2.profit_factor);
        assert_eq!(m1.sharpe, m2.sharpe);
    }

    #[test]
    fn streak_roundtrip_matches_incremental_update() {
        let start = dec!(10.0);
        let history = vec![
            trade(-20.0, dec!(-0.2), ExitReason::StopLoss),
            trade(-20.0, dec!(-0.2), ExitReason::StopLoss),
            trade(50.0, dec!(0.5), ExitReason::TakeProfit),
            trade(-10.0, dec!(-0.1), ExitReason::StopLoss),
        ];

        let mut incremental = StreakState::starting_at(start);
        let mut balance = start;
        for t in &history {
            balance += t.pnl_sol;
            incremental.record_trade(t, balance, t.exit_time);
        }

        let replayed = StreakState::replay(&history, start);

        assert_eq!(incremental.max_consecutive_losses, replayed.max_consecutive_losses);
        assert!((incremental.max_drawdown_pct - replayed.max_drawdown_pct).abs() < 1e-9);
        assert_eq!(replayed.max_consecutive_losses, 2);
    }
}
