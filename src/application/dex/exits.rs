//! Exit rule evaluation (spec §4.3 "Exit rules", evaluated each tick per
//! open position; first matching rule wins).

use rust_decimal::Decimal;

use crate::config::Config;
use crate::domain::dex::{DexCandidate, DexPosition, ExitReason, Tier};

#[derive(Debug, Clone, PartialEq)]
pub enum ExitDecision {
    Exit(ExitReason),
    /// Take-profit is eligible but liquidity is too thin to exit safely;
    /// the position stays open and the delay is logged (spec §4.3 rule 3).
    TakeProfitDelayed,
    /// Nothing fires this tick, but `missed_scans` should be incremented
    /// (signal absent from the latest scan) or a decay warning logged.
    Hold,
}

/// Mark-to-market current price/momentum snapshot from the latest scan, or
/// `None` if the token was absent from this tick's scan results.
pub struct LiveSnapshot<'a> {
    pub candidate: Option<&'a DexCandidate>,
    pub current_price: Decimal,
}

/// Evaluate every exit rule for one open position, in spec order. Returns
/// the winning decision plus whether `missed_scans` should be bumped.
pub fn evaluate_exit(
    position: &DexPosition,
    snapshot: &LiveSnapshot<'_>,
    cfg: &Config,
) -> (ExitDecision, bool /* bump_missed_scans */) {
    let pl_pct = position.pl_pct(snapshot.current_price);

    // Rule 1: signal missing from the latest scan.
    if snapshot.candidate.is_none() {
        if pl_pct > 0.0 {
            // Trailing stop remains in charge; do not exit on lost-momentum.
        } else if position.missed_scans + 1 >= cfg.missed_scan_exit_threshold {
            return (ExitDecision::Exit(ExitReason::LostMomentum), true);
        } else {
            return (ExitDecision::Hold, true);
        }
    }

    // Rule 2: momentum decay.
    if let Some(candidate) = snapshot.candidate {
        let decayed = candidate.momentum_score < cfg.momentum_decay_ratio * position.entry_momentum_score;
        if decayed {
            if pl_pct < 0.0 {
                return (ExitDecision::Exit(ExitReason::LostMomentum), false);
            }
            // Underwater check failed: log only, no exit.
        }
    }

    // Rule 3 gate + Rule 4: take profit, subject to the liquidity safety gate.
    let liquidity_usd = snapshot.candidate.map(|c| c.liquidity_usd).unwrap_or(position.entry_liquidity);
    let position_value_usd = super::sizing::decimal_to_f64(position.token_amount)
        * super::sizing::decimal_to_f64(snapshot.current_price);
    let can_safely_exit = liquidity_usd >= cfg.liquidity_safety_multiplier * position_value_usd;

    if pl_pct >= cfg.take_profit_pct {
        if can_safely_exit {
            return (ExitDecision::Exit(ExitReason::TakeProfit), false);
        }
        return (ExitDecision::TakeProfitDelayed, false);
    }

    // Rule 5: trailing stop (never blocked by the liquidity gate).
    let (activation_pct, distance_pct) = if position.tier.uses_lottery_trailing_profile() {
        (cfg.lottery_trailing_activation_pct, cfg.lottery_trailing_distance_pct)
    } else {
        (cfg.trailing_stop_activation_pct, cfg.trailing_stop_distance_pct)
    };
    let peak_gain_pct = position.peak_gain_pct();
    let trailing_activated = peak_gain_pct >= activation_pct;
    if trailing_activated {
        let trigger_price = super::sizing::decimal_to_f64(position.peak_price) * (1.0 - distance_pct / 100.0);
        if super::sizing::decimal_to_f64(snapshot.current_price) <= trigger_price {
            return (ExitDecision::Exit(ExitReason::TrailingStop), false);
        }
    }

    // Rule 6: fixed stop loss, only if trailing hasn't activated (never
    // blocked by the liquidity gate).
    if !trailing_activated && pl_pct <= -cfg.dex_stop_loss_pct {
        return (ExitDecision::Exit(ExitReason::StopLoss), false);
    }

    (ExitDecision::Hold, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dex::DexCandidate;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn base_cfg() -> Config {
        let mut cfg = Config::from_env().unwrap();
        cfg.take_profit_pct = 100.0;
        cfg.trailing_stop_activation_pct = 50.0;
        cfg.trailing_stop_distance_pct = 25.0;
        cfg.dex_stop_loss_pct = 20.0;
        cfg.liquidity_safety_multiplier = 5.0;
        cfg.momentum_decay_ratio = 0.4;
        cfg.missed_scan_exit_threshold = 10;
        cfg
    }

    fn candidate(price: f64, momentum: f64) -> DexCandidate {
        DexCandidate {
            token_address: "addr".into(),
            symbol: "FOO".into(),
            name: "Foo".into(),
            url: "".into(),
            price_usd: price,
            price_change_5m: None,
            price_change_6h: 0.0,
            price_change_24h: 0.0,
            volume_24h: 0.0,
            liquidity_usd: 1_000_000.0,
            age_hours: 5.0,
            age_days: 0.2,
            momentum_score: momentum,
            legitimacy_score: 80.0,
            tier: Tier::Lottery,
            dex_id: "raydium".into(),
        }
    }

    #[test]
    fn scenario_trailing_stop_fires_not_take_profit() {
        // Scenario 1: $1 -> $1.80 -> $1.34; expect trailing_stop near $1.35,
        // not take_profit (100% threshold removed from the runner path).
        let mut position = DexPosition::new(
            "addr",
            "FOO",
            dec!(1.00),
            dec!(0.02),
            Utc::now(),
            dec!(100),
            70.0,
            20000.0,
            Tier::Established,
        );
        position.observe_price(dec!(1.80));

        let cfg = base_cfg();
        let cand = candidate(1.34, 70.0);
        let snapshot = LiveSnapshot {
            candidate: Some(&cand),
            current_price: dec!(1.34),
        };
        let (decision, _) = evaluate_exit(&position, &snapshot, &cfg);
        assert_eq!(decision, ExitDecision::Exit(ExitReason::TrailingStop));
    }

    #[test]
    fn take_profit_delayed_when_liquidity_too_thin() {
        let position = DexPosition::new(
            "addr",
            "FOO",
            dec!(1.00),
            dec!(0.02),
            Utc::now(),
            dec!(100),
            70.0,
            20000.0,
            Tier::Lottery,
        );
        let mut cfg = base_cfg();
        cfg.take_profit_pct = 50.0;
        let mut cand = candidate(2.0, 70.0);
        cand.liquidity_usd = 10.0; // thin: 100 tokens * $2 = $200 value, need 5x = $1000
        let snapshot = LiveSnapshot {
            candidate: Some(&cand),
            current_price: dec!(2.0),
        };
        let (decision, _) = evaluate_exit(&position, &snapshot, &cfg);
        assert_eq!(decision, ExitDecision::TakeProfitDelayed);
    }

    #[test]
    fn stop_loss_never_blocked_by_liquidity_gate() {
        let position = DexPosition::new(
            "addr",
            "FOO",
            dec!(1.00),
            dec!(0.02),
            Utc::now(),
            dec!(100),
            70.0,
            20000.0,
            Tier::Lottery,
        );
        let mut cfg = base_cfg();
        let mut cand = candidate(0.75, 70.0);
        cand.liquidity_usd = 1.0;
        let snapshot = LiveSnapshot {
            candidate: Some(&cand),
            current_price: dec!(0.75),
        };
        cfg.dex_stop_loss_pct = 20.0;
        let (decision, _) = evaluate_exit(&position, &snapshot, &cfg);
        assert_eq!(decision, ExitDecision::Exit(ExitReason::StopLoss));
    }

    #[test]
    fn missing_signal_in_profit_does_not_lost_momentum_exit() {
        let mut position = DexPosition::new(
            "addr",
            "FOO",
            dec!(1.00),
            dec!(0.02),
            Utc::now(),
            dec!(100),
            70.0,
            20000.0,
            Tier::Lottery,
        );
        position.observe_price(dec!(1.10));
        let cfg = base_cfg();
        let snapshot = LiveSnapshot {
            candidate: None,
            current_price: dec!(1.10),
        };
        let (decision, bump) = evaluate_exit(&position, &snapshot, &cfg);
        assert_eq!(decision, ExitDecision::Hold);
        assert!(bump);
    }

    #[test]
    fn missing_signal_underwater_exits_after_threshold_misses() {
        let mut position = DexPosition::new(
            "addr",
            "FOO",
            dec!(1.00),
            dec!(0.02),
            Utc::now(),
            dec!(100),
            70.0,
            20000.0,
            Tier::Lottery,
        );
        position.missed_scans = 9;
        let cfg = base_cfg();
        let snapshot = LiveSnapshot {
            candidate: None,
            current_price: dec!(0.90),
        };
        let (decision, _) = evaluate_exit(&position, &snapshot, &cfg);
        assert_eq!(decision, ExitDecision::Exit(ExitReason::LostMomentum));
    }
}
