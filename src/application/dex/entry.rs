//! Entry preconditions (spec §4.3 "Entry preconditions", evaluated in
//! order; first failure skips the candidate).

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::config::Config;
use crate::domain::dex::{CooldownEntry, DexCandidate, DexPosition, StopLossEvent, Tier};
use crate::domain::state::AgentState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySkipReason {
    AlreadyHeld,
    MomentumTooLow,
    NoBreakoutPump,
    InsufficientLegitimacy,
    CooldownActive,
    CircuitBreakerActive,
    DrawdownPaused,
    TierFull,
    ChartScoreTooLow,
}

/// Whether a stop-loss cooldown allows re-entry right now (spec §4.3 point
/// 3; §8 "Cooldown re-entry" property test).
pub fn cooldown_allows_reentry(
    cooldown: &CooldownEntry,
    current_price: Decimal,
    momentum_score: f64,
    now: DateTime<Utc>,
    cfg: &Config,
) -> bool {
    let recovery_threshold =
        cooldown.exit_price * (Decimal::ONE + Decimal::from_f64(cfg.reentry_recovery_pct / 100.0).unwrap_or_default());
    if current_price >= recovery_threshold {
        return true;
    }

    let elapsed_minutes = now.signed_duration_since(cooldown.exit_time).num_minutes();
    if momentum_score >= cfg.reentry_min_momentum && elapsed_minutes >= cfg.reentry_min_elapsed_minutes
    {
        return true;
    }

    now >= cooldown.fallback_expiry
}

/// Whether the circuit breaker should early-clear (spec §4.3 "Circuit
/// breaker" two conditions, each gated by `breaker_min_cooldown_minutes`).
pub fn breaker_should_clear(
    state: &AgentState,
    cfg: &Config,
    now: DateTime<Utc>,
    live_prices: &std::collections::HashMap<String, Decimal>,
) -> bool {
    let Some(until) = state.dex_circuit_breaker_until else {
        return true;
    };
    if now >= until {
        return true;
    }

    let breaker_started = until
        - chrono::Duration::hours(cfg.circuit_breaker_pause_hours);
    let elapsed_minutes = now.signed_duration_since(breaker_started).num_minutes();
    if elapsed_minutes < cfg.breaker_min_cooldown_minutes {
        return false;
    }

    let any_position_recovered = state.dex_positions.values().any(|pos| {
        let price = live_prices.get(&pos.token_address).copied().unwrap_or(pos.peak_price);
        pos.pl_pct(price) > 0.0
    });
    if any_position_recovered {
        return true;
    }

    let strong_signal_not_held = state.dex_signals.iter().any(|c| {
        c.momentum_score >= cfg.reentry_min_momentum && !state.dex_positions.contains_key(&c.token_address)
    });
    strong_signal_not_held
}

/// Append a stop-loss event and recompute whether the breaker should now
/// trip (spec §4.3 "Circuit breaker": N losses within the rolling window).
pub fn record_stop_loss_and_maybe_trip(state: &mut AgentState, cfg: &Config, symbol: &str, now: DateTime<Utc>) {
    state.dex_recent_stop_losses.push(StopLossEvent {
        timestamp: now,
        symbol: symbol.to_string(),
    });

    let window_start = now - chrono::Duration::hours(cfg.circuit_breaker_window_hours);
    state.dex_recent_stop_losses.retain(|e| e.timestamp >= window_start);

    if state.dex_recent_stop_losses.len() as u32 >= cfg.circuit_breaker_losses {
        state.dex_circuit_breaker_until = Some(now + chrono::Duration::hours(cfg.circuit_breaker_pause_hours));
    }
}

pub fn tier_at_capacity(state: &AgentState, cfg: &Config, tier: Tier) -> bool {
    match tier.fixed_max_concurrent() {
        Some(max) => {
            let count = state.dex_positions.values().filter(|p| p.tier == tier).count();
            count >= max
        }
        None => {
            let shared_count = state
                .dex_positions
                .values()
                .filter(|p| matches!(p.tier, Tier::Early | Tier::Established))
                .count();
            shared_count >= cfg.dex_max_positions
        }
    }
}

/// First-failing precondition for a scanned candidate, or `None` if entry
/// may proceed (spec §4.3 "Entry preconditions", evaluated in order).
pub fn first_failing_precondition(
    state: &AgentState,
    cfg: &Config,
    candidate: &DexCandidate,
    now: DateTime<Utc>,
    live_prices: &std::collections::HashMap<String, Decimal>,
) -> Option<EntrySkipReason> {
    if state.dex_positions.contains_key(&candidate.token_address) {
        return Some(EntrySkipReason::AlreadyHeld);
    }
    if candidate.momentum_score < cfg.dex_entry_min_momentum_score {
        return Some(EntrySkipReason::MomentumTooLow);
    }
    if candidate.tier == Tier::Breakout && !candidate.price_change_5m.is_some_and(|pct| pct >= 50.0) {
        return Some(EntrySkipReason::NoBreakoutPump);
    }
    if candidate.tier == Tier::Early && candidate.legitimacy_score < cfg.early_min_legitimacy {
        return Some(EntrySkipReason::InsufficientLegitimacy);
    }
    if let Some(cooldown) = state.dex_stop_loss_cooldowns.get(&candidate.token_address) {
        let current_price = Decimal::from_f64(candidate.price_usd).unwrap_or(Decimal::ZERO);
        if !cooldown_allows_reentry(cooldown, current_price, candidate.momentum_score, now, cfg) {
            return Some(EntrySkipReason::CooldownActive);
        }
    }
    if !breaker_should_clear(state, cfg, now, live_prices) {
        return Some(EntrySkipReason::CircuitBreakerActive);
    }
    if state.dex_drawdown_paused {
        return Some(EntrySkipReason::DrawdownPaused);
    }
    if tier_at_capacity(state, cfg, candidate.tier) {
        return Some(EntrySkipReason::TierFull);
    }
    None
}

/// Remove cooldown entries older than 24h (spec §4.3 "Cooldown hygiene",
/// run once per tick).
pub fn prune_stale_cooldowns(state: &mut AgentState, cfg: &Config, now: DateTime<Utc>) {
    let max_age = chrono::Duration::hours(cfg.cooldown_max_age_hours);
    state
        .dex_stop_loss_cooldowns
        .retain(|_, entry| now.signed_duration_since(entry.exit_time) < max_age);
}

/// Build and insert a new [`DexPosition`] after sizing/slippage has been
/// resolved (spec §3 "DexPosition" invariant).
#[allow(clippy::too_many_arguments)]
pub fn open_position(
    state: &mut AgentState,
    candidate: &DexCandidate,
    entry_price: Decimal,
    stake_sol: Decimal,
    token_amount: Decimal,
    now: DateTime<Utc>,
) {
    let position = DexPosition::new(
        candidate.token_address.clone(),
        candidate.symbol.clone(),
        entry_price,
        stake_sol,
        now,
        token_amount,
        candidate.momentum_score,
        candidate.liquidity_usd,
        candidate.tier,
    );
    state.dex_positions.insert(candidate.token_address.clone(), position);
    state.dex_paper_balance_sol -= stake_sol;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cfg() -> Config {
        Config::from_env().unwrap()
    }

    #[test]
    fn cooldown_allows_reentry_on_price_recovery() {
        let cooldown = CooldownEntry {
            exit_price: dec!(0.50),
            exit_time: Utc::now() - chrono::Duration::minutes(1),
            fallback_expiry: Utc::now() + chrono::Duration::hours(4),
        };
        let mut c = cfg();
        c.reentry_recovery_pct = 15.0;
        // 0.58 >= 0.50 * 1.15 = 0.575
        assert!(cooldown_allows_reentry(&cooldown, dec!(0.58), 10.0, Utc::now(), &c));
    }

    #[test]
    fn cooldown_blocks_when_no_condition_met() {
        let cooldown = CooldownEntry {
            exit_price: dec!(0.50),
            exit_time: Utc::now(),
            fallback_expiry: Utc::now() + chrono::Duration::hours(4),
        };
        let mut c = cfg();
        c.reentry_recovery_pct = 15.0;
        c.reentry_min_momentum = 70.0;
        c.reentry_min_elapsed_minutes = 5;
        assert!(!cooldown_allows_reentry(&cooldown, dec!(0.58), 62.0, Utc::now(), &c));
    }

    #[test]
    fn cooldown_allows_via_momentum_path_after_min_elapsed() {
        let cooldown = CooldownEntry {
            exit_price: dec!(0.50),
            exit_time: Utc::now() - chrono::Duration::minutes(6),
            fallback_expiry: Utc::now() + chrono::Duration::hours(4),
        };
        let mut c = cfg();
        c.reentry_recovery_pct = 15.0;
        c.reentry_min_momentum = 70.0;
        c.reentry_min_elapsed_minutes = 5;
        assert!(cooldown_allows_reentry(&cooldown, dec!(0.58), 72.0, Utc::now(), &c));
    }

    #[test]
    fn cooldown_allows_via_fallback_expiry() {
        let cooldown = CooldownEntry {
            exit_price: dec!(0.50),
            exit_time: Utc::now() - chrono::Duration::hours(5),
            fallback_expiry: Utc::now() - chrono::Duration::minutes(1),
        };
        let c = cfg();
        assert!(cooldown_allows_reentry(&cooldown, dec!(0.10), 1.0, Utc::now(), &c));
    }

    fn candidate(tier: Tier, momentum: f64) -> DexCandidate {
        DexCandidate {
            token_address: "addr".into(),
            symbol: "FOO".into(),
            name: "Foo".into(),
            url: "".into(),
            price_usd: 1.0,
            price_change_5m: None,
            price_change_6h: 0.0,
            price_change_24h: 0.0,
            volume_24h: 0.0,
            liquidity_usd: 1_000_000.0,
            age_hours: 5.0,
            age_days: 0.2,
            momentum_score: momentum,
            legitimacy_score: 80.0,
            tier,
            dex_id: "raydium".into(),
        }
    }

    #[test]
    fn breakout_without_5m_pump_is_skipped() {
        let state = AgentState::new(cfg());
        let mut c = candidate(Tier::Breakout, 90.0);
        c.price_change_5m = Some(20.0);
        let live_prices = std::collections::HashMap::new();
        assert_eq!(
            first_failing_precondition(&state, &cfg(), &c, Utc::now(), &live_prices),
            Some(EntrySkipReason::NoBreakoutPump)
        );
    }

    #[test]
    fn breakout_with_5m_pump_passes() {
        let state = AgentState::new(cfg());
        let mut c = candidate(Tier::Breakout, 90.0);
        c.price_change_5m = Some(55.0);
        let live_prices = std::collections::HashMap::new();
        assert_eq!(first_failing_precondition(&state, &cfg(), &c, Utc::now(), &live_prices), None);
    }

    #[test]
    fn early_below_min_legitimacy_is_skipped() {
        let mut config = cfg();
        config.early_min_legitimacy = 40.0;
        let state = AgentState::new(config.clone());
        let mut c = candidate(Tier::Early, 90.0);
        c.legitimacy_score = 30.0;
        let live_prices = std::collections::HashMap::new();
        assert_eq!(
            first_failing_precondition(&state, &config, &c, Utc::now(), &live_prices),
            Some(EntrySkipReason::InsufficientLegitimacy)
        );
    }

    #[test]
    fn early_at_or_above_min_legitimacy_passes() {
        let mut config = cfg();
        config.early_min_legitimacy = 40.0;
        let state = AgentState::new(config.clone());
        let mut c = candidate(Tier::Early, 90.0);
        c.legitimacy_score = 40.0;
        let live_prices = std::collections::HashMap::new();
        assert_eq!(first_failing_precondition(&state, &config, &c, Utc::now(), &live_prices), None);
    }
}
