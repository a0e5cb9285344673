//! The DEX momentum engine tick: scan, evaluate exits, evaluate entries,
//! update drawdown/streak state, record a portfolio snapshot (spec §4.3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::config::Config;
use crate::domain::dex::{CooldownEntry, DexTradeRecord, ExitReason, Tier};
use crate::domain::ports::{ChartAnalyzer, DexProvider, TierFilters};
use crate::domain::state::AgentState;

use super::entry::{self, EntrySkipReason};
use super::exits::{self, ExitDecision, LiveSnapshot};
use super::metrics::StreakState;
use super::sizing;

pub struct DexTickOutcome {
    pub scanned: usize,
    pub opened: Vec<String>,
    pub closed: Vec<(String, ExitReason)>,
    pub logs: Vec<String>,
}

/// Total portfolio value: paper balance + mark-to-market of every open
/// position (spec §4.3 "Drawdown halt").
pub fn total_portfolio_value(
    state: &AgentState,
    sol_usd: Decimal,
    live_prices: &HashMap<String, Decimal>,
) -> Decimal {
    let mtm: Decimal = state
        .dex_positions
        .values()
        .map(|p| {
            let price = live_prices.get(&p.token_address).copied().unwrap_or(p.peak_price);
            let usd = p.mark_to_market_usd(price);
            if sol_usd.is_zero() {
                Decimal::ZERO
            } else {
                usd / sol_usd
            }
        })
        .sum();
    state.dex_paper_balance_sol + mtm
}

/// Update the running peak/drawdown-pause flag (spec §4.3 "Drawdown halt").
pub fn update_drawdown(state: &mut AgentState, cfg: &Config, total_value: Decimal) {
    if total_value > state.dex_peak_value {
        state.dex_peak_value = total_value;
        state.dex_drawdown_paused = false;
        return;
    }
    if state.dex_peak_value.is_zero() {
        return;
    }
    let drawdown_pct = ((state.dex_peak_value - total_value) / state.dex_peak_value
        * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(0.0);
    if drawdown_pct >= cfg.dex_max_drawdown_pct {
        state.dex_drawdown_paused = true;
    }
}

/// Full scan-and-trade pass for one tick (spec §4.1 step 8, §4.3 scan/entry/
/// exit ordering: "DEX exits precede DEX entries").
pub async fn scan_and_trade(
    state: &mut AgentState,
    cfg: &Config,
    provider: &dyn DexProvider,
    chart_analyzer: Option<&dyn ChartAnalyzer>,
    now: DateTime<Utc>,
) -> DexTickOutcome {
    let mut logs = Vec::new();

    let sol_usd = match provider.sol_usd_price().await {
        Ok(p) => p,
        Err(_) => Decimal::from_f64(cfg.sol_usd_fallback).unwrap_or(Decimal::from(200)),
    };

    let candidates = scan_all_tiers(provider, cfg).await;
    let live_prices: HashMap<String, Decimal> = candidates
        .iter()
        .map(|c| (c.token_address.clone(), Decimal::from_f64(c.price_usd).unwrap_or(Decimal::ZERO)))
        .collect();
    state.dex_signals = candidates.clone();

    entry::prune_stale_cooldowns(state, cfg, now);

    // --- Exits first ---
    let mut closed = Vec::new();
    let held_addresses: Vec<String> = state.dex_positions.keys().cloned().collect();
    for address in held_addresses {
        let candidate = candidates.iter().find(|c| c.token_address == address);
        let current_price = candidate
            .map(|c| Decimal::from_f64(c.price_usd).unwrap_or(Decimal::ZERO))
            .unwrap_or_else(|| {
                state
                    .dex_positions
                    .get(&address)
                    .map(|p| p.peak_price)
                    .unwrap_or(Decimal::ZERO)
            });

        if let Some(price) = live_prices.get(&address) {
            if let Some(pos) = state.dex_positions.get_mut(&address) {
                pos.observe_price(*price);
            }
        }

        let position = match state.dex_positions.get(&address) {
            Some(p) => p.clone(),
            None => continue,
        };
        let snapshot = LiveSnapshot {
            candidate,
            current_price,
        };
        let (decision, bump_missed) = exits::evaluate_exit(&position, &snapshot, cfg);

        if bump_missed {
            if let Some(pos) = state.dex_positions.get_mut(&address) {
                pos.missed_scans += 1;
            }
        } else if candidate.is_some() {
            if let Some(pos) = state.dex_positions.get_mut(&address) {
                pos.missed_scans = 0;
            }
        }

        match decision {
            ExitDecision::Exit(reason) => {
                close_position(state, cfg, &address, current_price, reason, now, sol_usd);
                closed.push((position.symbol.clone(), reason));
                logs.push(format!("dex exit {} {} @ {}", position.symbol, reason.as_str(), current_price));
            }
            ExitDecision::TakeProfitDelayed => {
                logs.push(format!("take_profit_delayed_low_liquidity {}", position.symbol));
            }
            ExitDecision::Hold => {}
        }
    }

    // --- Entries next ---
    let mut opened = Vec::new();
    let total_value = total_portfolio_value(state, sol_usd, &live_prices);
    for candidate in &candidates {
        if let Some(reason) = entry::first_failing_precondition(state, cfg, candidate, now, &live_prices) {
            logs.push(format!("dex entry skipped {:?} for {}", reason, candidate.symbol));
            continue;
        }

        if cfg.dex_chart_analysis_enabled {
            if let Some(analyzer) = chart_analyzer {
                match analyzer.analyze_chart(&candidate.token_address, candidate.age_hours).await {
                    Ok(Some(analysis)) if analysis.entry_score < cfg.dex_chart_min_entry_score => {
                        logs.push(format!("dex entry skipped chart_score_low for {}", candidate.symbol));
                        continue;
                    }
                    Ok(_) => {}
                    Err(_) => {
                        logs.push(format!("chart analysis unavailable for {}", candidate.symbol));
                    }
                }
            }
        }

        let balance_f64 = sizing::decimal_to_f64(state.dex_paper_balance_sol);
        let base_stake = super::sizing::base_position_size_sol(cfg, candidate.tier, balance_f64);
        let portfolio_value_f64 = sizing::decimal_to_f64(total_value);
        let Some(outcome) = super::sizing::apply_concentration_cap(cfg, base_stake, portfolio_value_f64) else {
            logs.push(format!("dex entry skipped below_min_viable for {}", candidate.symbol));
            continue;
        };
        if outcome.reduced {
            logs.push(format!("paper_buy_reduced {} to {} SOL", candidate.symbol, outcome.stake_sol));
        }

        let model = super::sizing::slippage_model_from_config(cfg);
        let (exec_price, token_amount) = super::sizing::buy_fill(
            model,
            candidate.price_usd,
            outcome.stake_sol,
            sizing::decimal_to_f64(sol_usd),
            candidate.liquidity_usd,
        );
        let stake_decimal = Decimal::from_f64(outcome.stake_sol).unwrap_or(Decimal::ZERO);
        let gas = Decimal::from_f64(cfg.dex_gas_fee_sol).unwrap_or(Decimal::ZERO);

        if stake_decimal + gas > state.dex_paper_balance_sol {
            logs.push(format!("dex entry skipped insufficient_balance for {}", candidate.symbol));
            continue;
        }

        entry::open_position(state, candidate, exec_price, stake_decimal, token_amount, now);
        state.dex_paper_balance_sol -= gas;
        opened.push(candidate.symbol.clone());
        logs.push(format!("dex entry opened {} tier={} stake={}", candidate.symbol, candidate.tier, stake_decimal));
    }

    let total_value_after = total_portfolio_value(state, sol_usd, &live_prices);
    update_drawdown(state, cfg, total_value_after);
    state.dex_portfolio_history.push((now, total_value_after));

    DexTickOutcome {
        scanned: candidates.len(),
        opened,
        closed,
        logs,
    }
}

/// Force-close every open DEX position at its last-known mark (spec §4.6
/// level 3 "liquidate all equity and DEX positions", §8 invariant 7). No
/// live scan runs during a crisis short-circuit, so each position is closed
/// at its `peak_price` — the same fallback `scan_and_trade` uses when a
/// token is absent from the latest scan.
pub fn liquidate_all(state: &mut AgentState, cfg: &Config, now: DateTime<Utc>, sol_usd: Decimal) -> Vec<String> {
    let addresses: Vec<String> = state.dex_positions.keys().cloned().collect();
    let mut closed = Vec::new();
    for address in addresses {
        let Some(position) = state.dex_positions.get(&address) else { continue };
        let price = position.peak_price;
        let symbol = position.symbol.clone();
        close_position(state, cfg, &address, price, ExitReason::Manual, now, sol_usd);
        closed.push(symbol);
    }
    closed
}

async fn scan_all_tiers(provider: &dyn DexProvider, cfg: &Config) -> Vec<crate::domain::dex::DexCandidate> {
    let tier_specs: [(Tier, f64, f64, f64); 5] = [
        (Tier::Microspray, cfg.microspray_min_liquidity_usd, 0.5, 2.0),
        (Tier::Breakout, cfg.breakout_min_liquidity_usd, 2.0, 6.0),
        (Tier::Lottery, cfg.lottery_min_liquidity_usd, 1.0, 6.0),
        (Tier::Early, cfg.early_min_liquidity_usd, 6.0, 72.0),
        (Tier::Established, cfg.established_min_liquidity_usd, 72.0, 336.0),
    ];

    let futures = tier_specs.iter().map(|(tier, min_liq, min_age, max_age)| {
        let filters = TierFilters {
            tier: *tier,
            min_liquidity_usd: *min_liq,
            min_age_hours: *min_age,
            max_age_hours: *max_age,
        };
        async move {
            match provider.find_momentum_tokens(&filters).await {
                Ok(candidates) => candidates.into_iter().filter(|c| c.tier == *tier).collect(),
                Err(_) => Vec::new(),
            }
        }
    });
    let results: Vec<Vec<_>> = futures::future::join_all(futures).await;
    results.into_iter().flatten().collect()
}

#[allow(clippy::too_many_arguments)]
fn close_position(
    state: &mut AgentState,
    cfg: &Config,
    address: &str,
    current_price: Decimal,
    reason: ExitReason,
    now: DateTime<Utc>,
    sol_usd: Decimal,
) {
    let Some(position) = state.dex_positions.remove(address) else {
        return;
    };

    let model = super::sizing::slippage_model_from_config(cfg);
    let position_usd = sizing::decimal_to_f64(position.token_amount) * sizing::decimal_to_f64(current_price);
    let exec_price_usd = super::sizing::sell_fill(
        model,
        sizing::decimal_to_f64(current_price),
        position_usd,
        position.entry_liquidity,
    );

    let exit_value_usd = position.token_amount * exec_price_usd;
    let exit_value_sol = if sol_usd.is_zero() {
        Decimal::ZERO
    } else {
        exit_value_usd / sol_usd
    };
    let gas = Decimal::from_f64(cfg.dex_gas_fee_sol).unwrap_or(Decimal::ZERO);
    let pnl_sol = exit_value_sol - position.entry_stake_sol - gas;
    let pnl_pct = position.pl_pct(exec_price_usd);

    state.dex_paper_balance_sol += position.entry_stake_sol + pnl_sol;
    state.dex_realized_pnl_sol += pnl_sol;

    let trade = DexTradeRecord {
        symbol: position.symbol.clone(),
        token_address: position.token_address.clone(),
        entry_price: position.entry_price,
        exit_price: exec_price_usd,
        entry_stake_sol: position.entry_stake_sol,
        entry_time: position.entry_time,
        exit_time: now,
        pnl_pct,
        pnl_sol,
        exit_reason: reason,
    };

    let mut streak = StreakState {
        current_loss_streak: state.dex_current_loss_streak,
        max_consecutive_losses: state.dex_max_consecutive_losses,
        peak_balance: state.dex_peak_balance,
        max_drawdown_pct: state.dex_max_drawdown_pct,
        max_drawdown_duration_ms: state.dex_max_drawdown_duration_ms,
        drawdown_start_time: state.dex_drawdown_start_time,
    };
    streak.record_trade(&trade, state.dex_paper_balance_sol, now);
    state.dex_current_loss_streak = streak.current_loss_streak;
    state.dex_max_consecutive_losses = streak.max_consecutive_losses;
    state.dex_peak_balance = streak.peak_balance;
    state.dex_max_drawdown_pct = streak.max_drawdown_pct;
    state.dex_max_drawdown_duration_ms = streak.max_drawdown_duration_ms;
    state.dex_drawdown_start_time = streak.drawdown_start_time;

    if reason.counts_toward_breaker() {
        entry::record_stop_loss_and_maybe_trip(state, cfg, &position.symbol, now);
    }

    if reason.starts_cooldown() {
        state.dex_stop_loss_cooldowns.insert(
            position.token_address.clone(),
            CooldownEntry {
                exit_price: exec_price_usd,
                exit_time: now,
                fallback_expiry: now + chrono::Duration::hours(cfg.stop_loss_cooldown_hours),
            },
        );
    }

    state.dex_trade_history.push(trade);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawdown_pause_clears_on_new_high() {
        let cfg = Config::from_env().unwrap();
        let mut state = AgentState::new(cfg.clone());
        state.dex_peak_value = Decimal::from(100);
        state.dex_drawdown_paused = true;
        update_drawdown(&mut state, &cfg, Decimal::from(150));
        assert!(!state.dex_drawdown_paused);
        assert_eq!(state.dex_peak_value, Decimal::from(150));
    }

    #[test]
    fn drawdown_pause_sets_when_threshold_exceeded() {
        let mut cfg = Config::from_env().unwrap();
        cfg.dex_max_drawdown_pct = 35.0;
        let mut state = AgentState::new(cfg.clone());
        state.dex_peak_value = Decimal::from(100);
        update_drawdown(&mut state, &cfg, Decimal::from(60));
        assert!(state.dex_drawdown_paused);
    }
}
