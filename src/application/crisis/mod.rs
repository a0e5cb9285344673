//! Macro crisis monitor (spec §4.6): score indicators into a 0-3 level,
//! apply the level's effects (tighter stops, forced liquidation), and log
//! transitions. Grounded in the teacher's
//! `application/risk_management/circuit_breaker_service.rs` threshold-ladder
//! style, generalized from a single P&L trigger to a multi-indicator score.

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::crisis::{CrisisLevel, CrisisState, Indicators};
use crate::domain::ports::{BrokerAdapter, CrisisIndicatorSource};
use crate::domain::state::AgentState;

/// Score every indicator against its warning/critical thresholds (spec §4.6
/// table: VIX contributes up to 3 points, every other indicator up to 2).
/// Missing (`None`) indicators contribute zero and are not counted as
/// triggered.
pub fn score_indicators(indicators: &Indicators, cfg: &Config) -> (u32, Vec<String>) {
    let mut score = 0u32;
    let mut triggered = Vec::new();

    if let Some(vix) = indicators.vix {
        if vix >= cfg.vix_critical {
            score += 3;
            triggered.push(format!("vix={vix:.1}"));
        } else if vix >= cfg.vix_warning {
            score += 1;
            triggered.push(format!("vix={vix:.1}"));
        }
    }
    if let Some(hy) = indicators.hy_spread {
        if hy >= cfg.hy_spread_critical {
            score += 2;
            triggered.push(format!("hy_spread={hy:.2}"));
        } else if hy >= cfg.hy_spread_warning {
            score += 1;
            triggered.push(format!("hy_spread={hy:.2}"));
        }
    }
    if let Some(yc) = indicators.yield_curve_2y10y {
        if yc <= cfg.yield_curve_warning {
            score += 1;
            triggered.push(format!("yield_curve={yc:.2}"));
        }
    }
    if let Some(ted) = indicators.ted_spread {
        if ted >= cfg.ted_spread_critical {
            score += 2;
            triggered.push(format!("ted_spread={ted:.2}"));
        } else if ted >= cfg.ted_spread_warning {
            score += 1;
            triggered.push(format!("ted_spread={ted:.2}"));
        }
    }
    if let Some(btc) = indicators.btc_weekly_pct {
        if btc <= -cfg.btc_weekly_drop_critical_pct {
            score += 2;
            triggered.push(format!("btc_weekly={btc:.1}%"));
        } else if btc <= -cfg.btc_weekly_drop_warning_pct {
            score += 1;
            triggered.push(format!("btc_weekly={btc:.1}%"));
        }
    }
    if let Some(peg) = indicators.usdt_peg {
        if (peg - 1.0).abs() >= cfg.usdt_depeg_warning {
            score += 1;
            triggered.push(format!("usdt_peg={peg:.4}"));
        }
    }
    if let Some(dxy) = indicators.dxy {
        if dxy >= cfg.dxy_warning {
            score += 1;
            triggered.push(format!("dxy={dxy:.1}"));
        }
    }
    if let Some(usdjpy) = indicators.usdjpy {
        if usdjpy >= cfg.usdjpy_warning {
            score += 1;
            triggered.push(format!("usdjpy={usdjpy:.1}"));
        }
    }
    if let Some(kre) = indicators.kre_weekly_pct {
        if kre <= -cfg.kre_weekly_drop_warning_pct {
            score += 1;
            triggered.push(format!("kre_weekly={kre:.1}%"));
        }
    }
    if let Some(ratio) = indicators.gold_silver_ratio {
        if ratio >= cfg.gold_silver_ratio_warning {
            score += 1;
            triggered.push(format!("gold_silver_ratio={ratio:.1}"));
        }
    }
    if let Some(silver) = indicators.silver_weekly_pct {
        if silver <= -cfg.silver_weekly_drop_warning_pct {
            score += 1;
            triggered.push(format!("silver_weekly={silver:.1}%"));
        }
    }
    if let Some(fed) = indicators.fed_change_pct {
        if fed <= -cfg.fed_balance_drop_warning_pct {
            score += 1;
            triggered.push(format!("fed_balance={fed:.1}%"));
        }
    }
    // stocks_above_200ma is permanently unsourced (spec §9 open question);
    // it never contributes to the score.

    (score, triggered)
}

/// Recompute the crisis level from fresh indicators and log any transition
/// (spec §4.6). Does not itself apply level effects; see [`apply_effects`].
pub fn recompute_level(state: &mut AgentState, indicators: Indicators, now: chrono::DateTime<chrono::Utc>) {
    let (score, triggered) = score_indicators(&indicators, &state.config);
    let new_level = CrisisLevel::from_score(score);
    let old_level = state.crisis_state.level;

    state.crisis_state.indicators = indicators;
    state.crisis_state.triggered_indicators = triggered.clone();

    if new_level != old_level {
        info!(?old_level, ?new_level, score, "crisis level transition");
        state.logs.push(
            "warn",
            format!("crisis level {old_level} -> {new_level} (score {score}): {}", triggered.join(", ")),
        );
        state.crisis_state.last_level_change = now;
    }
    state.crisis_state.level = new_level;
}

/// Gather every configured indicator source, tolerating individual failures
/// as `None` (spec §6 "all failures -> null"), then recompute the level.
pub async fn check(state: &mut AgentState, sources: &[Box<dyn CrisisIndicatorSource>], now: chrono::DateTime<chrono::Utc>) {
    let mut indicators = state.crisis_state.indicators.clone();
    for source in sources {
        let value = source.fetch().await;
        if value.is_none() {
            warn!(source = source.name(), "crisis indicator unavailable this check");
        }
        apply_fetched(&mut indicators, source.name(), value);
    }
    indicators.last_updated = Some(now);
    recompute_level(state, indicators, now);
}

fn apply_fetched(indicators: &mut Indicators, name: &str, value: Option<f64>) {
    match name {
        "vix" => indicators.vix = value.or(indicators.vix),
        "hy_spread" => indicators.hy_spread = value.or(indicators.hy_spread),
        "yield_curve_2y10y" => indicators.yield_curve_2y10y = value.or(indicators.yield_curve_2y10y),
        "ted_spread" => indicators.ted_spread = value.or(indicators.ted_spread),
        "btc_weekly_pct" => indicators.btc_weekly_pct = value.or(indicators.btc_weekly_pct),
        "usdt_peg" => indicators.usdt_peg = value.or(indicators.usdt_peg),
        "dxy" => indicators.dxy = value.or(indicators.dxy),
        "usdjpy" => indicators.usdjpy = value.or(indicators.usdjpy),
        "kre_weekly_pct" => indicators.kre_weekly_pct = value.or(indicators.kre_weekly_pct),
        "gold_silver_ratio" => indicators.gold_silver_ratio = value.or(indicators.gold_silver_ratio),
        "silver_weekly_pct" => indicators.silver_weekly_pct = value.or(indicators.silver_weekly_pct),
        "fed_change_pct" => indicators.fed_change_pct = value.or(indicators.fed_change_pct),
        other => warn!(source = other, "unknown crisis indicator source"),
    }
}

/// Apply the current level's effects: liquidate everything at level 3,
/// otherwise tighten the stop (level 1) or require a minimum profit to keep
/// holding (level 2) (spec §4.6, §9 "crisis/DEX entry race").
pub async fn apply_effects(
    state: &mut AgentState,
    broker: &dyn BrokerAdapter,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Vec<String>> {
    let mut acted_on = Vec::new();
    let level = state.crisis_state.level;

    if level.forces_liquidation() {
        let symbols: Vec<String> = state.position_entries.keys().cloned().collect();
        for symbol in symbols {
            if let Err(err) = broker.close_position(&symbol).await {
                warn!(%symbol, %err, "crisis liquidation close failed");
                continue;
            }
            state.position_entries.remove(&symbol);
            state.crisis_state.positions_closed_in_crisis.push(symbol.clone());
            acted_on.push(symbol);
        }

        let options_closed = crate::application::trader::options::liquidate_all(state, broker).await;
        for symbol in &options_closed {
            state.crisis_state.positions_closed_in_crisis.push(symbol.clone());
        }
        acted_on.extend(options_closed);

        // DEX positions are paper-traded, so "liquidation" is a forced close
        // against the position's own last mark rather than a broker call
        // (spec §8 invariant 7 "paper + broker").
        let cfg = state.config.clone();
        let sol_usd = rust_decimal::prelude::FromPrimitive::from_f64(cfg.sol_usd_fallback)
            .unwrap_or(rust_decimal::Decimal::from(200));
        let dex_closed = crate::application::dex::liquidate_all(state, &cfg, now, sol_usd);
        for symbol in &dex_closed {
            state.crisis_state.positions_closed_in_crisis.push(symbol.clone());
        }
        acted_on.extend(dex_closed);

        state.logs.push("warn", "full crisis: all equity/crypto and DEX positions liquidated");
        return Ok(acted_on);
    }

    if level == CrisisLevel::Elevated || level == CrisisLevel::HighAlert {
        let symbols: Vec<String> = state.position_entries.keys().cloned().collect();
        for symbol in symbols {
            let crypto = symbol.contains('/');
            let snapshot = if crypto {
                broker.get_crypto_snapshot(&symbol).await
            } else {
                broker.get_snapshot(&symbol).await
            };
            let Ok(snapshot) = snapshot else { continue };
            let Some(entry) = state.position_entries.get(&symbol) else { continue };
            let pl_pct = entry.pl_pct(snapshot.price);

            let should_close = if level == CrisisLevel::HighAlert {
                pl_pct < state.config.crisis_level2_min_profit_to_hold_pct
            } else {
                pl_pct <= -state.config.crisis_level1_stop_loss_pct
            };
            if should_close {
                if let Err(err) = broker.close_position(&symbol).await {
                    warn!(%symbol, %err, "crisis-tightened close failed");
                    continue;
                }
                state.position_entries.remove(&symbol);
                state.crisis_state.positions_closed_in_crisis.push(symbol.clone());
                acted_on.push(symbol);
            }
        }
    }

    Ok(acted_on)
}

/// Manual admin override: force a level regardless of indicator score until
/// the next `recompute_level` with `manual_override` cleared (spec §6 admin
/// surface "crisis/toggle"). An explicit `level` pins `crisis_state.level` to
/// that value for the duration of the override; omitting it leaves the
/// current level untouched and only freezes further automatic evaluation.
pub fn set_manual_override(
    state: &mut AgentState,
    enabled: bool,
    level: Option<crate::domain::crisis::CrisisLevel>,
    now: chrono::DateTime<chrono::Utc>,
) {
    state.crisis_state.manual_override = enabled;
    if !enabled {
        state.logs.push("info", "crisis manual override cleared");
        return;
    }
    if let Some(level) = level {
        if level != state.crisis_state.level {
            state.crisis_state.level = level;
            state.crisis_state.last_level_change = now;
        }
    } else {
        state.crisis_state.last_level_change = now;
    }
    state.logs.push("warn", "crisis manual override engaged");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        let mut c = Config::from_env().unwrap();
        c.vix_warning = 25.0;
        c.vix_critical = 40.0;
        c.hy_spread_warning = 400.0;
        c.hy_spread_critical = 600.0;
        c.btc_weekly_drop_warning_pct = 10.0;
        c.btc_weekly_drop_critical_pct = 20.0;
        c
    }

    #[test]
    fn scenario_crisis_escalation_to_full_crisis() {
        // Scenario 4: VIX=46, HY spread=650, BTC weekly=-22% -> score 7 -> FullCrisis.
        let indicators = Indicators {
            vix: Some(46.0),
            hy_spread: Some(650.0),
            btc_weekly_pct: Some(-22.0),
            ..Default::default()
        };
        let (score, triggered) = score_indicators(&indicators, &cfg());
        assert_eq!(score, 7);
        assert_eq!(CrisisLevel::from_score(score), CrisisLevel::FullCrisis);
        assert_eq!(triggered.len(), 3);
    }

    #[test]
    fn missing_indicators_contribute_nothing() {
        let (score, triggered) = score_indicators(&Indicators::default(), &cfg());
        assert_eq!(score, 0);
        assert!(triggered.is_empty());
    }

    #[test]
    fn level_transition_is_logged() {
        let mut state = AgentState::new(cfg());
        let indicators = Indicators {
            vix: Some(46.0),
            hy_spread: Some(650.0),
            btc_weekly_pct: Some(-22.0),
            ..Default::default()
        };
        recompute_level(&mut state, indicators, chrono::Utc::now());
        assert_eq!(state.crisis_state.level, CrisisLevel::FullCrisis);
        assert!(state.logs.tail(5).iter().any(|l| l.message.contains("crisis level")));
    }
}
