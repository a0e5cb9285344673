//! Equity/crypto trader tick (spec §4.4): exits-first ordering, PDT-guarded
//! sells, LLM-gated buys, staleness and options sub-flow integration. Mirrors
//! the teacher's `application/strategies/momentum.rs` exits-before-entries
//! pass, generalized from its single-asset-class loop to the equity/crypto/
//! options book described here.

pub mod options;
pub mod pdt;
pub mod sizing;
pub mod staleness;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::errors::TradingError;
use crate::domain::ports::BrokerAdapter;
use crate::domain::state::{AgentState, Verdict};

pub use pdt::PdtCheck;
pub use staleness::{StalenessInput, StalenessScore};

fn is_crypto_symbol(symbol: &str) -> bool {
    symbol.contains('/')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTrigger {
    TakeProfit,
    StopLoss,
    Stale,
    LlmSell,
}

/// Decide whether a held position should be exited: hard take-profit/
/// stop-loss limits first, then staleness, then an LLM sell recommendation
/// gated by the asymmetric minimum-hold rule (spec §4.4, §4.5, §9 "min hold
/// only binds sells").
pub fn decide_exit(
    pl_pct: f64,
    staleness: StalenessScore,
    llm_sell: bool,
    hold_minutes: i64,
    cfg: &Config,
) -> Option<ExitTrigger> {
    if pl_pct >= cfg.equity_take_profit_pct {
        return Some(ExitTrigger::TakeProfit);
    }
    if pl_pct <= -cfg.equity_stop_loss_pct {
        return Some(ExitTrigger::StopLoss);
    }
    if staleness.stale {
        return Some(ExitTrigger::Stale);
    }
    if llm_sell && hold_minutes >= cfg.llm_min_hold_minutes {
        return Some(ExitTrigger::LlmSell);
    }
    None
}

/// Run every held position through [`decide_exit`], honoring the PDT guard
/// before closing a same-day equity entry (spec §4.4 "exits first").
pub async fn run_exits(state: &mut AgentState, broker: &dyn BrokerAdapter, now: chrono::DateTime<chrono::Utc>) -> Result<Vec<String>> {
    let mut closed = Vec::new();
    let symbols: Vec<String> = state.position_entries.keys().cloned().collect();

    for symbol in symbols {
        let entry = match state.position_entries.get(&symbol) {
            Some(e) => e.clone(),
            None => continue,
        };
        let crypto = is_crypto_symbol(&symbol);
        let snapshot = if crypto {
            broker.get_crypto_snapshot(&symbol).await
        } else {
            broker.get_snapshot(&symbol).await
        };
        let snapshot = match snapshot {
            Ok(s) => s,
            Err(err) => {
                warn!(%symbol, %err, "snapshot fetch failed, skipping exit check this tick");
                continue;
            }
        };

        if let Some(e) = state.position_entries.get_mut(&symbol) {
            e.observe(snapshot.price, e.peak_sentiment);
        }
        let pl_pct = entry.pl_pct(snapshot.price);
        let hold = entry.hold_duration(now);

        let current_volume = state
            .signal_cache
            .iter()
            .filter(|s| s.symbol == symbol)
            .map(|s| s.volume)
            .sum::<u64>();
        let staleness_input = StalenessInput {
            hold_hours: hold.num_minutes() as f64 / 60.0,
            pl_pct,
            entry_volume: entry.entry_social_volume,
            current_volume,
        };
        let staleness = staleness::score(staleness_input, &state.config);
        state.staleness_analysis.insert(
            symbol.clone(),
            crate::domain::state::StalenessAnalysis {
                score: staleness.score,
                stale: staleness.stale,
                computed_at: now,
            },
        );

        let llm_sell = state
            .position_research
            .get(&symbol)
            .map(|r| r.verdict == Verdict::Sell)
            .unwrap_or(false);

        let trigger = decide_exit(pl_pct, staleness, llm_sell, hold.num_minutes(), &state.config);
        let Some(trigger) = trigger else { continue };

        let entered_today = entry.entry_time.date_naive() == now.date_naive();
        if !crypto {
            let account = broker.get_account().await?;
            match pdt::check(&account, entered_today, false) {
                PdtCheck::Blocked => {
                    warn!(%symbol, "sell blocked by PDT guard, deferring exit");
                    state.logs.push(
                        "warn",
                        format!(
                            "{}",
                            TradingError::PdtBlocked {
                                daytrade_count: account.daytrade_count,
                                equity: account.equity,
                            }
                        ),
                    );
                    continue;
                }
                PdtCheck::Warn => warn!(%symbol, "PDT daytrade count approaching limit"),
                PdtCheck::Allowed => {}
            }
        }

        broker.close_position(&symbol).await?;
        state.position_entries.remove(&symbol);
        state.staleness_analysis.remove(&symbol);
        info!(%symbol, ?trigger, pl_pct, "closed position");
        state
            .logs
            .push("info", format!("closed {symbol} on {trigger:?} ({pl_pct:.2}% P/L)"));
        closed.push(symbol);
    }

    Ok(closed)
}

/// Run the buy pass: every symbol with a fresh `Buy` research verdict above
/// the confidence floor, not already held, on an allowed exchange, sized by
/// [`sizing::buy_size`] and boosted/penalized by a Twitter confirmation
/// (spec §4.4 "Twitter confirmation", §9 "crisis gating").
pub async fn run_entries(state: &mut AgentState, broker: &dyn BrokerAdapter, now: chrono::DateTime<chrono::Utc>) -> Result<Vec<String>> {
    run_entries_filtered(state, broker, now, None).await
}

/// Like [`run_entries`], but restricted to `only` when given (spec §4.1 step
/// 9 "inside 09:30-09:32 and a pre-market plan exists: execute it" — the
/// plan's candidate list, not the full `signal_research` set, drives that
/// pass).
pub async fn run_entries_filtered(
    state: &mut AgentState,
    broker: &dyn BrokerAdapter,
    now: chrono::DateTime<chrono::Utc>,
    only: Option<&[String]>,
) -> Result<Vec<String>> {
    let mut opened = Vec::new();

    if state.crisis_state.level.blocks_new_entries() {
        state.logs.push("info", "crisis level blocks new equity/crypto entries");
        return Ok(opened);
    }
    let crisis_mult = state.crisis_state.level.position_multiplier();

    let mut candidates: Vec<(String, Verdict, f64, Option<String>)> = state
        .signal_research
        .iter()
        .filter(|(_, r)| r.verdict == Verdict::Buy && r.confidence >= state.config.min_analyst_confidence)
        .filter(|(symbol, _)| only.map(|list| list.contains(symbol)).unwrap_or(true))
        .map(|(symbol, r)| (symbol.clone(), r.verdict, r.confidence, r.entry_quality.clone()))
        .collect();
    // spec §4.4 "The top 3 by LLM-researched confidence drive buys".
    candidates.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(3);

    for (symbol, _verdict, mut confidence, entry_quality) in candidates {
        if state.position_entries.contains_key(&symbol) {
            continue;
        }
        let crypto = is_crypto_symbol(&symbol);
        if !crypto {
            match broker.get_asset(&symbol).await {
                Ok(asset) if !state.config.allowed_exchanges.is_empty()
                    && !state.config.allowed_exchanges.iter().any(|e| e == &asset.exchange) =>
                {
                    state.logs.push("info", format!("{symbol} rejected: exchange {} not allowed", asset.exchange));
                    continue;
                }
                Ok(asset) if !asset.tradable => continue,
                Ok(_) => {}
                Err(err) => {
                    warn!(%symbol, %err, "asset lookup failed, skipping entry");
                    continue;
                }
            }
        }

        if state.config.twitter_confirmation_enabled {
            match state.twitter_confirmations.get(&symbol) {
                Some(crate::domain::state::TwitterConfirmation::Confirmed) => {
                    confidence = (confidence * state.config.twitter_confirm_boost).min(1.0);
                }
                Some(crate::domain::state::TwitterConfirmation::Contradicted) => {
                    confidence *= state.config.twitter_contradict_penalty;
                }
                Some(crate::domain::state::TwitterConfirmation::NoSignal) | None => {}
            }
        }

        let account = broker.get_account().await?;
        let size = sizing::buy_size(account.cash, confidence, crisis_mult, &state.config);
        if let Err(err) = sizing::validate_buy(&symbol, account.cash, size, confidence, &state.config) {
            state.logs.push("info", format!("{symbol} entry rejected: {err}"));
            continue;
        }

        let order = crate::domain::trading::OrderRequest {
            symbol: symbol.clone(),
            side: crate::domain::trading::OrderSide::Buy,
            notional: Some(size),
            qty: None,
            time_in_force: crate::domain::trading::TimeInForce::Day,
            limit_price: None,
        };
        if let Err(err) = broker.create_order(order).await {
            warn!(%symbol, %err, "buy order failed");
            continue;
        }

        let snapshot_price = if crypto {
            broker.get_crypto_snapshot(&symbol).await.map(|s| s.price)
        } else {
            broker.get_snapshot(&symbol).await.map(|s| s.price)
        }
        .unwrap_or(rust_decimal::Decimal::ZERO);

        let volume = state
            .signal_cache
            .iter()
            .filter(|s| s.symbol == symbol)
            .map(|s| s.volume)
            .sum::<u64>();
        let sources: Vec<String> = state
            .signal_cache
            .iter()
            .filter(|s| s.symbol == symbol)
            .map(|s| s.source_detail.clone())
            .collect();
        let sentiment = state
            .signal_cache
            .iter()
            .filter(|s| s.symbol == symbol)
            .map(|s| s.sentiment)
            .fold(0.0, f64::max);

        let is_excellent = entry_quality.as_deref() == Some("excellent");
        state.position_entries.insert(
            symbol.clone(),
            crate::domain::position::PositionEntry::new(
                symbol.clone(),
                now,
                snapshot_price,
                sentiment,
                volume,
                sources,
                entry_quality.unwrap_or_else(|| "analyst buy".to_string()),
            ),
        );
        info!(%symbol, %size, confidence, "opened position");
        state.logs.push("info", format!("opened {symbol}: {size} notional, confidence {confidence:.2}"));

        // spec §4.4 "For confidence >= options_min_confidence AND entry_quality
        // == 'excellent' AND options enabled, also pursue an options contract".
        if !crypto && state.config.options_enabled && is_excellent && confidence >= state.config.options_min_confidence {
            if let Err(err) = options::pursue_entry(state, broker, now, &symbol).await {
                warn!(%symbol, %err, "options entry failed");
            }
        }
        opened.push(symbol);
    }

    Ok(opened)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        let mut c = Config::from_env().unwrap();
        c.equity_take_profit_pct = 20.0;
        c.equity_stop_loss_pct = 10.0;
        c.llm_min_hold_minutes = 60;
        c
    }

    #[test]
    fn take_profit_wins_over_stale() {
        let staleness = StalenessScore { score: 90.0, stale: true };
        let trigger = decide_exit(25.0, staleness, false, 1000, &cfg());
        assert_eq!(trigger, Some(ExitTrigger::TakeProfit));
    }

    #[test]
    fn stop_loss_fires_before_staleness_check() {
        let staleness = StalenessScore { score: 0.0, stale: false };
        let trigger = decide_exit(-15.0, staleness, false, 10, &cfg());
        assert_eq!(trigger, Some(ExitTrigger::StopLoss));
    }

    #[test]
    fn llm_sell_ignored_before_min_hold_elapses() {
        let staleness = StalenessScore { score: 0.0, stale: false };
        let trigger = decide_exit(5.0, staleness, true, 30, &cfg());
        assert_eq!(trigger, None);
    }

    #[test]
    fn llm_sell_honored_after_min_hold_elapses() {
        let staleness = StalenessScore { score: 0.0, stale: false };
        let trigger = decide_exit(5.0, staleness, true, 90, &cfg());
        assert_eq!(trigger, Some(ExitTrigger::LlmSell));
    }

    #[test]
    fn crypto_symbol_detection() {
        assert!(is_crypto_symbol("BTC/USD"));
        assert!(!is_crypto_symbol("AAPL"));
    }
}
