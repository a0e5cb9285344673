//! Options sub-flow (spec §4.7). No example repo in the pack trades listed
//! options; implemented directly from the spec in the teacher's general
//! order-construction idiom (`domain/trading/types.rs` `Order`/`OrderType`).

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::ports::BrokerAdapter;
use crate::domain::state::AgentState;
use crate::domain::trading::{OptionContract, OptionPosition, OptionRight, OrderRequest, OrderSide, TimeInForce};

/// Pick the expiration with DTE in `[min_dte, max_dte]` closest to the
/// window's midpoint (spec §4.7).
pub fn pick_expiration(expirations: &[NaiveDate], today: NaiveDate, cfg: &Config) -> Option<NaiveDate> {
    let midpoint = (cfg.options_min_dte + cfg.options_max_dte) / 2;
    expirations
        .iter()
        .filter(|exp| {
            let dte = (**exp - today).num_days();
            dte >= cfg.options_min_dte && dte <= cfg.options_max_dte
        })
        .min_by_key(|exp| {
            let dte = (**exp - today).num_days();
            (dte - midpoint).abs()
        })
        .copied()
}

/// Filter and pick the best contract: matching bullish/bearish side, delta
/// within range, quote spread under the cap, and affordable (spec §4.7).
pub fn pick_contract<'a>(
    contracts: &'a [OptionContract],
    bullish: bool,
    equity: Decimal,
    cfg: &Config,
) -> Option<&'a OptionContract> {
    let wanted_right = if bullish { OptionRight::Call } else { OptionRight::Put };
    let target_delta = if bullish {
        (cfg.options_min_delta + cfg.options_max_delta) / 2.0
    } else {
        -(cfg.options_min_delta + cfg.options_max_delta) / 2.0
    };

    contracts
        .iter()
        .filter(|c| c.right == wanted_right)
        .filter(|c| {
            c.delta
                .map(|d| d.abs() >= cfg.options_min_delta && d.abs() <= cfg.options_max_delta)
                .unwrap_or(false)
        })
        .filter(|c| quote_spread_pct(c) <= cfg.options_max_quote_spread_pct)
        .filter(|c| max_affordable_contracts(c, equity, cfg) >= 1)
        .min_by(|a, b| {
            let da = (a.delta.unwrap_or(0.0) - target_delta).abs();
            let db = (b.delta.unwrap_or(0.0) - target_delta).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
}

pub fn quote_spread_pct(contract: &OptionContract) -> f64 {
    let mid = mid_price(contract);
    if mid.is_zero() {
        return 100.0;
    }
    ((contract.ask - contract.bid) / mid * Decimal::ONE_HUNDRED)
        .to_f64()
        .unwrap_or(100.0)
}

pub fn mid_price(contract: &OptionContract) -> Decimal {
    (contract.bid + contract.ask) / Decimal::from(2)
}

/// Max affordable contracts at the mid price (spec §4.7: `equity *
/// max_pct_per_trade / (mid * 100)`).
pub fn max_affordable_contracts(contract: &OptionContract, equity: Decimal, cfg: &Config) -> u32 {
    let mid = mid_price(contract);
    if mid.is_zero() {
        return 0;
    }
    let budget = equity * Decimal::from_f64_retain(cfg.options_max_pct_per_trade).unwrap_or(Decimal::ZERO);
    let per_contract_cost = mid * Decimal::ONE_HUNDRED;
    (budget / per_contract_cost).trunc().to_u32().unwrap_or(0)
}

pub fn should_exit(pl_pct: f64, cfg: &Config) -> bool {
    pl_pct <= -cfg.options_stop_loss_pct || pl_pct >= cfg.options_take_profit_pct
}

/// Pursue a bullish-call options contract alongside a qualifying equity buy
/// (spec §4.4 "For confidence >= options_min_confidence AND entry_quality ==
/// 'excellent' ... also pursue an options contract", §4.7). Only the bullish
/// side is wired from the entries path since nothing in the equity/crypto
/// trader's buy flow produces a bearish signal to drive a put (see
/// DESIGN.md "Options direction").
pub async fn pursue_entry(
    state: &mut AgentState,
    broker: &dyn BrokerAdapter,
    now: chrono::DateTime<chrono::Utc>,
    underlying: &str,
) -> Result<Option<String>> {
    let cfg = state.config.clone();
    let expirations = broker.get_option_expirations(underlying).await?;
    let Some(expiration) = pick_expiration(&expirations, now.date_naive(), &cfg) else {
        state.logs.push("info", format!("{underlying} options: no expiration in DTE window"));
        return Ok(None);
    };

    let chain = broker.get_option_chain(underlying, expiration).await?;
    let account = broker.get_account().await?;
    let Some(contract) = pick_contract(&chain, true, account.equity, &cfg) else {
        state.logs.push("info", format!("{underlying} options: no contract passed delta/spread/affordability filters"));
        return Ok(None);
    };

    let contracts = max_affordable_contracts(contract, account.equity, &cfg).max(1);
    let mid = mid_price(contract);
    let order = OrderRequest {
        symbol: contract.symbol.clone(),
        side: OrderSide::Buy,
        notional: None,
        qty: Some(Decimal::from(contracts)),
        time_in_force: TimeInForce::Day,
        limit_price: Some(mid),
    };
    if let Err(err) = broker.create_order(order).await {
        warn!(%underlying, %err, "options buy order failed");
        return Ok(None);
    }

    let contract_symbol = contract.symbol.clone();
    state.option_positions.insert(
        contract_symbol.clone(),
        OptionPosition {
            contract_symbol: contract_symbol.clone(),
            underlying: underlying.to_string(),
            expiration,
            strike: contract.strike,
            right: contract.right,
            entry_time: now,
            entry_mid_price: mid,
            contracts,
        },
    );
    info!(%underlying, %contract_symbol, contracts, "opened options position");
    state.logs.push("info", format!("opened options {contract_symbol}: {contracts} contracts @ {mid}"));
    Ok(Some(contract_symbol))
}

/// Evaluate every open options position for the stop-loss/take-profit exit
/// (spec §4.7 "Exits"), re-fetching the chain to get a fresh quote.
pub async fn evaluate_exits(
    state: &mut AgentState,
    broker: &dyn BrokerAdapter,
    _now: chrono::DateTime<chrono::Utc>,
) -> Result<Vec<String>> {
    let cfg = state.config.clone();
    let mut closed = Vec::new();
    let contract_symbols: Vec<String> = state.option_positions.keys().cloned().collect();

    for contract_symbol in contract_symbols {
        let Some(position) = state.option_positions.get(&contract_symbol) else { continue };
        let chain = match broker.get_option_chain(&position.underlying, position.expiration).await {
            Ok(c) => c,
            Err(err) => {
                warn!(%contract_symbol, %err, "option chain refetch failed, skipping exit check this tick");
                continue;
            }
        };
        let Some(contract) = chain.iter().find(|c| c.symbol == contract_symbol) else {
            warn!(%contract_symbol, "contract missing from refreshed chain, skipping exit check this tick");
            continue;
        };
        let current_mid = mid_price(contract);
        let pl_pct = position.pl_pct(current_mid);
        if !should_exit(pl_pct, &cfg) {
            continue;
        }

        let order = OrderRequest {
            symbol: contract_symbol.clone(),
            side: OrderSide::Sell,
            notional: None,
            qty: Some(Decimal::from(position.contracts)),
            time_in_force: TimeInForce::Day,
            limit_price: Some(current_mid),
        };
        if let Err(err) = broker.create_order(order).await {
            warn!(%contract_symbol, %err, "options sell order failed");
            continue;
        }
        state.option_positions.remove(&contract_symbol);
        info!(%contract_symbol, pl_pct, "closed options position");
        state.logs.push("info", format!("closed options {contract_symbol} ({pl_pct:.2}% P/L)"));
        closed.push(contract_symbol);
    }

    Ok(closed)
}

/// Close every open options position at market via `close_position`,
/// regardless of P/L (spec §8 invariant 7 "crisis level 3 implies zero open
/// positions by end of the tick"). Used only by the crisis monitor's level-3
/// liquidation, never by the ordinary stop-loss/take-profit exit path.
pub async fn liquidate_all(state: &mut AgentState, broker: &dyn BrokerAdapter) -> Vec<String> {
    let mut closed = Vec::new();
    let contract_symbols: Vec<String> = state.option_positions.keys().cloned().collect();

    for contract_symbol in contract_symbols {
        if let Err(err) = broker.close_position(&contract_symbol).await {
            warn!(%contract_symbol, %err, "crisis liquidation of options position failed");
            continue;
        }
        state.option_positions.remove(&contract_symbol);
        closed.push(contract_symbol);
    }

    closed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cfg() -> Config {
        let mut c = Config::from_env().unwrap();
        c.options_min_dte = 14;
        c.options_max_dte = 45;
        c.options_min_delta = 0.3;
        c.options_max_delta = 0.6;
        c.options_max_quote_spread_pct = 10.0;
        c.options_max_pct_per_trade = 0.02;
        c.options_stop_loss_pct = 40.0;
        c.options_take_profit_pct = 60.0;
        c
    }

    #[test]
    fn picks_expiration_closest_to_midpoint() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let exps = vec![
            today + chrono::Duration::days(10),
            today + chrono::Duration::days(30),
            today + chrono::Duration::days(60),
        ];
        let picked = pick_expiration(&exps, today, &cfg()).unwrap();
        assert_eq!(picked, today + chrono::Duration::days(30));
    }

    #[test]
    fn exit_thresholds() {
        let c = cfg();
        assert!(should_exit(-45.0, &c));
        assert!(should_exit(65.0, &c));
        assert!(!should_exit(10.0, &c));
    }

    #[tokio::test]
    async fn pursue_entry_opens_a_bullish_call_and_evaluate_exits_closes_it_on_take_profit() {
        use crate::domain::state::AgentState;
        use crate::infrastructure::mock::MockBroker;

        let broker = MockBroker::new(dec!(100_000));
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let expiration = today + chrono::Duration::days(30);
        let contract = OptionContract {
            symbol: "FOO260130C00100000".into(),
            underlying: "FOO".into(),
            expiration,
            strike: dec!(100),
            right: OptionRight::Call,
            delta: Some(0.45),
            bid: dec!(1.90),
            ask: dec!(2.10),
        };
        broker.set_option_chain("FOO", expiration, vec![contract]).await;

        let mut state = AgentState::new(cfg());
        let now = today.and_hms_opt(9, 30, 0).unwrap().and_utc();
        let opened = pursue_entry(&mut state, &broker, now, "FOO").await.unwrap();
        assert!(opened.is_some());
        assert_eq!(state.option_positions.len(), 1);

        // bump the quote to a take-profit level and refresh the chain
        let richer = OptionContract {
            symbol: "FOO260130C00100000".into(),
            underlying: "FOO".into(),
            expiration,
            strike: dec!(100),
            right: OptionRight::Call,
            delta: Some(0.45),
            bid: dec!(3.10),
            ask: dec!(3.30),
        };
        broker.option_chains.write().await.insert(("FOO".to_string(), expiration), vec![richer]);

        let closed = evaluate_exits(&mut state, &broker, now).await.unwrap();
        assert_eq!(closed.len(), 1);
        assert!(state.option_positions.is_empty());
    }

    #[test]
    fn contract_filter_rejects_wide_spread() {
        let contract = OptionContract {
            symbol: "FOO260130C00100000".into(),
            underlying: "FOO".into(),
            expiration: NaiveDate::from_ymd_opt(2026, 1, 30).unwrap(),
            strike: dec!(100),
            right: OptionRight::Call,
            delta: Some(0.45),
            bid: dec!(1.0),
            ask: dec!(2.0),
        };
        assert!(quote_spread_pct(&contract) > 10.0);
        let picked = pick_contract(&[contract], true, dec!(100_000), &cfg());
        assert!(picked.is_none());
    }
}
