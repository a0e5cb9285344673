//! Position sizing, concentration cap and slippage application (spec §4.3
//! "Sizing and slippage").

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::config::Config;
use crate::domain::dex::{apply_slippage, slippage_fraction, SlippageModel, Tier};

pub fn slippage_model_from_config(cfg: &Config) -> SlippageModel {
    match cfg.dex_slippage_model.to_lowercase().as_str() {
        "none" => SlippageModel::None,
        "conservative" => SlippageModel::Conservative,
        _ => SlippageModel::Realistic,
    }
}

/// Fixed/formula sizing per tier (spec §4.3 table), in SOL, before the
/// concentration cap.
pub fn base_position_size_sol(cfg: &Config, tier: Tier, balance_sol: f64) -> f64 {
    match tier {
        Tier::Microspray => cfg.microspray_position_sol,
        Tier::Breakout => cfg.breakout_position_sol,
        Tier::Lottery => cfg.lottery_position_sol,
        Tier::Early => {
            (balance_sol * cfg.dex_pct_of_balance * cfg.dex_early_multiplier)
                .min(cfg.dex_max_position_sol)
        }
        Tier::Established => (balance_sol * cfg.dex_pct_of_balance).min(cfg.dex_max_position_sol),
    }
}

pub struct SizingOutcome {
    pub stake_sol: f64,
    pub reduced: bool,
}

/// Cap the candidate stake at `max_single_position_pct` of total portfolio
/// value (spec §4.3 "Sizing and slippage"); returns `None` if the reduced
/// size falls below `min_viable_sol` (spec scenario 6, "Concentration
/// reduction").
pub fn apply_concentration_cap(
    cfg: &Config,
    candidate_stake_sol: f64,
    total_portfolio_value_sol: f64,
) -> Option<SizingOutcome> {
    let cap = total_portfolio_value_sol * cfg.dex_max_single_position_pct;
    if candidate_stake_sol <= cap {
        return Some(SizingOutcome {
            stake_sol: candidate_stake_sol,
            reduced: false,
        });
    }
    if cap < cfg.dex_min_viable_sol {
        return None;
    }
    Some(SizingOutcome {
        stake_sol: cap,
        reduced: true,
    })
}

/// Convert a SOL stake into USD notional using the cached SOL/USD price.
pub fn stake_to_usd(stake_sol: f64, sol_usd: f64) -> f64 {
    stake_sol * sol_usd
}

/// Execute a buy: apply slippage to the mid price and return the resulting
/// execution price and token amount, preserving the invariant
/// `token_amount * entry_price ~= entry_stake_sol * sol_usd` (spec §3
/// "DexPosition" invariant).
pub fn buy_fill(
    model: SlippageModel,
    mid_price_usd: f64,
    stake_sol: f64,
    sol_usd: f64,
    liquidity_usd: f64,
) -> (Decimal, Decimal) {
    let position_usd = stake_to_usd(stake_sol, sol_usd);
    let fraction = slippage_fraction(model, position_usd, liquidity_usd);
    let exec_price = apply_slippage(mid_price_usd, fraction, true);
    let token_amount = if exec_price > 0.0 {
        position_usd / exec_price
    } else {
        0.0
    };
    (
        Decimal::from_f64(exec_price).unwrap_or(Decimal::ZERO),
        Decimal::from_f64(token_amount).unwrap_or(Decimal::ZERO),
    )
}

/// Execute a sell: apply slippage (deflating) and return the execution
/// price in USD.
pub fn sell_fill(model: SlippageModel, mid_price_usd: f64, position_usd: f64, liquidity_usd: f64) -> Decimal {
    let fraction = slippage_fraction(model, position_usd, liquidity_usd);
    let exec_price = apply_slippage(mid_price_usd, fraction, false);
    Decimal::from_f64(exec_price).unwrap_or(Decimal::ZERO)
}

pub fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concentration_cap_reduces_oversized_candidate() {
        // scenario 6: 1.0 SOL portfolio, 0.5 candidate, 40% cap -> reduced to 0.4
        let outcome = apply_concentration_cap(
            &test_config(),
            0.5,
            1.0,
        )
        .unwrap();
        assert!((outcome.stake_sol - 0.4).abs() < 1e-9);
        assert!(outcome.reduced);
    }

    #[test]
    fn concentration_cap_skips_below_min_viable() {
        let mut cfg = test_config();
        cfg.dex_min_viable_sol = 0.5;
        let outcome = apply_concentration_cap(&cfg, 0.5, 1.0);
        assert!(outcome.is_none());
    }

    fn test_config() -> Config {
        let mut cfg = Config::from_env().unwrap();
        cfg.dex_max_single_position_pct = 0.4;
        cfg.dex_min_viable_sol = 0.01;
        cfg
    }
}
