//! DEX momentum engine tunables (spec §4.3). One entry per source constant
//! named in the spec's prose, so the defaults are traceable line-by-line.

use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use super::env_util::{parse_bool, parse_f64, parse_u64, parse_usize};

#[derive(Debug, Clone)]
pub struct DexEnvConfig {
    pub enabled: bool,
    pub scan_interval_ms: u64,

    // Starting balance & global sizing
    pub starting_balance_sol: f64,
    pub max_position_sol: f64,
    pub max_single_position_pct: f64,
    pub min_viable_sol: f64,
    pub pct_of_balance: f64,
    pub early_multiplier: f64,
    pub max_positions: usize,

    // Per-tier fixed stakes
    pub microspray_position_sol: f64,
    pub breakout_position_sol: f64,
    pub lottery_position_sol: f64,

    // Per-tier liquidity/age filters
    pub microspray_min_liquidity_usd: f64,
    pub breakout_min_liquidity_usd: f64,
    pub lottery_min_liquidity_usd: f64,
    pub early_min_liquidity_usd: f64,
    pub established_min_liquidity_usd: f64,
    pub early_min_legitimacy: f64,

    // Entry gating
    pub entry_min_momentum_score: f64,
    pub chart_analysis_enabled: bool,
    pub chart_min_entry_score: f64,

    // Slippage & fees
    pub slippage_model: String,
    pub gas_fee_sol: f64,
    pub sol_usd_fallback: f64,
    pub sol_usd_cache_ttl_secs: u64,

    // Exit thresholds
    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,
    pub trailing_stop_activation_pct: f64,
    pub trailing_stop_distance_pct: f64,
    pub lottery_trailing_activation_pct: f64,
    pub lottery_trailing_distance_pct: f64,
    pub missed_scan_exit_threshold: u32,
    pub momentum_decay_ratio: f64,
    pub liquidity_safety_multiplier: f64,

    // Circuit breaker
    pub circuit_breaker_losses: u32,
    pub circuit_breaker_window_hours: i64,
    pub circuit_breaker_pause_hours: i64,
    pub breaker_min_cooldown_minutes: i64,

    // Drawdown halt
    pub max_drawdown_pct: f64,

    // Stop-loss cooldown / re-entry
    pub stop_loss_cooldown_hours: i64,
    pub reentry_recovery_pct: f64,
    pub reentry_min_momentum: f64,
    pub reentry_min_elapsed_minutes: i64,

    // Housekeeping
    pub cooldown_max_age_hours: i64,
}

impl DexEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            enabled: parse_bool("DEX_ENABLED", true),
            scan_interval_ms: parse_u64("DEX_SCAN_INTERVAL_MS", 30_000)?,

            starting_balance_sol: parse_f64("DEX_STARTING_BALANCE_SOL", 10.0)?,
            max_position_sol: parse_f64("DEX_MAX_POSITION_SOL", 0.5)?,
            max_single_position_pct: parse_f64("DEX_MAX_SINGLE_POSITION_PCT", 0.4)?,
            min_viable_sol: parse_f64("DEX_MIN_VIABLE_SOL", 0.01)?,
            pct_of_balance: parse_f64("DEX_PCT_OF_BALANCE", 0.05)?,
            early_multiplier: parse_f64("DEX_EARLY_MULTIPLIER", 0.5)?,
            max_positions: parse_usize("DEX_MAX_POSITIONS", 15)?,

            microspray_position_sol: parse_f64("DEX_MICROSPRAY_POSITION_SOL", 0.005)?,
            breakout_position_sol: parse_f64("DEX_BREAKOUT_POSITION_SOL", 0.015)?,
            lottery_position_sol: parse_f64("DEX_LOTTERY_POSITION_SOL", 0.02)?,

            microspray_min_liquidity_usd: parse_f64("DEX_MICROSPRAY_MIN_LIQUIDITY_USD", 10_000.0)?,
            breakout_min_liquidity_usd: parse_f64("DEX_BREAKOUT_MIN_LIQUIDITY_USD", 15_000.0)?,
            lottery_min_liquidity_usd: parse_f64("DEX_LOTTERY_MIN_LIQUIDITY_USD", 15_000.0)?,
            early_min_liquidity_usd: parse_f64("DEX_EARLY_MIN_LIQUIDITY_USD", 30_000.0)?,
            established_min_liquidity_usd: parse_f64("DEX_ESTABLISHED_MIN_LIQUIDITY_USD", 50_000.0)?,
            early_min_legitimacy: parse_f64("DEX_EARLY_MIN_LEGITIMACY", 40.0)?,

            entry_min_momentum_score: parse_f64("DEX_ENTRY_MIN_MOMENTUM_SCORE", 60.0)?,
            chart_analysis_enabled: parse_bool("DEX_CHART_ANALYSIS_ENABLED", true),
            chart_min_entry_score: parse_f64("DEX_CHART_MIN_ENTRY_SCORE", 40.0)?,

            slippage_model: super::env_util::parse_string("DEX_SLIPPAGE_MODEL", "realistic"),
            gas_fee_sol: parse_f64("DEX_GAS_FEE_SOL", 0.00005)?,
            sol_usd_fallback: parse_f64("DEX_SOL_USD_FALLBACK", 200.0)?,
            sol_usd_cache_ttl_secs: parse_u64("DEX_SOL_USD_CACHE_TTL_SECS", 300)?,

            take_profit_pct: parse_f64("DEX_TAKE_PROFIT_PCT", 50.0)?,
            stop_loss_pct: parse_f64("DEX_STOP_LOSS_PCT", 20.0)?,
            trailing_stop_activation_pct: parse_f64("DEX_TRAILING_STOP_ACTIVATION_PCT", 50.0)?,
            trailing_stop_distance_pct: parse_f64("DEX_TRAILING_STOP_DISTANCE_PCT", 25.0)?,
            lottery_trailing_activation_pct: parse_f64("DEX_LOTTERY_TRAILING_ACTIVATION_PCT", 100.0)?,
            lottery_trailing_distance_pct: parse_f64("DEX_LOTTERY_TRAILING_DISTANCE_PCT", 20.0)?,
            missed_scan_exit_threshold: parse_usize("DEX_MISSED_SCAN_EXIT_THRESHOLD", 10)? as u32,
            momentum_decay_ratio: parse_f64("DEX_MOMENTUM_DECAY_RATIO", 0.4)?,
            liquidity_safety_multiplier: parse_f64("DEX_LIQUIDITY_SAFETY_MULTIPLIER", 5.0)?,

            circuit_breaker_losses: parse_usize("DEX_CIRCUIT_BREAKER_LOSSES", 3)? as u32,
            circuit_breaker_window_hours: parse_u64("DEX_CIRCUIT_BREAKER_WINDOW_HOURS", 24)? as i64,
            circuit_breaker_pause_hours: parse_u64("DEX_CIRCUIT_BREAKER_PAUSE_HOURS", 1)? as i64,
            breaker_min_cooldown_minutes: parse_u64("DEX_BREAKER_MIN_COOLDOWN_MINUTES", 30)? as i64,

            max_drawdown_pct: parse_f64("DEX_MAX_DRAWDOWN_PCT", 35.0)?,

            stop_loss_cooldown_hours: parse_u64("DEX_STOP_LOSS_COOLDOWN_HOURS", 4)? as i64,
            reentry_recovery_pct: parse_f64("DEX_REENTRY_RECOVERY_PCT", 15.0)?,
            reentry_min_momentum: parse_f64("DEX_REENTRY_MIN_MOMENTUM", 70.0)?,
            reentry_min_elapsed_minutes: parse_u64("DEX_REENTRY_MIN_ELAPSED_MINUTES", 5)? as i64,

            cooldown_max_age_hours: parse_u64("DEX_COOLDOWN_MAX_AGE_HOURS", 24)? as i64,
        })
    }

    pub fn starting_balance_decimal(&self) -> Decimal {
        Decimal::from_f64(self.starting_balance_sol).unwrap_or(Decimal::from(10))
    }
}
