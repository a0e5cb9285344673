//! Configuration module for the agent.
//!
//! Structured environment loading by domain (broker/LLM/DEX credentials,
//! signal acquisition, DEX engine, equity/crypto trader, crisis monitor),
//! flattened into one `Config` used throughout `AgentState` — mirrors the
//! teacher's `config/mod.rs` aggregation of `BrokerEnvConfig` /
//! `StrategyEnvConfig` / `RiskEnvConfig` into one backward-compatible struct.

mod broker_config;
mod crisis_config;
mod dex_config;
mod env_util;
mod signal_config;
mod trader_config;

pub use broker_config::BrokerEnvConfig;
pub use crisis_config::CrisisEnvConfig;
pub use dex_config::DexEnvConfig;
pub use signal_config::SignalEnvConfig;
pub use trader_config::TraderEnvConfig;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Every tunable the agent uses, flattened from the five domain sub-configs
/// so the rest of the code can do `config.take_profit_pct` etc. (spec §6
/// "~100 tunables... every entry has a sane default so a blank config is
/// valid"). `Config` is embedded verbatim in the persisted `AgentState`
/// blob, so it derives `Serialize`/`Deserialize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // --- Broker / LLM / DEX provider / admin credentials ---
    pub broker_base_url: String,
    pub broker_api_key: String,
    pub broker_api_secret: String,
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub analyst_model: String,
    pub research_model: String,
    pub dex_provider_base_url: String,
    pub dex_provider_api_key: String,
    pub admin_api_token: String,
    pub kill_switch_secret: String,
    pub admin_bind_address: String,
    pub admin_port: u16,
    pub discord_webhook_url: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub fred_api_key: String,

    // --- Signal acquisition ---
    pub decay_half_life_minutes: f64,
    pub min_sentiment_score: f64,
    pub data_poll_interval_ms: u64,
    pub subreddits: Vec<String>,
    pub crypto_enabled: bool,
    pub stocks_enabled: bool,
    pub user_ticker_blacklist: Vec<String>,
    pub stocktwits_max_retries: u32,
    pub twitter_enabled: bool,
    pub twitter_daily_budget: u32,
    pub twitter_bearer_token: Option<String>,
    pub signal_research_batch: usize,
    pub research_interval_ms: u64,

    // --- DEX momentum engine ---
    pub dex_enabled: bool,
    pub dex_scan_interval_ms: u64,
    pub dex_starting_balance_sol: Decimal,
    pub dex_max_position_sol: f64,
    pub dex_max_single_position_pct: f64,
    pub dex_min_viable_sol: f64,
    pub dex_pct_of_balance: f64,
    pub dex_early_multiplier: f64,
    pub dex_max_positions: usize,
    pub microspray_position_sol: f64,
    pub breakout_position_sol: f64,
    pub lottery_position_sol: f64,
    pub microspray_min_liquidity_usd: f64,
    pub breakout_min_liquidity_usd: f64,
    pub lottery_min_liquidity_usd: f64,
    pub early_min_liquidity_usd: f64,
    pub established_min_liquidity_usd: f64,
    pub early_min_legitimacy: f64,
    pub dex_entry_min_momentum_score: f64,
    pub dex_chart_analysis_enabled: bool,
    pub dex_chart_min_entry_score: f64,
    pub dex_slippage_model: String,
    pub dex_gas_fee_sol: f64,
    pub sol_usd_fallback: f64,
    pub sol_usd_cache_ttl_secs: u64,
    pub take_profit_pct: f64,
    pub dex_stop_loss_pct: f64,
    pub trailing_stop_activation_pct: f64,
    pub trailing_stop_distance_pct: f64,
    pub lottery_trailing_activation_pct: f64,
    pub lottery_trailing_distance_pct: f64,
    pub missed_scan_exit_threshold: u32,
    pub momentum_decay_ratio: f64,
    pub liquidity_safety_multiplier: f64,
    pub circuit_breaker_losses: u32,
    pub circuit_breaker_window_hours: i64,
    pub circuit_breaker_pause_hours: i64,
    pub breaker_min_cooldown_minutes: i64,
    pub dex_max_drawdown_pct: f64,
    pub stop_loss_cooldown_hours: i64,
    pub reentry_recovery_pct: f64,
    pub reentry_min_momentum: f64,
    pub reentry_min_elapsed_minutes: i64,
    pub cooldown_max_age_hours: i64,

    // --- Equity/crypto trader, staleness, options ---
    pub analyst_interval_ms: u64,
    pub equity_take_profit_pct: f64,
    pub equity_stop_loss_pct: f64,
    pub position_size_pct_of_cash: f64,
    pub max_position_value: f64,
    pub min_analyst_confidence: f64,
    pub llm_min_hold_minutes: i64,
    pub allowed_exchanges: Vec<String>,
    pub stale_min_hold_hours: f64,
    pub stale_mid_hold_days: f64,
    pub stale_max_hold_days: f64,
    pub stale_mid_min_gain_pct: f64,
    pub stale_min_gain_pct: f64,
    pub stale_social_volume_decay: f64,
    pub stale_score_threshold: f64,
    pub options_enabled: bool,
    pub options_min_confidence: f64,
    pub options_min_dte: i64,
    pub options_max_dte: i64,
    pub options_min_delta: f64,
    pub options_max_delta: f64,
    pub options_max_quote_spread_pct: f64,
    pub options_max_pct_per_trade: f64,
    pub options_stop_loss_pct: f64,
    pub options_take_profit_pct: f64,
    pub twitter_confirmation_enabled: bool,
    pub twitter_confirm_boost: f64,
    pub twitter_contradict_penalty: f64,

    // --- Crisis monitor ---
    pub crisis_mode_enabled: bool,
    pub crisis_check_interval_ms: u64,
    pub vix_warning: f64,
    pub vix_critical: f64,
    pub hy_spread_warning: f64,
    pub hy_spread_critical: f64,
    pub yield_curve_warning: f64,
    pub ted_spread_warning: f64,
    pub ted_spread_critical: f64,
    pub btc_weekly_drop_warning_pct: f64,
    pub btc_weekly_drop_critical_pct: f64,
    pub usdt_depeg_warning: f64,
    pub dxy_warning: f64,
    pub usdjpy_warning: f64,
    pub kre_weekly_drop_warning_pct: f64,
    pub gold_silver_ratio_warning: f64,
    pub silver_weekly_drop_warning_pct: f64,
    pub fed_balance_drop_warning_pct: f64,
    pub crisis_level1_stop_loss_pct: f64,
    pub crisis_level2_min_profit_to_hold_pct: f64,
    pub fred_series_ted: String,
    pub fred_series_yield_curve: String,
    pub fred_series_fed_balance: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let broker = BrokerEnvConfig::from_env()?;
        let signal = SignalEnvConfig::from_env()?;
        let dex = DexEnvConfig::from_env()?;
        let trader = TraderEnvConfig::from_env()?;
        let crisis = CrisisEnvConfig::from_env()?;

        Ok(Self {
            broker_base_url: broker.broker_base_url,
            broker_api_key: broker.broker_api_key,
            broker_api_secret: broker.broker_api_secret,
            llm_base_url: broker.llm_base_url,
            llm_api_key: broker.llm_api_key,
            analyst_model: broker.analyst_model,
            research_model: broker.research_model,
            dex_provider_base_url: broker.dex_provider_base_url,
            dex_provider_api_key: broker.dex_provider_api_key,
            admin_api_token: broker.admin_api_token,
            kill_switch_secret: broker.kill_switch_secret,
            admin_bind_address: broker.admin_bind_address,
            admin_port: broker.admin_port,
            discord_webhook_url: broker.discord_webhook_url,
            telegram_bot_token: broker.telegram_bot_token,
            telegram_chat_id: broker.telegram_chat_id,
            fred_api_key: broker.fred_api_key,

            decay_half_life_minutes: signal.decay_half_life_minutes,
            min_sentiment_score: signal.min_sentiment_score,
            data_poll_interval_ms: signal.data_poll_interval_ms,
            subreddits: signal.subreddits,
            crypto_enabled: signal.crypto_enabled,
            stocks_enabled: signal.stocks_enabled,
            user_ticker_blacklist: signal.user_ticker_blacklist,
            stocktwits_max_retries: signal.stocktwits_max_retries,
            twitter_enabled: signal.twitter_enabled,
            twitter_daily_budget: signal.twitter_daily_budget,
            twitter_bearer_token: signal.twitter_bearer_token,
            signal_research_batch: signal.signal_research_batch,
            research_interval_ms: signal.research_interval_ms,

            dex_enabled: dex.enabled,
            dex_scan_interval_ms: dex.scan_interval_ms,
            dex_starting_balance_sol: dex.starting_balance_decimal(),
            dex_max_position_sol: dex.max_position_sol,
            dex_max_single_position_pct: dex.max_single_position_pct,
            dex_min_viable_sol: dex.min_viable_sol,
            dex_pct_of_balance: dex.pct_of_balance,
            dex_early_multiplier: dex.early_multiplier,
            dex_max_positions: dex.max_positions,
            microspray_position_sol: dex.microspray_position_sol,
            breakout_position_sol: dex.breakout_position_sol,
            lottery_position_sol: dex.lottery_position_sol,
            microspray_min_liquidity_usd: dex.microspray_min_liquidity_usd,
            breakout_min_liquidity_usd: dex.breakout_min_liquidity_usd,
            lottery_min_liquidity_usd: dex.lottery_min_liquidity_usd,
            early_min_liquidity_usd: dex.early_min_liquidity_usd,
            established_min_liquidity_usd: dex.established_min_liquidity_usd,
            early_min_legitimacy: dex.early_min_legitimacy,
            dex_entry_min_momentum_score: dex.entry_min_momentum_score,
            dex_chart_analysis_enabled: dex.chart_analysis_enabled,
            dex_chart_min_entry_score: dex.chart_min_entry_score,
            dex_slippage_model: dex.slippage_model,
            dex_gas_fee_sol: dex.gas_fee_sol,
            sol_usd_fallback: dex.sol_usd_fallback,
            sol_usd_cache_ttl_secs: dex.sol_usd_cache_ttl_secs,
            take_profit_pct: dex.take_profit_pct,
            dex_stop_loss_pct: dex.stop_loss_pct,
            trailing_stop_activation_pct: dex.trailing_stop_activation_pct,
            trailing_stop_distance_pct: dex.trailing_stop_distance_pct,
            lottery_trailing_activation_pct: dex.lottery_trailing_activation_pct,
            lottery_trailing_distance_pct: dex.lottery_trailing_distance_pct,
            missed_scan_exit_threshold: dex.missed_scan_exit_threshold,
            momentum_decay_ratio: dex.momentum_decay_ratio,
            liquidity_safety_multiplier: dex.liquidity_safety_multiplier,
            circuit_breaker_losses: dex.circuit_breaker_losses,
            circuit_breaker_window_hours: dex.circuit_breaker_window_hours,
            circuit_breaker_pause_hours: dex.circuit_breaker_pause_hours,
            breaker_min_cooldown_minutes: dex.breaker_min_cooldown_minutes,
            dex_max_drawdown_pct: dex.max_drawdown_pct,
            stop_loss_cooldown_hours: dex.stop_loss_cooldown_hours,
            reentry_recovery_pct: dex.reentry_recovery_pct,
            reentry_min_momentum: dex.reentry_min_momentum,
            reentry_min_elapsed_minutes: dex.reentry_min_elapsed_minutes,
            cooldown_max_age_hours: dex.cooldown_max_age_hours,

            analyst_interval_ms: trader.analyst_interval_ms,
            equity_take_profit_pct: trader.take_profit_pct,
            equity_stop_loss_pct: trader.stop_loss_pct,
            position_size_pct_of_cash: trader.position_size_pct_of_cash,
            max_position_value: trader.max_position_value,
            min_analyst_confidence: trader.min_analyst_confidence,
            llm_min_hold_minutes: trader.llm_min_hold_minutes,
            allowed_exchanges: trader.allowed_exchanges,
            stale_min_hold_hours: trader.stale_min_hold_hours,
            stale_mid_hold_days: trader.stale_mid_hold_days,
            stale_max_hold_days: trader.stale_max_hold_days,
            stale_mid_min_gain_pct: trader.stale_mid_min_gain_pct,
            stale_min_gain_pct: trader.stale_min_gain_pct,
            stale_social_volume_decay: trader.stale_social_volume_decay,
            stale_score_threshold: trader.stale_score_threshold,
            options_enabled: trader.options_enabled,
            options_min_confidence: trader.options_min_confidence,
            options_min_dte: trader.options_min_dte,
            options_max_dte: trader.options_max_dte,
            options_min_delta: trader.options_min_delta,
            options_max_delta: trader.options_max_delta,
            options_max_quote_spread_pct: trader.options_max_quote_spread_pct,
            options_max_pct_per_trade: trader.options_max_pct_per_trade,
            options_stop_loss_pct: trader.options_stop_loss_pct,
            options_take_profit_pct: trader.options_take_profit_pct,
            twitter_confirmation_enabled: trader.twitter_confirmation_enabled,
            twitter_confirm_boost: trader.twitter_confirm_boost,
            twitter_contradict_penalty: trader.twitter_contradict_penalty,

            crisis_mode_enabled: crisis.enabled,
            crisis_check_interval_ms: crisis.check_interval_ms,
            vix_warning: crisis.vix_warning,
            vix_critical: crisis.vix_critical,
            hy_spread_warning: crisis.hy_spread_warning,
            hy_spread_critical: crisis.hy_spread_critical,
            yield_curve_warning: crisis.yield_curve_warning,
            ted_spread_warning: crisis.ted_spread_warning,
            ted_spread_critical: crisis.ted_spread_critical,
            btc_weekly_drop_warning_pct: crisis.btc_weekly_drop_warning_pct,
            btc_weekly_drop_critical_pct: crisis.btc_weekly_drop_critical_pct,
            usdt_depeg_warning: crisis.usdt_depeg_warning,
            dxy_warning: crisis.dxy_warning,
            usdjpy_warning: crisis.usdjpy_warning,
            kre_weekly_drop_warning_pct: crisis.kre_weekly_drop_warning_pct,
            gold_silver_ratio_warning: crisis.gold_silver_ratio_warning,
            silver_weekly_drop_warning_pct: crisis.silver_weekly_drop_warning_pct,
            fed_balance_drop_warning_pct: crisis.fed_balance_drop_warning_pct,
            crisis_level1_stop_loss_pct: crisis.level1_stop_loss_pct,
            crisis_level2_min_profit_to_hold_pct: crisis.level2_min_profit_to_hold_pct,
            fred_series_ted: crisis.fred_series_ted,
            fred_series_yield_curve: crisis.fred_series_yield_curve,
            fred_series_fed_balance: crisis.fred_series_fed_balance,
        })
    }

    /// Migration-on-load: any NaN tunable (e.g. corrupted persisted state)
    /// is reset to the environment default, and an invalid paper balance is
    /// reset to the configured starting balance (spec §4.1, §6 "Migration on
    /// load").
    pub fn migrate(&mut self) {
        let defaults = Config::from_env().unwrap_or_else(|_| self.clone());
        macro_rules! fix_nan {
            ($field:ident) => {
                if self.$field.is_nan() {
                    self.$field = defaults.$field;
                }
            };
        }
        fix_nan!(decay_half_life_minutes);
        fix_nan!(min_sentiment_score);
        fix_nan!(dex_max_position_sol);
        fix_nan!(dex_max_single_position_pct);
        fix_nan!(take_profit_pct);
        fix_nan!(dex_stop_loss_pct);
        fix_nan!(equity_take_profit_pct);
        fix_nan!(equity_stop_loss_pct);
        fix_nan!(dex_max_drawdown_pct);
        fix_nan!(vix_warning);
        fix_nan!(vix_critical);

        if self.dex_starting_balance_sol.is_sign_negative() || self.dex_starting_balance_sol.is_zero()
        {
            self.dex_starting_balance_sol = defaults.dex_starting_balance_sol;
        }
    }

    /// Apply a partial JSON patch (spec §6 admin surface "`POST /config` ->
    /// partial config merge"): only the keys present in `patch` are
    /// overwritten, everything else is left as-is. Re-runs [`Config::migrate`]
    /// afterwards so a patch can't reintroduce a NaN/invalid tunable.
    pub fn apply_patch(&mut self, patch: &serde_json::Value) -> Result<()> {
        let mut current = serde_json::to_value(&*self)?;
        if let (Some(current_obj), Some(patch_obj)) = (current.as_object_mut(), patch.as_object()) {
            for (key, value) in patch_obj {
                current_obj.insert(key.clone(), value.clone());
            }
        }
        *self = serde_json::from_value(current)?;
        self.migrate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_succeeds_on_blank_environment() {
        // Every field has a default, so a blank process env must still
        // produce a valid config (spec §6).
        let cfg = Config::from_env();
        assert!(cfg.is_ok());
    }

    #[test]
    fn migrate_resets_nan_fields_to_defaults() {
        let mut cfg = Config::from_env().unwrap();
        cfg.vix_warning = f64::NAN;
        cfg.migrate();
        assert!(cfg.vix_warning.is_finite());
    }

    #[test]
    fn apply_patch_overwrites_only_named_keys() {
        let mut cfg = Config::from_env().unwrap();
        let original_interval = cfg.data_poll_interval_ms;
        cfg.apply_patch(&serde_json::json!({ "take_profit_pct": 250.0 })).unwrap();
        assert_eq!(cfg.take_profit_pct, 250.0);
        assert_eq!(cfg.data_poll_interval_ms, original_interval);
    }

    #[test]
    fn migrate_resets_invalid_dex_balance() {
        let mut cfg = Config::from_env().unwrap();
        cfg.dex_starting_balance_sol = Decimal::ZERO;
        cfg.migrate();
        assert!(cfg.dex_starting_balance_sol > Decimal::ZERO);
    }
}
