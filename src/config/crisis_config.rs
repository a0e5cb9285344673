//! Crisis monitor tunables (spec §4.6): indicator thresholds, check
//! cadence, and the de-risking multipliers/stop percentages per level.

use anyhow::Result;

use super::env_util::{parse_bool, parse_f64, parse_u64};

#[derive(Debug, Clone)]
pub struct CrisisEnvConfig {
    pub enabled: bool,
    pub check_interval_ms: u64,

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

    pub level1_stop_loss_pct: f64,
    pub level2_min_profit_to_hold_pct: f64,

    pub fred_series_ted: String,
    pub fred_series_yield_curve: String,
    pub fred_series_fed_balance: String,
}

impl CrisisEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            enabled: parse_bool("CRISIS_MODE_ENABLED", true),
            check_interval_ms: parse_u64("CRISIS_CHECK_INTERVAL_MS", 300_000)?,

            vix_warning: parse_f64("CRISIS_VIX_WARNING", 30.0)?,
            vix_critical: parse_f64("CRISIS_VIX_CRITICAL", 40.0)?,
            hy_spread_warning: parse_f64("CRISIS_HY_SPREAD_WARNING", 500.0)?,
            hy_spread_critical: parse_f64("CRISIS_HY_SPREAD_CRITICAL", 600.0)?,
            yield_curve_warning: parse_f64("CRISIS_YIELD_CURVE_WARNING", 0.0)?,
            ted_spread_warning: parse_f64("CRISIS_TED_SPREAD_WARNING", 0.5)?,
            ted_spread_critical: parse_f64("CRISIS_TED_SPREAD_CRITICAL", 1.0)?,
            btc_weekly_drop_warning_pct: parse_f64("CRISIS_BTC_WEEKLY_DROP_WARNING_PCT", -15.0)?,
            btc_weekly_drop_critical_pct: parse_f64("CRISIS_BTC_WEEKLY_DROP_CRITICAL_PCT", -20.0)?,
            usdt_depeg_warning: parse_f64("CRISIS_USDT_DEPEG_WARNING", 0.02)?,
            dxy_warning: parse_f64("CRISIS_DXY_WARNING", 108.0)?,
            usdjpy_warning: parse_f64("CRISIS_USDJPY_WARNING", 155.0)?,
            kre_weekly_drop_warning_pct: parse_f64("CRISIS_KRE_WEEKLY_DROP_WARNING_PCT", -10.0)?,
            gold_silver_ratio_warning: parse_f64("CRISIS_GOLD_SILVER_RATIO_WARNING", 85.0)?,
            silver_weekly_drop_warning_pct: parse_f64("CRISIS_SILVER_WEEKLY_DROP_WARNING_PCT", -10.0)?,
            fed_balance_drop_warning_pct: parse_f64("CRISIS_FED_BALANCE_DROP_WARNING_PCT", -2.0)?,

            level1_stop_loss_pct: parse_f64("CRISIS_LEVEL1_STOP_LOSS_PCT", 5.0)?,
            level2_min_profit_to_hold_pct: parse_f64("CRISIS_LEVEL2_MIN_PROFIT_TO_HOLD_PCT", 2.0)?,

            fred_series_ted: super::env_util::parse_string("FRED_SERIES_TED", "TEDRATE"),
            fred_series_yield_curve: super::env_util::parse_string(
                "FRED_SERIES_YIELD_CURVE",
                "T10Y2Y",
            ),
            fred_series_fed_balance: super::env_util::parse_string(
                "FRED_SERIES_FED_BALANCE",
                "WALCL",
            ),
        })
    }
}
