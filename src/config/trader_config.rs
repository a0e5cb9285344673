//! Equity/crypto trader, staleness, PDT and options tunables (spec §4.4,
//! §4.5, §4.7).

use anyhow::Result;

use super::env_util::{parse_bool, parse_f64, parse_string_list, parse_u64};

#[derive(Debug, Clone)]
pub struct TraderEnvConfig {
    pub analyst_interval_ms: u64,
    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,
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
}

impl TraderEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            analyst_interval_ms: parse_u64("ANALYST_INTERVAL_MS", 180_000)?,
            take_profit_pct: parse_f64("TAKE_PROFIT_PCT", 20.0)?,
            stop_loss_pct: parse_f64("STOP_LOSS_PCT", 10.0)?,
            position_size_pct_of_cash: parse_f64("POSITION_SIZE_PCT_OF_CASH", 10.0)?,
            max_position_value: parse_f64("MAX_POSITION_VALUE", 2_000.0)?,
            min_analyst_confidence: parse_f64("MIN_ANALYST_CONFIDENCE", 0.65)?,
            llm_min_hold_minutes: parse_u64("LLM_MIN_HOLD_MINUTES", 30)? as i64,
            allowed_exchanges: parse_string_list("ALLOWED_EXCHANGES", "NYSE,NASDAQ,ARCA,BATS"),

            stale_min_hold_hours: parse_f64("STALE_MIN_HOLD_HOURS", 24.0)?,
            stale_mid_hold_days: parse_f64("STALE_MID_HOLD_DAYS", 3.0)?,
            stale_max_hold_days: parse_f64("STALE_MAX_HOLD_DAYS", 10.0)?,
            stale_mid_min_gain_pct: parse_f64("STALE_MID_MIN_GAIN_PCT", 5.0)?,
            stale_min_gain_pct: parse_f64("STALE_MIN_GAIN_PCT", 10.0)?,
            stale_social_volume_decay: parse_f64("STALE_SOCIAL_VOLUME_DECAY", 0.25)?,
            stale_score_threshold: parse_f64("STALE_SCORE_THRESHOLD", 70.0)?,

            options_enabled: parse_bool("OPTIONS_ENABLED", false),
            options_min_confidence: parse_f64("OPTIONS_MIN_CONFIDENCE", 0.8)?,
            options_min_dte: parse_u64("OPTIONS_MIN_DTE", 14)? as i64,
            options_max_dte: parse_u64("OPTIONS_MAX_DTE", 45)? as i64,
            options_min_delta: parse_f64("OPTIONS_MIN_DELTA", 0.3)?,
            options_max_delta: parse_f64("OPTIONS_MAX_DELTA", 0.6)?,
            options_max_quote_spread_pct: parse_f64("OPTIONS_MAX_QUOTE_SPREAD_PCT", 10.0)?,
            options_max_pct_per_trade: parse_f64("OPTIONS_MAX_PCT_PER_TRADE", 0.02)?,
            options_stop_loss_pct: parse_f64("OPTIONS_STOP_LOSS_PCT", 40.0)?,
            options_take_profit_pct: parse_f64("OPTIONS_TAKE_PROFIT_PCT", 60.0)?,

            twitter_confirmation_enabled: parse_bool("TWITTER_CONFIRMATION_ENABLED", false),
            twitter_confirm_boost: parse_f64("TWITTER_CONFIRM_BOOST", 1.15)?,
            twitter_contradict_penalty: parse_f64("TWITTER_CONTRADICT_PENALTY", 0.85)?,
        })
    }
}
