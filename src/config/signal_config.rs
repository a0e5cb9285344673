//! Signal acquisition tunables (spec §4.2).

use anyhow::Result;

use super::env_util::{parse_bool, parse_f64, parse_string_list, parse_u64, parse_usize};

#[derive(Debug, Clone)]
pub struct SignalEnvConfig {
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
}

impl SignalEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            decay_half_life_minutes: parse_f64("DECAY_HALF_LIFE_MINUTES", 120.0)?,
            min_sentiment_score: parse_f64("MIN_SENTIMENT_SCORE", 0.3)?,
            data_poll_interval_ms: parse_u64("DATA_POLL_INTERVAL_MS", 60_000)?,
            subreddits: parse_string_list("SUBREDDITS", "wsb,stocks,investing,options"),
            crypto_enabled: parse_bool("CRYPTO_SIGNALS_ENABLED", true),
            stocks_enabled: parse_bool("STOCKS_ENABLED", true),
            user_ticker_blacklist: parse_string_list("USER_TICKER_BLACKLIST", ""),
            stocktwits_max_retries: 3,
            twitter_enabled: parse_bool("TWITTER_ENABLED", false),
            twitter_daily_budget: 200,
            twitter_bearer_token: std::env::var("TWITTER_BEARER_TOKEN").ok(),
            signal_research_batch: parse_usize("SIGNAL_RESEARCH_BATCH", 5),
            research_interval_ms: parse_u64("RESEARCH_INTERVAL_MS", 120_000)?,
        })
    }
}
