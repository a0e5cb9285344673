//! Broker, LLM, DEX provider and admin credentials/URLs (spec §6).

use anyhow::Result;

use super::env_util::{parse_string, parse_u16};

#[derive(Debug, Clone)]
pub struct BrokerEnvConfig {
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
}

impl BrokerEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            broker_base_url: parse_string("BROKER_BASE_URL", "https://paper-api.example.com"),
            broker_api_key: parse_string("BROKER_API_KEY", ""),
            broker_api_secret: parse_string("BROKER_API_SECRET", ""),

            llm_base_url: parse_string("LLM_BASE_URL", "https://api.openai.com/v1"),
            llm_api_key: parse_string("LLM_API_KEY", ""),
            analyst_model: parse_string("ANALYST_MODEL", "gpt-4o"),
            research_model: parse_string("RESEARCH_MODEL", "gpt-4o-mini"),

            dex_provider_base_url: parse_string("DEX_PROVIDER_BASE_URL", "https://public-api.birdeye.so"),
            dex_provider_api_key: parse_string("DEX_PROVIDER_API_KEY", ""),

            admin_api_token: parse_string("API_TOKEN", ""),
            kill_switch_secret: parse_string("KILL_SWITCH_SECRET", ""),
            admin_bind_address: parse_string("ADMIN_BIND_ADDRESS", "0.0.0.0"),
            admin_port: parse_u16("ADMIN_PORT", 8787)?,

            discord_webhook_url: std::env::var("DISCORD_WEBHOOK_URL").ok(),
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID").ok(),

            fred_api_key: parse_string("FRED_API_KEY", ""),
        })
    }
}
