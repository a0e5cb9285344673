//! External collaborators as narrow async traits (spec §6), mirroring the
//! teacher's `domain/ports.rs` `MarketDataService`/`ExecutionService` split.
//! Every tick-time call returns `anyhow::Result`; failures are caught and
//! logged at the call site (spec §7, §9 "never throw across the tick
//! boundary").

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::dex::DexCandidate;
use crate::domain::trading::{
    Account, AssetInfo, MarketClock, OptionContract, OrderRequest, Position, Snapshot,
};

#[async_trait]
pub trait BrokerAdapter: Send + Sync {
    async fn get_account(&self) -> Result<Account>;
    async fn get_positions(&self) -> Result<Vec<Position>>;
    async fn get_clock(&self) -> Result<MarketClock>;
    async fn get_asset(&self, symbol: &str) -> Result<AssetInfo>;
    async fn get_snapshot(&self, symbol: &str) -> Result<Snapshot>;
    async fn get_crypto_snapshot(&self, symbol: &str) -> Result<Snapshot>;
    async fn create_order(&self, order: OrderRequest) -> Result<()>;
    async fn close_position(&self, symbol: &str) -> Result<()>;
    async fn get_option_expirations(&self, underlying: &str) -> Result<Vec<chrono::NaiveDate>>;
    async fn get_option_chain(
        &self,
        underlying: &str,
        expiration: chrono::NaiveDate,
    ) -> Result<Vec<OptionContract>>;
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub json_mode: bool,
}

#[derive(Debug, Clone)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: Usage,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}

#[async_trait]
pub trait DexProvider: Send + Sync {
    async fn find_momentum_tokens(&self, tier_filters: &TierFilters) -> Result<Vec<DexCandidate>>;
    async fn sol_usd_price(&self) -> Result<Decimal>;
}

#[derive(Debug, Clone)]
pub struct TierFilters {
    pub tier: crate::domain::dex::Tier,
    pub min_liquidity_usd: f64,
    pub min_age_hours: f64,
    pub max_age_hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartSignal {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone)]
pub struct ChartAnalysis {
    pub entry_score: f64,
    pub recommendation: ChartSignal,
}

#[async_trait]
pub trait ChartAnalyzer: Send + Sync {
    async fn analyze_chart(&self, address: &str, age_hours: f64) -> Result<Option<ChartAnalysis>>;
}

#[async_trait]
pub trait CrisisIndicatorSource: Send + Sync {
    /// Name used in `triggered_indicators` logging.
    fn name(&self) -> &'static str;
    /// All failures degrade to `None` (spec §6 "all failures -> null").
    async fn fetch(&self) -> Option<f64>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Twitter/X breaking-news confirmation for held symbols (spec §4.4 "Twitter
/// confirmation", §5 "Twitter daily-read counter: ... budget 200/day"). The
/// daily budget is enforced by the caller against `AgentState`, not here,
/// since it is persisted tick-to-tick state rather than a transport concern.
#[async_trait]
pub trait TwitterClient: Send + Sync {
    async fn check_symbol(&self, symbol: &str) -> Result<crate::domain::state::TwitterConfirmation>;
}

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<Option<Vec<u8>>>;
    async fn save(&self, blob: &[u8]) -> Result<()>;
    async fn load_alarm(&self) -> Result<Option<DateTime<Utc>>>;
    async fn save_alarm(&self, at: DateTime<Utc>) -> Result<()>;
    async fn clear_alarm(&self) -> Result<()>;
}

#[async_trait]
pub trait AlarmScheduler: Send + Sync {
    async fn reschedule(&self, delay_secs: i64) -> Result<()>;
    async fn cancel(&self) -> Result<()>;
}
