//! In-memory mock implementations of every port trait, used by integration
//! tests (spec §8 invariants exercised end-to-end through [`Agent::tick`](crate::application::actor::Agent)).
//! Grounded in the teacher's `infrastructure/mock.rs` `Arc<RwLock<..>>`-backed
//! state pattern, simplified since these ports are directly-callable rather
//! than subscription streams.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::domain::dex::DexCandidate;
use crate::domain::ports::{
    AlarmScheduler, BrokerAdapter, ChartAnalysis, ChartAnalyzer, ChartSignal, CompletionRequest,
    CompletionResponse, CrisisIndicatorSource, DexProvider, LlmClient, Notifier, StateStore,
    TierFilters, TwitterClient, Usage,
};
use crate::domain::state::TwitterConfirmation;
use crate::domain::trading::{Account, AssetInfo, MarketClock, OptionContract, OrderRequest, Position, Snapshot};

#[derive(Clone)]
pub struct MockBroker {
    pub account: Arc<RwLock<Account>>,
    pub positions: Arc<RwLock<HashMap<String, Position>>>,
    pub clock: Arc<RwLock<MarketClock>>,
    pub prices: Arc<RwLock<HashMap<String, Decimal>>>,
    pub tradable: Arc<RwLock<HashMap<String, bool>>>,
    pub closed: Arc<RwLock<Vec<String>>>,
    pub orders: Arc<RwLock<Vec<OrderRequest>>>,
    pub option_expirations: Arc<RwLock<HashMap<String, Vec<NaiveDate>>>>,
    pub option_chains: Arc<RwLock<HashMap<(String, NaiveDate), Vec<OptionContract>>>>,
}

impl MockBroker {
    pub fn new(cash: Decimal) -> Self {
        let now = Utc::now();
        Self {
            account: Arc::new(RwLock::new(Account {
                cash,
                equity: cash,
                daytrade_count: 0,
            })),
            positions: Arc::new(RwLock::new(HashMap::new())),
            clock: Arc::new(RwLock::new(MarketClock {
                is_open: true,
                now,
                next_open: now,
                next_close: now + chrono::Duration::hours(6),
            })),
            prices: Arc::new(RwLock::new(HashMap::new())),
            tradable: Arc::new(RwLock::new(HashMap::new())),
            closed: Arc::new(RwLock::new(Vec::new())),
            orders: Arc::new(RwLock::new(Vec::new())),
            option_expirations: Arc::new(RwLock::new(HashMap::new())),
            option_chains: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn set_option_chain(&self, underlying: &str, expiration: NaiveDate, chain: Vec<OptionContract>) {
        self.option_expirations
            .write()
            .await
            .entry(underlying.to_string())
            .or_default()
            .push(expiration);
        self.option_chains.write().await.insert((underlying.to_string(), expiration), chain);
    }

    pub async fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices.write().await.insert(symbol.to_string(), price);
    }

    pub async fn set_tradable(&self, symbol: &str, tradable: bool) {
        self.tradable.write().await.insert(symbol.to_string(), tradable);
    }

    pub async fn set_market_open(&self, open: bool) {
        self.clock.write().await.is_open = open;
    }
}

#[async_trait]
impl BrokerAdapter for MockBroker {
    async fn get_account(&self) -> Result<Account> {
        Ok(self.account.read().await.clone())
    }

    async fn get_positions(&self) -> Result<Vec<Position>> {
        Ok(self.positions.read().await.values().cloned().collect())
    }

    async fn get_clock(&self) -> Result<MarketClock> {
        Ok(self.clock.read().await.clone())
    }

    async fn get_asset(&self, symbol: &str) -> Result<AssetInfo> {
        let tradable = self.tradable.read().await.get(symbol).copied().unwrap_or(true);
        Ok(AssetInfo {
            symbol: symbol.to_string(),
            exchange: "NASDAQ".to_string(),
            tradable,
        })
    }

    async fn get_snapshot(&self, symbol: &str) -> Result<Snapshot> {
        let price = self.prices.read().await.get(symbol).copied().unwrap_or(Decimal::ONE);
        Ok(Snapshot {
            symbol: symbol.to_string(),
            price,
            bid: price,
            ask: price,
            timestamp: Utc::now(),
        })
    }

    async fn get_crypto_snapshot(&self, symbol: &str) -> Result<Snapshot> {
        self.get_snapshot(symbol).await
    }

    async fn create_order(&self, order: OrderRequest) -> Result<()> {
        self.orders.write().await.push(order);
        Ok(())
    }

    async fn close_position(&self, symbol: &str) -> Result<()> {
        self.positions.write().await.remove(symbol);
        self.closed.write().await.push(symbol.to_string());
        Ok(())
    }

    async fn get_option_expirations(&self, underlying: &str) -> Result<Vec<NaiveDate>> {
        Ok(self.option_expirations.read().await.get(underlying).cloned().unwrap_or_default())
    }

    async fn get_option_chain(&self, underlying: &str, expiration: NaiveDate) -> Result<Vec<OptionContract>> {
        Ok(self
            .option_chains
            .read()
            .await
            .get(&(underlying.to_string(), expiration))
            .cloned()
            .unwrap_or_default())
    }
}

/// Always returns a fixed verdict, useful for deterministic trader tests.
pub struct MockLlmClient {
    pub response: String,
}

impl MockLlmClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }

    pub fn hold() -> Self {
        Self::new(r#"{"verdict":"HOLD","confidence":0.5,"reasoning":"mock"}"#)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
        Ok(CompletionResponse {
            content: self.response.clone(),
            usage: Usage {
                prompt_tokens: 100,
                completion_tokens: 50,
            },
        })
    }
}

#[derive(Clone, Default)]
pub struct MockDexProvider {
    pub candidates: Arc<RwLock<Vec<DexCandidate>>>,
    pub sol_price: Arc<RwLock<Decimal>>,
}

impl MockDexProvider {
    pub fn new(sol_price: Decimal) -> Self {
        Self {
            candidates: Arc::new(RwLock::new(Vec::new())),
            sol_price: Arc::new(RwLock::new(sol_price)),
        }
    }

    pub async fn push(&self, candidate: DexCandidate) {
        self.candidates.write().await.push(candidate);
    }
}

#[async_trait]
impl DexProvider for MockDexProvider {
    async fn find_momentum_tokens(&self, tier_filters: &TierFilters) -> Result<Vec<DexCandidate>> {
        let candidates = self.candidates.read().await;
        Ok(candidates
            .iter()
            .filter(|c| {
                c.liquidity_usd >= tier_filters.min_liquidity_usd
                    && c.age_hours >= tier_filters.min_age_hours
                    && c.age_hours <= tier_filters.max_age_hours
            })
            .cloned()
            .collect())
    }

    async fn sol_usd_price(&self) -> Result<Decimal> {
        Ok(*self.sol_price.read().await)
    }
}

pub struct MockChartAnalyzer {
    pub signal: ChartSignal,
    pub entry_score: f64,
}

impl MockChartAnalyzer {
    pub fn new(signal: ChartSignal, entry_score: f64) -> Self {
        Self { signal, entry_score }
    }
}

#[async_trait]
impl ChartAnalyzer for MockChartAnalyzer {
    async fn analyze_chart(&self, _address: &str, _age_hours: f64) -> Result<Option<ChartAnalysis>> {
        Ok(Some(ChartAnalysis {
            entry_score: self.entry_score,
            recommendation: self.signal.clone(),
        }))
    }
}

/// A crisis indicator source returning a fixed, settable value.
pub struct MockIndicatorSource {
    name: &'static str,
    value: Arc<RwLock<Option<f64>>>,
}

impl MockIndicatorSource {
    pub fn new(name: &'static str, value: Option<f64>) -> Self {
        Self {
            name,
            value: Arc::new(RwLock::new(value)),
        }
    }

    pub async fn set(&self, value: Option<f64>) {
        *self.value.write().await = value;
    }
}

#[async_trait]
impl CrisisIndicatorSource for MockIndicatorSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self) -> Option<f64> {
        *self.value.read().await
    }
}

#[derive(Clone, Default)]
pub struct MockNotifier {
    pub sent: Arc<RwLock<Vec<String>>>,
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.sent.write().await.push(message.to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockStateStore {
    blob: Arc<RwLock<Option<Vec<u8>>>>,
    alarm: Arc<RwLock<Option<DateTime<Utc>>>>,
}

#[async_trait]
impl StateStore for MockStateStore {
    async fn load(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.blob.read().await.clone())
    }

    async fn save(&self, blob: &[u8]) -> Result<()> {
        *self.blob.write().await = Some(blob.to_vec());
        Ok(())
    }

    async fn load_alarm(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(*self.alarm.read().await)
    }

    async fn save_alarm(&self, at: DateTime<Utc>) -> Result<()> {
        *self.alarm.write().await = Some(at);
        Ok(())
    }

    async fn clear_alarm(&self) -> Result<()> {
        *self.alarm.write().await = None;
        Ok(())
    }
}

/// Reports a fixed, settable verdict for every symbol.
#[derive(Clone)]
pub struct MockTwitterClient {
    pub verdicts: Arc<RwLock<HashMap<String, TwitterConfirmation>>>,
    pub default: TwitterConfirmation,
}

impl MockTwitterClient {
    pub fn new(default: TwitterConfirmation) -> Self {
        Self {
            verdicts: Arc::new(RwLock::new(HashMap::new())),
            default,
        }
    }

    pub async fn set(&self, symbol: &str, verdict: TwitterConfirmation) {
        self.verdicts.write().await.insert(symbol.to_string(), verdict);
    }
}

#[async_trait]
impl TwitterClient for MockTwitterClient {
    async fn check_symbol(&self, symbol: &str) -> Result<TwitterConfirmation> {
        Ok(self.verdicts.read().await.get(symbol).copied().unwrap_or(self.default))
    }
}

#[derive(Clone, Default)]
pub struct MockAlarmScheduler {
    pub reschedules: Arc<RwLock<Vec<i64>>>,
    pub cancelled: Arc<RwLock<bool>>,
}

#[async_trait]
impl AlarmScheduler for MockAlarmScheduler {
    async fn reschedule(&self, delay_secs: i64) -> Result<()> {
        self.reschedules.write().await.push(delay_secs);
        Ok(())
    }

    async fn cancel(&self) -> Result<()> {
        *self.cancelled.write().await = true;
        Ok(())
    }
}
