//! Birdeye-style DEX token discovery and chart analysis (spec §4.3, §6 "DEX
//! provider" / "Chart analyzer"). No DEX aggregator client exists in the
//! teacher's tree; grounded instead in the pack's own Birdeye clients
//! (`affaan-m-Sol-Onchain-Analyst/src/providers/birdeye.rs`,
//! `mgunnin-cainam-arc/rig-solana-trader/src/market_data/birdeye.rs`),
//! generalized to a token-list scan and reusing the teacher's
//! `HttpClientFactory` retry/pool transport.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::dex::DexCandidate;
use crate::domain::ports::{ChartAnalysis, ChartAnalyzer, ChartSignal, DexProvider, TierFilters};
use crate::infrastructure::core::http_client_factory::HttpClientFactory;

pub struct BirdeyeDexProvider {
    api_key: String,
    client: ClientWithMiddleware,
    base_url: String,
}

impl BirdeyeDexProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: HttpClientFactory::create_client(),
            base_url: "https://public-api.birdeye.so".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenListResponse {
    data: TokenListData,
}

#[derive(Debug, Deserialize)]
struct TokenListData {
    tokens: Vec<RawToken>,
}

#[derive(Debug, Deserialize)]
struct RawToken {
    address: String,
    symbol: String,
    name: String,
    #[serde(default)]
    price: f64,
    #[serde(rename = "v24hUSD", default)]
    volume_24h: f64,
    #[serde(rename = "liquidity", default)]
    liquidity_usd: f64,
    #[serde(rename = "v24hChangePercent", default)]
    price_change_24h: f64,
    #[serde(rename = "v6hChangePercent", default)]
    price_change_6h: f64,
    #[serde(rename = "v5mChangePercent", default)]
    price_change_5m: Option<f64>,
    #[serde(rename = "lastTradeUnixTime", default)]
    last_trade_unix: i64,
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    data: PriceData,
}

#[derive(Debug, Deserialize)]
struct PriceData {
    value: f64,
}

/// Weighted blend of momentum across horizons, clamped to `[0, 100]` (spec
/// §4.3 "momentum_score").
fn momentum_score(change_5m: Option<f64>, change_6h: f64, change_24h: f64) -> f64 {
    let short = change_5m.unwrap_or(0.0) * 3.0;
    let mid = change_6h * 1.5;
    let long = change_24h * 0.5;
    (short + mid + long).clamp(-100.0, 100.0).max(0.0)
}

/// Volume-to-liquidity ratio bucketed into a 0-100 legitimacy score (spec
/// §4.3 "legitimacy_score"): thin liquidity relative to churn looks like a
/// wash-trading setup and scores low.
fn legitimacy_score(liquidity_usd: f64, volume_24h: f64) -> f64 {
    if liquidity_usd <= 0.0 {
        return 0.0;
    }
    let ratio = volume_24h / liquidity_usd;
    (100.0 - (ratio - 3.0).max(0.0) * 10.0).clamp(0.0, 100.0)
}

#[async_trait]
impl DexProvider for BirdeyeDexProvider {
    async fn find_momentum_tokens(&self, tier_filters: &TierFilters) -> Result<Vec<DexCandidate>> {
        let url = format!("{}/defi/tokenlist", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .header("x-chain", "solana")
            .query(&[("sort_by", "v24hUSD"), ("sort_type", "desc"), ("limit", "50")])
            .send()
            .await
            .context("birdeye tokenlist request failed")?;
        let parsed: TokenListResponse = resp.json().await.context("failed to parse birdeye tokenlist")?;

        let now_unix = chrono::Utc::now().timestamp();
        let tier = tier_filters.tier;
        let mut candidates = Vec::new();
        for token in parsed.data.tokens {
            if token.liquidity_usd < tier_filters.min_liquidity_usd {
                continue;
            }
            let age_hours = if token.last_trade_unix > 0 {
                (now_unix - token.last_trade_unix).max(0) as f64 / 3600.0
            } else {
                continue;
            };
            if age_hours < tier_filters.min_age_hours || age_hours > tier_filters.max_age_hours {
                continue;
            }

            candidates.push(DexCandidate {
                token_address: token.address.clone(),
                symbol: token.symbol,
                name: token.name,
                url: format!("https://birdeye.so/token/{}?chain=solana", token.address),
                price_usd: token.price,
                price_change_5m: token.price_change_5m,
                price_change_6h: token.price_change_6h,
                price_change_24h: token.price_change_24h,
                volume_24h: token.volume_24h,
                liquidity_usd: token.liquidity_usd,
                age_hours,
                age_days: age_hours / 24.0,
                momentum_score: momentum_score(token.price_change_5m, token.price_change_6h, token.price_change_24h),
                legitimacy_score: legitimacy_score(token.liquidity_usd, token.volume_24h),
                tier,
                dex_id: "raydium".to_string(),
            });
        }
        Ok(candidates)
    }

    async fn sol_usd_price(&self) -> Result<Decimal> {
        let url = format!("{}/defi/price", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .header("x-chain", "solana")
            .query(&[("address", "So11111111111111111111111111111111111111112")])
            .send()
            .await
            .context("birdeye sol price request failed")?;
        let parsed: PriceResponse = resp.json().await.context("failed to parse birdeye sol price")?;
        Decimal::from_f64(parsed.data.value).context("sol price was not a finite decimal")
    }
}

#[derive(Debug, Deserialize)]
struct OhlcvResponse {
    data: OhlcvData,
}

#[derive(Debug, Deserialize)]
struct OhlcvData {
    items: Vec<OhlcvItem>,
}

#[derive(Debug, Deserialize)]
struct OhlcvItem {
    #[serde(rename = "c")]
    close: f64,
    #[serde(rename = "v")]
    volume: f64,
}

/// Simple moving-average crossover + volume trend reader over Birdeye OHLCV
/// candles (spec §4.3 "Chart analyzer"). Entry score blends trend direction
/// with volume confirmation.
pub struct BirdeyeChartAnalyzer {
    api_key: String,
    client: ClientWithMiddleware,
    base_url: String,
}

impl BirdeyeChartAnalyzer {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: HttpClientFactory::create_client(),
            base_url: "https://public-api.birdeye.so".to_string(),
        }
    }
}

#[async_trait]
impl ChartAnalyzer for BirdeyeChartAnalyzer {
    async fn analyze_chart(&self, address: &str, age_hours: f64) -> Result<Option<ChartAnalysis>> {
        let interval = if age_hours < 6.0 { "1m" } else { "15m" };
        let url = format!("{}/defi/ohlcv", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .header("x-chain", "solana")
            .query(&[("address", address), ("type", interval)])
            .send()
            .await
            .context("birdeye ohlcv request failed")?;
        let parsed: OhlcvResponse = resp.json().await.context("failed to parse birdeye ohlcv")?;

        if parsed.data.items.len() < 10 {
            return Ok(None);
        }
        let closes: Vec<f64> = parsed.data.items.iter().map(|i| i.close).collect();
        let volumes: Vec<f64> = parsed.data.items.iter().map(|i| i.volume).collect();

        let n = closes.len();
        let fast_window = 5.min(n);
        let slow_window = 10.min(n);
        let fast_avg = closes[n - fast_window..].iter().sum::<f64>() / fast_window as f64;
        let slow_avg = closes[n - slow_window..].iter().sum::<f64>() / slow_window as f64;
        let trend = (fast_avg - slow_avg) / slow_avg.max(f64::EPSILON);

        let recent_volume = volumes[n - fast_window..].iter().sum::<f64>() / fast_window as f64;
        let older_volume = volumes[n - slow_window..n - fast_window].iter().sum::<f64>().max(1.0)
            / (slow_window - fast_window).max(1) as f64;
        let volume_trend = (recent_volume - older_volume) / older_volume.max(f64::EPSILON);

        let entry_score = (trend * 100.0 + volume_trend * 20.0).clamp(-100.0, 100.0);
        let recommendation = if entry_score > 5.0 {
            ChartSignal::Bullish
        } else if entry_score < -5.0 {
            ChartSignal::Bearish
        } else {
            ChartSignal::Neutral
        };

        Ok(Some(ChartAnalysis {
            entry_score,
            recommendation,
        }))
    }
}
