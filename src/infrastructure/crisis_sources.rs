//! Macro indicator fetchers (spec §4.6, §6 "Crisis indicator sources"):
//! Yahoo Finance chart endpoints for market prices, FRED series for credit
//! and balance-sheet data. Every [`CrisisIndicatorSource::fetch`] degrades
//! to `None` on any failure (spec §6 "all failures -> null"). No macro/FRED
//! fetcher exists in the teacher's tree; built directly from spec §4.6,
//! reusing the teacher's `HttpClientFactory` retry/pool transport.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;

use crate::domain::ports::CrisisIndicatorSource;
use crate::infrastructure::core::http_client_factory::HttpClientFactory;

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooChartResult>>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    close: Vec<Option<f64>>,
}

async fn fetch_closes(client: &ClientWithMiddleware, symbol: &str, range: &str) -> Option<Vec<f64>> {
    let url = format!(
        "https://query1.finance.yahoo.com/v8/finance/chart/{symbol}?range={range}&interval=1d"
    );
    let resp = client.get(&url).send().await.ok()?;
    let parsed: YahooChartResponse = resp.json().await.ok()?;
    let result = parsed.chart.result?.into_iter().next()?;
    let closes: Vec<f64> = result
        .indicators
        .quote
        .into_iter()
        .next()?
        .close
        .into_iter()
        .flatten()
        .collect();
    if closes.is_empty() {
        None
    } else {
        Some(closes)
    }
}

/// Latest daily close for a single Yahoo Finance symbol (e.g. `^VIX`,
/// `DX-Y.NYB`, `JPY=X`, `USDT-USD`).
pub struct YahooLatestClose {
    symbol: &'static str,
    name: &'static str,
    client: ClientWithMiddleware,
}

impl YahooLatestClose {
    pub fn new(symbol: &'static str, name: &'static str) -> Self {
        Self {
            symbol,
            name,
            client: HttpClientFactory::create_client(),
        }
    }
}

#[async_trait]
impl CrisisIndicatorSource for YahooLatestClose {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self) -> Option<f64> {
        let closes = fetch_closes(&self.client, self.symbol, "1d").await?;
        closes.last().copied()
    }
}

/// Percent change between the oldest and newest close in an 8-day window
/// (spec §4.6 "weekly" indicators: BTC, KRE, silver).
pub struct YahooWeeklyPctChange {
    symbol: &'static str,
    name: &'static str,
    client: ClientWithMiddleware,
}

impl YahooWeeklyPctChange {
    pub fn new(symbol: &'static str, name: &'static str) -> Self {
        Self {
            symbol,
            name,
            client: HttpClientFactory::create_client(),
        }
    }
}

#[async_trait]
impl CrisisIndicatorSource for YahooWeeklyPctChange {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self) -> Option<f64> {
        let closes = fetch_closes(&self.client, self.symbol, "8d").await?;
        let first = *closes.first()?;
        let last = *closes.last()?;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }
}

/// Gold/silver ratio, derived from two independent Yahoo latest-close
/// fetches (spec §4.6 "gold_silver_ratio").
pub struct GoldSilverRatio {
    gold: YahooLatestClose,
    silver: YahooLatestClose,
}

impl GoldSilverRatio {
    pub fn new() -> Self {
        Self {
            gold: YahooLatestClose::new("GC=F", "gold_price"),
            silver: YahooLatestClose::new("SI=F", "silver_price"),
        }
    }
}

impl Default for GoldSilverRatio {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrisisIndicatorSource for GoldSilverRatio {
    fn name(&self) -> &'static str {
        "gold_silver_ratio"
    }

    async fn fetch(&self) -> Option<f64> {
        let gold = self.gold.fetch().await?;
        let silver = self.silver.fetch().await?;
        if silver == 0.0 {
            return None;
        }
        Some(gold / silver)
    }
}

/// Synthetic high-yield spread proxy, built from the trailing-week relative
/// performance of HYG (junk bond ETF) against TLT (long treasury ETF): no
/// free real-time OAS feed exists, so credit stress is approximated from how
/// much harder junk bonds sell off than treasuries over the week. Re-based
/// onto a plausible basis-point range and floored at 200bp — a stand-in, not
/// a real spread calculation, and its reliability is uncertain (spec §9).
pub struct HySpreadProxy {
    hyg: YahooWeeklyPctChange,
    tlt: YahooWeeklyPctChange,
}

impl HySpreadProxy {
    pub fn new() -> Self {
        Self {
            hyg: YahooWeeklyPctChange::new("HYG", "hyg_weekly"),
            tlt: YahooWeeklyPctChange::new("TLT", "tlt_weekly"),
        }
    }
}

impl Default for HySpreadProxy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrisisIndicatorSource for HySpreadProxy {
    fn name(&self) -> &'static str {
        "hy_spread"
    }

    async fn fetch(&self) -> Option<f64> {
        let hyg = self.hyg.fetch().await?;
        let tlt = self.tlt.fetch().await?;
        let proxy = tlt - hyg;
        Some((300.0 + proxy * 20.0).max(200.0))
    }
}

#[derive(Debug, Deserialize)]
struct FredResponse {
    observations: Vec<FredObservation>,
}

#[derive(Debug, Deserialize)]
struct FredObservation {
    value: String,
}

async fn fetch_fred_values(client: &ClientWithMiddleware, api_key: &str, series_id: &str, limit: u32) -> Option<Vec<f64>> {
    let url = format!(
        "https://api.stlouisfed.org/fred/series/observations?series_id={series_id}&api_key={api_key}&file_type=json&sort_order=desc&limit={limit}"
    );
    let resp = client.get(&url).send().await.ok()?;
    let parsed: FredResponse = resp.json().await.ok()?;
    let values: Vec<f64> = parsed
        .observations
        .into_iter()
        .filter_map(|o| o.value.trim().parse::<f64>().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Latest value of a FRED series (spec §4.6: HY spread, yield curve, TED
/// spread). Observations marked `.` (no data that day) are skipped.
pub struct FredLatestValue {
    series_id: &'static str,
    name: &'static str,
    api_key: String,
    client: ClientWithMiddleware,
}

impl FredLatestValue {
    pub fn new(series_id: &'static str, name: &'static str, api_key: String) -> Self {
        Self {
            series_id,
            name,
            api_key,
            client: HttpClientFactory::create_client(),
        }
    }
}

#[async_trait]
impl CrisisIndicatorSource for FredLatestValue {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self) -> Option<f64> {
        let values = fetch_fred_values(&self.client, &self.api_key, self.series_id, 1).await?;
        values.first().copied()
    }
}

/// Percent change across a FRED series' last few observations (spec §4.6
/// "fed_change_pct" off the weekly `WALCL` balance-sheet series).
pub struct FredWeeklyPctChange {
    series_id: &'static str,
    name: &'static str,
    api_key: String,
    client: ClientWithMiddleware,
}

impl FredWeeklyPctChange {
    pub fn new(series_id: &'static str, name: &'static str, api_key: String) -> Self {
        Self {
            series_id,
            name,
            api_key,
            client: HttpClientFactory::create_client(),
        }
    }
}

#[async_trait]
impl CrisisIndicatorSource for FredWeeklyPctChange {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self) -> Option<f64> {
        let values = fetch_fred_values(&self.client, &self.api_key, self.series_id, 2).await?;
        if values.len() < 2 {
            return None;
        }
        let latest = values[0];
        let previous = values[1];
        if previous == 0.0 {
            return None;
        }
        Some((latest - previous) / previous * 100.0)
    }
}

/// Build the full default set of crisis indicator sources (spec §4.6
/// table), given a FRED API key and the configured FRED series IDs
/// (`fred_series_ted`/`fred_series_yield_curve`/`fred_series_fed_balance`,
/// spec §9 "FRED series IDs should be configurable, not hardcoded"). Each
/// `String` series ID is leaked once at startup to borrow as `&'static str`
/// for the life of the process, matching the fixed-symbol sources below.
pub fn default_sources(
    fred_api_key: String,
    fred_series_ted: String,
    fred_series_yield_curve: String,
    fred_series_fed_balance: String,
) -> Vec<Box<dyn CrisisIndicatorSource>> {
    let ted_series: &'static str = Box::leak(fred_series_ted.into_boxed_str());
    let yc_series: &'static str = Box::leak(fred_series_yield_curve.into_boxed_str());
    let fed_series: &'static str = Box::leak(fred_series_fed_balance.into_boxed_str());

    vec![
        Box::new(YahooLatestClose::new("^VIX", "vix")),
        Box::new(YahooLatestClose::new("DX-Y.NYB", "dxy")),
        Box::new(YahooLatestClose::new("JPY=X", "usdjpy")),
        Box::new(YahooLatestClose::new("USDT-USD", "usdt_peg")),
        Box::new(YahooWeeklyPctChange::new("BTC-USD", "btc_weekly_pct")),
        Box::new(YahooWeeklyPctChange::new("KRE", "kre_weekly_pct")),
        Box::new(YahooWeeklyPctChange::new("SI=F", "silver_weekly_pct")),
        Box::new(GoldSilverRatio::new()),
        Box::new(HySpreadProxy::new()),
        Box::new(FredLatestValue::new(yc_series, "yield_curve_2y10y", fred_api_key.clone())),
        Box::new(FredLatestValue::new(ted_series, "ted_spread", fred_api_key.clone())),
        Box::new(FredWeeklyPctChange::new(fed_series, "fed_change_pct", fred_api_key)),
    ]
}
