//! Alpaca-style HTTP broker adapter (spec §6 "Broker adapter"), adapted from
//! the teacher's `infrastructure/alpaca/execution.rs`/`market_data.rs` split
//! into a single `BrokerAdapter` implementation matching this crate's port.

use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::ports::BrokerAdapter;
use crate::domain::trading::{
    Account, AssetClass, AssetInfo, MarketClock, OptionContract, OptionRight, OrderRequest,
    OrderSide, Position, Snapshot,
};
use crate::infrastructure::core::http_client_factory::HttpClientFactory;

pub struct AlpacaBroker {
    client: ClientWithMiddleware,
    api_key: String,
    api_secret: String,
    base_url: String,
    data_base_url: String,
}

impl AlpacaBroker {
    pub fn new(api_key: String, api_secret: String, base_url: String) -> Self {
        let data_base_url = base_url.replace("paper-api", "data").replace("api.alpaca", "data.alpaca");
        Self {
            client: HttpClientFactory::create_client(),
            api_key,
            api_secret,
            base_url,
            data_base_url,
        }
    }

    fn auth(&self, builder: reqwest_middleware::RequestBuilder) -> reqwest_middleware::RequestBuilder {
        builder
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.api_secret)
    }
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    cash: String,
    equity: String,
    #[serde(default)]
    daytrade_count: i64,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    symbol: String,
    qty: String,
    market_value: String,
    current_price: String,
    unrealized_pl: String,
    unrealized_plpc: String,
    avg_entry_price: String,
    #[serde(default)]
    asset_class: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawClock {
    is_open: bool,
    timestamp: String,
    next_open: String,
    next_close: String,
}

#[derive(Debug, Deserialize)]
struct RawAsset {
    symbol: String,
    exchange: String,
    tradable: bool,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(rename = "ap")]
    ask_price: f64,
    #[serde(rename = "bp")]
    bid_price: f64,
    #[serde(rename = "t")]
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct RawQuoteResponse {
    quote: Option<RawQuote>,
}

fn parse_decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap_or(Decimal::ZERO)
}

#[async_trait]
impl BrokerAdapter for AlpacaBroker {
    async fn get_account(&self) -> Result<Account> {
        let url = format!("{}/v2/account", self.base_url);
        let resp = self.auth(self.client.get(&url)).send().await.context("account request failed")?;
        let raw: RawAccount = resp.json().await.context("failed to parse account")?;
        Ok(Account {
            cash: parse_decimal(&raw.cash),
            equity: parse_decimal(&raw.equity),
            daytrade_count: raw.daytrade_count.max(0) as u32,
        })
    }

    async fn get_positions(&self) -> Result<Vec<Position>> {
        let url = format!("{}/v2/positions", self.base_url);
        let resp = self.auth(self.client.get(&url)).send().await.context("positions request failed")?;
        let raw: Vec<RawPosition> = resp.json().await.context("failed to parse positions")?;
        Ok(raw
            .into_iter()
            .map(|p| Position {
                symbol: p.symbol,
                qty: parse_decimal(&p.qty),
                market_value: parse_decimal(&p.market_value),
                current_price: parse_decimal(&p.current_price),
                unrealized_pl: parse_decimal(&p.unrealized_pl),
                unrealized_plpc: p.unrealized_plpc.parse().unwrap_or(0.0) * 100.0,
                avg_entry_price: parse_decimal(&p.avg_entry_price),
                asset_class: if p.asset_class.as_deref() == Some("crypto") {
                    AssetClass::Crypto
                } else {
                    AssetClass::UsEquity
                },
            })
            .collect())
    }

    async fn get_clock(&self) -> Result<MarketClock> {
        let url = format!("{}/v2/clock", self.base_url);
        let resp = self.auth(self.client.get(&url)).send().await.context("clock request failed")?;
        let raw: RawClock = resp.json().await.context("failed to parse clock")?;
        let parse = |s: &str| -> DateTime<Utc> {
            DateTime::parse_from_rfc3339(s).map(|d| d.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
        };
        Ok(MarketClock {
            is_open: raw.is_open,
            now: parse(&raw.timestamp),
            next_open: parse(&raw.next_open),
            next_close: parse(&raw.next_close),
        })
    }

    async fn get_asset(&self, symbol: &str) -> Result<AssetInfo> {
        let url = format!("{}/v2/assets/{}", self.base_url, symbol);
        let resp = self.auth(self.client.get(&url)).send().await.context("asset request failed")?;
        let raw: RawAsset = resp.json().await.context("failed to parse asset")?;
        Ok(AssetInfo {
            symbol: raw.symbol,
            exchange: raw.exchange,
            tradable: raw.tradable,
        })
    }

    async fn get_snapshot(&self, symbol: &str) -> Result<Snapshot> {
        let url = format!("{}/v2/stocks/{}/quotes/latest", self.data_base_url, symbol);
        let resp = self.auth(self.client.get(&url)).send().await.context("snapshot request failed")?;
        let raw: RawQuoteResponse = resp.json().await.context("failed to parse snapshot")?;
        let quote = raw.quote.context("no quote in snapshot response")?;
        let mid = (quote.ask_price + quote.bid_price) / 2.0;
        Ok(Snapshot {
            symbol: symbol.to_string(),
            price: Decimal::from_f64_retain(mid).unwrap_or(Decimal::ZERO),
            bid: Decimal::from_f64_retain(quote.bid_price).unwrap_or(Decimal::ZERO),
            ask: Decimal::from_f64_retain(quote.ask_price).unwrap_or(Decimal::ZERO),
            timestamp: DateTime::parse_from_rfc3339(&quote.timestamp)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    async fn get_crypto_snapshot(&self, symbol: &str) -> Result<Snapshot> {
        let url = format!("{}/v1beta3/crypto/us/latest/quotes", self.data_base_url);
        let resp = self
            .auth(self.client.get(&url).query(&[("symbols", symbol)]))
            .send()
            .await
            .context("crypto snapshot request failed")?;
        let raw: RawQuoteResponse = resp.json().await.context("failed to parse crypto snapshot")?;
        let quote = raw.quote.context("no quote in crypto snapshot response")?;
        let mid = (quote.ask_price + quote.bid_price) / 2.0;
        Ok(Snapshot {
            symbol: symbol.to_string(),
            price: Decimal::from_f64_retain(mid).unwrap_or(Decimal::ZERO),
            bid: Decimal::from_f64_retain(quote.bid_price).unwrap_or(Decimal::ZERO),
            ask: Decimal::from_f64_retain(quote.ask_price).unwrap_or(Decimal::ZERO),
            timestamp: DateTime::parse_from_rfc3339(&quote.timestamp)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    async fn create_order(&self, order: OrderRequest) -> Result<()> {
        #[derive(serde::Serialize)]
        struct Body {
            symbol: String,
            side: String,
            #[serde(rename = "type")]
            order_type: &'static str,
            time_in_force: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            notional: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            qty: Option<String>,
        }
        let side = match order.side {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        };
        let tif = match order.time_in_force {
            crate::domain::trading::TimeInForce::Day => "day",
            crate::domain::trading::TimeInForce::Gtc => "gtc",
        };
        let body = Body {
            symbol: order.symbol.clone(),
            side: side.to_string(),
            order_type: "market",
            time_in_force: tif.to_string(),
            notional: order.notional.map(|n| n.to_string()),
            qty: order.qty.map(|q| q.to_string()),
        };
        let url = format!("{}/v2/orders", self.base_url);
        let resp = self
            .auth(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .context("order submission failed")?;
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("order rejected: {text}");
        }
        Ok(())
    }

    async fn close_position(&self, symbol: &str) -> Result<()> {
        let url = format!("{}/v2/positions/{}", self.base_url, symbol);
        let resp = self.auth(self.client.delete(&url)).send().await.context("close position failed")?;
        if !resp.status().is_success() && resp.status().as_u16() != 404 {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("close position rejected: {text}");
        }
        Ok(())
    }

    async fn get_option_expirations(&self, underlying: &str) -> Result<Vec<NaiveDate>> {
        #[derive(Debug, Deserialize)]
        struct RawContract {
            expiration_date: String,
        }
        #[derive(Debug, Deserialize)]
        struct RawResponse {
            option_contracts: Vec<RawContract>,
        }
        let url = format!("{}/v2/options/contracts", self.base_url);
        let resp = self
            .auth(self.client.get(&url).query(&[("underlying_symbols", underlying)]))
            .send()
            .await
            .context("option expirations request failed")?;
        let raw: RawResponse = resp.json().await.context("failed to parse option expirations")?;
        let mut dates: Vec<NaiveDate> = raw
            .option_contracts
            .into_iter()
            .filter_map(|c| NaiveDate::parse_from_str(&c.expiration_date, "%Y-%m-%d").ok())
            .collect();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }

    async fn get_option_chain(&self, underlying: &str, expiration: NaiveDate) -> Result<Vec<OptionContract>> {
        #[derive(Debug, Deserialize)]
        struct RawContract {
            symbol: String,
            strike_price: String,
            #[serde(rename = "type")]
            right: String,
        }
        #[derive(Debug, Deserialize)]
        struct RawResponse {
            option_contracts: Vec<RawContract>,
        }
        let exp_str = expiration.format("%Y-%m-%d").to_string();
        let url = format!("{}/v2/options/contracts", self.base_url);
        let resp = self
            .auth(
                self.client
                    .get(&url)
                    .query(&[("underlying_symbols", underlying), ("expiration_date", &exp_str)]),
            )
            .send()
            .await
            .context("option chain request failed")?;
        let raw: RawResponse = resp.json().await.context("failed to parse option chain")?;

        let mut contracts = Vec::new();
        for c in raw.option_contracts {
            let right = match c.right.as_str() {
                "call" => OptionRight::Call,
                "put" => OptionRight::Put,
                _ => continue,
            };
            let quote_url = format!("{}/v1beta1/options/quotes/latest", self.data_base_url);
            let quote_resp = self
                .auth(self.client.get(&quote_url).query(&[("symbols", c.symbol.as_str())]))
                .send()
                .await;
            let (bid, ask, delta) = match quote_resp {
                Ok(r) => {
                    #[derive(Debug, Deserialize)]
                    struct Q {
                        #[serde(rename = "bp")]
                        bid_price: Option<f64>,
                        #[serde(rename = "ap")]
                        ask_price: Option<f64>,
                    }
                    #[derive(Debug, Deserialize)]
                    struct QR {
                        quotes: std::collections::HashMap<String, Q>,
                    }
                    match r.json::<QR>().await {
                        Ok(qr) => {
                            let q = qr.quotes.get(&c.symbol);
                            (
                                q.and_then(|q| q.bid_price).unwrap_or(0.0),
                                q.and_then(|q| q.ask_price).unwrap_or(0.0),
                                None,
                            )
                        }
                        Err(_) => (0.0, 0.0, None),
                    }
                }
                Err(_) => (0.0, 0.0, None),
            };
            contracts.push(OptionContract {
                symbol: c.symbol,
                underlying: underlying.to_string(),
                expiration,
                strike: parse_decimal(&c.strike_price),
                right,
                delta,
                bid: Decimal::from_f64_retain(bid).unwrap_or(Decimal::ZERO),
                ask: Decimal::from_f64_retain(ask).unwrap_or(Decimal::ZERO),
            });
        }
        Ok(contracts)
    }
}
