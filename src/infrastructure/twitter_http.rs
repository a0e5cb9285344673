//! [`TwitterClient`] implementations: the X/Twitter recent-search API and a
//! no-op fallback used when no bearer token is configured (spec §4.4
//! "Twitter confirmation", §5 "Twitter daily-read counter"). Grounded in the
//! same fetch-and-score shape as `infrastructure/signal_sources.rs`'s
//! `StockTwitsSource`, scored with the same `vader_sentiment` analyzer
//! rather than a second sentiment engine.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use vader_sentiment::SentimentIntensityAnalyzer;

use crate::domain::ports::TwitterClient;
use crate::domain::state::TwitterConfirmation;
use crate::infrastructure::core::http_client_factory::HttpClientFactory;

pub struct TwitterHttpClient {
    bearer_token: String,
    client: ClientWithMiddleware,
}

impl TwitterHttpClient {
    pub fn new(bearer_token: String) -> Self {
        Self {
            bearer_token,
            client: HttpClientFactory::create_client(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    text: String,
}

#[async_trait]
impl TwitterClient for TwitterHttpClient {
    async fn check_symbol(&self, symbol: &str) -> Result<TwitterConfirmation> {
        let query = format!("${symbol} -is:retweet lang:en");
        let resp = self
            .client
            .get("https://api.twitter.com/2/tweets/search/recent")
            .bearer_auth(&self.bearer_token)
            .query(&[("query", query.as_str()), ("max_results", "25"), ("tweet.fields", "text")])
            .send()
            .await
            .context("twitter recent-search request failed")?;
        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("twitter search rejected with {status}");
        }
        let parsed: SearchResponse = resp.json().await.context("failed to parse twitter search response")?;
        if parsed.data.is_empty() {
            return Ok(TwitterConfirmation::NoSignal);
        }

        let mut analyzer = SentimentIntensityAnalyzer::new();
        let mean: f64 = parsed
            .data
            .iter()
            .map(|t| *analyzer.polarity_scores(&t.text).get("compound").unwrap_or(&0.0))
            .sum::<f64>()
            / parsed.data.len() as f64;

        Ok(if mean >= 0.2 {
            TwitterConfirmation::Confirmed
        } else if mean <= -0.2 {
            TwitterConfirmation::Contradicted
        } else {
            TwitterConfirmation::NoSignal
        })
    }
}

/// Used when no bearer token is configured; every symbol reports
/// [`TwitterConfirmation::NoSignal`] rather than the tick failing on an
/// absent collaborator.
pub struct NullTwitterClient;

#[async_trait]
impl TwitterClient for NullTwitterClient {
    async fn check_symbol(&self, _symbol: &str) -> Result<TwitterConfirmation> {
        Ok(TwitterConfirmation::NoSignal)
    }
}
