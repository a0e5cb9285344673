//! Concrete [`SignalSource`] gatherers: Reddit subreddit listings, the
//! public StockTwits symbol stream, and a crypto RSS feed. Each is
//! grounded in the teacher's `infrastructure/news/rss.rs` fetch-and-parse
//! shape, adapted to the pull-based trait used here (one fetch per tick,
//! not a background poller) since `gather_all` already runs every tick.

use std::collections::HashSet;
use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use rss::Channel;
use serde::Deserialize;
use tokio::sync::Mutex;
use vader_sentiment::SentimentIntensityAnalyzer;

use crate::application::signals::sources::{RawItem, SignalSource};
use crate::application::signals::ticker::extract_candidates;
use crate::domain::signal::{Flair, Source};
use crate::infrastructure::core::http_client_factory::HttpClientFactory;

fn vader_score(analyzer: &mut SentimentIntensityAnalyzer, text: &str) -> f64 {
    *analyzer
        .polarity_scores(text)
        .get("compound")
        .unwrap_or(&0.0)
}

/// A single subreddit's `.json` listing, turned into one [`RawItem`] per
/// extracted ticker per post (spec §4.2 "Reddit gatherers").
pub struct RedditSource {
    subreddit: &'static str,
    source: Source,
    client: ClientWithMiddleware,
    seen: Arc<Mutex<HashSet<String>>>,
}

impl RedditSource {
    pub fn new(subreddit: &'static str, source: Source) -> Self {
        Self {
            subreddit,
            source,
            client: HttpClientFactory::create_client(),
            seen: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn wsb() -> Self {
        Self::new("wallstreetbets", Source::RedditWsb)
    }

    pub fn stocks() -> Self {
        Self::new("stocks", Source::RedditStocks)
    }

    pub fn investing() -> Self {
        Self::new("investing", Source::RedditInvesting)
    }

    pub fn options() -> Self {
        Self::new("options", Source::RedditOptions)
    }
}

#[derive(Debug, Deserialize)]
struct RedditListing {
    data: RedditListingData,
}

#[derive(Debug, Deserialize)]
struct RedditListingData {
    children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
struct RedditChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    ups: i64,
    num_comments: u64,
    created_utc: f64,
    #[serde(default)]
    link_flair_text: Option<String>,
}

fn map_flair(raw: Option<&str>) -> Option<Flair> {
    let raw = raw?.to_ascii_lowercase();
    if raw.contains("dd") || raw.contains("discussion") {
        Some(Flair::DueDiligence)
    } else if raw.contains("yolo") {
        Some(Flair::Yolo)
    } else if raw.contains("meme") || raw.contains("shitpost") {
        Some(Flair::Meme)
    } else if raw.contains("gain") {
        Some(Flair::Gain)
    } else if raw.contains("loss") {
        Some(Flair::Loss)
    } else {
        None
    }
}

#[async_trait]
impl SignalSource for RedditSource {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch(&self) -> Result<Vec<RawItem>> {
        let url = format!("https://www.reddit.com/r/{}/new.json?limit=50", self.subreddit);
        let resp = self
            .client
            .get(&url)
            .header("User-Agent", "sentinel-agent/0.1")
            .send()
            .await
            .context("reddit listing request failed")?;
        let listing: RedditListing = resp.json().await.context("failed to parse reddit listing")?;

        let mut seen = self.seen.lock().await;
        let mut analyzer = SentimentIntensityAnalyzer::new();
        let mut items = Vec::new();
        for child in listing.data.children {
            let post = child.data;
            if seen.contains(&post.id) {
                continue;
            }
            seen.insert(post.id.clone());

            let text = format!("{} {}", post.title, post.selftext);
            for symbol in extract_candidates(&text, &[]) {
                let raw_sentiment = vader_score(&mut analyzer, &text);
                let timestamp = DateTime::from_timestamp(post.created_utc as i64, 0).unwrap_or_else(Utc::now);
                items.push(RawItem {
                    symbol,
                    raw_sentiment,
                    volume: 1,
                    timestamp,
                    upvotes: Some(post.ups.max(0) as u64),
                    comments: Some(post.num_comments),
                    flair: map_flair(post.link_flair_text.as_deref()),
                    source_detail: format!("r/{}:{}", self.subreddit, post.id),
                });
            }
        }
        if seen.len() > 2000 {
            seen.clear();
        }
        Ok(items)
    }
}

/// StockTwits symbol stream (spec §4.2 "FinTwit/StockTwits gatherer"):
/// public `streams/symbol/{ticker}.json` endpoint polled per watched
/// symbol set. Since StockTwits is organized by symbol rather than a firehose,
/// this source is seeded with a fixed watchlist of heavily-discussed tickers.
pub struct StockTwitsSource {
    watchlist: Vec<&'static str>,
    client: ClientWithMiddleware,
    seen: Arc<Mutex<HashSet<u64>>>,
}

impl StockTwitsSource {
    pub fn new(watchlist: Vec<&'static str>) -> Self {
        Self {
            watchlist,
            client: HttpClientFactory::create_client(),
            seen: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StSentiment {
    basic: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StEntities {
    sentiment: Option<StSentiment>,
}

#[derive(Debug, Deserialize)]
struct StMessage {
    id: u64,
    body: String,
    created_at: String,
    #[serde(default)]
    entities: Option<StEntities>,
    #[serde(default)]
    likes: Option<StLikes>,
}

#[derive(Debug, Deserialize)]
struct StLikes {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct StResponse {
    messages: Vec<StMessage>,
}

fn sentiment_from_label(label: Option<&str>, fallback: f64) -> f64 {
    match label {
        Some("Bullish") => fallback.max(0.3),
        Some("Bearish") => fallback.min(-0.3),
        _ => fallback,
    }
}

#[async_trait]
impl SignalSource for StockTwitsSource {
    fn source(&self) -> Source {
        Source::StockTwits
    }

    async fn fetch(&self) -> Result<Vec<RawItem>> {
        let mut analyzer = SentimentIntensityAnalyzer::new();
        let mut items = Vec::new();
        let mut seen = self.seen.lock().await;

        for symbol in &self.watchlist {
            let url = format!("https://api.stocktwits.com/api/2/streams/symbol/{symbol}.json");
            let resp = match self.client.get(&url).send().await {
                Ok(r) => r,
                Err(_) => continue,
            };
            let parsed: StResponse = match resp.json().await {
                Ok(p) => p,
                Err(_) => continue,
            };

            for msg in parsed.messages {
                if seen.contains(&msg.id) {
                    continue;
                }
                seen.insert(msg.id);

                let vader = vader_score(&mut analyzer, &msg.body);
                let label = msg.entities.and_then(|e| e.sentiment).and_then(|s| s.basic);
                let raw_sentiment = sentiment_from_label(label.as_deref(), vader);
                let timestamp = DateTime::parse_from_rfc3339(&msg.created_at)
                    .map(|d| d.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());

                items.push(RawItem {
                    symbol: symbol.to_string(),
                    raw_sentiment,
                    volume: 1,
                    timestamp,
                    upvotes: msg.likes.map(|l| l.total),
                    comments: None,
                    flair: None,
                    source_detail: format!("stocktwits:{}", msg.id),
                });
            }
        }
        if seen.len() > 5000 {
            seen.clear();
        }
        Ok(items)
    }
}

/// Crypto-focused RSS feed (e.g. CoinDesk/CoinTelegraph), mapped to
/// [`Source::Crypto`] (spec §4.2 "Crypto gatherer").
pub struct CryptoRssSource {
    url: String,
    client: ClientWithMiddleware,
    seen_guids: Arc<Mutex<HashSet<String>>>,
}

impl CryptoRssSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: HttpClientFactory::create_client(),
            seen_guids: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

#[async_trait]
impl SignalSource for CryptoRssSource {
    fn source(&self) -> Source {
        Source::Crypto
    }

    async fn fetch(&self) -> Result<Vec<RawItem>> {
        let resp = self.client.get(&self.url).send().await.context("rss fetch failed")?;
        let bytes = resp.bytes().await.context("rss body read failed")?;
        let channel = Channel::read_from(Cursor::new(bytes)).context("rss parse failed")?;

        let mut guids = self.seen_guids.lock().await;
        let mut analyzer = SentimentIntensityAnalyzer::new();
        let mut items = Vec::new();
        for item in channel.items() {
            let guid = item
                .guid()
                .map(|g| g.value.to_string())
                .or_else(|| item.link().map(|l| l.to_string()))
                .unwrap_or_else(|| item.title().unwrap_or_default().to_string());
            if guid.is_empty() || guids.contains(&guid) {
                continue;
            }
            guids.insert(guid.clone());

            let title = item.title().unwrap_or_default();
            let description = item.description().unwrap_or_default();
            let text = format!("{title} {description}");
            for symbol in extract_candidates(&text, &[]) {
                let timestamp = item
                    .pub_date()
                    .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                    .map(|d| d.with_timezone(&Utc))
                    .unwrap_or_else(Utc::now);
                items.push(RawItem {
                    symbol,
                    raw_sentiment: vader_score(&mut analyzer, &text),
                    volume: 1,
                    timestamp,
                    upvotes: None,
                    comments: None,
                    flair: None,
                    source_detail: guid.clone(),
                });
            }
        }
        if guids.len() > 2000 {
            guids.clear();
        }
        Ok(items)
    }
}
