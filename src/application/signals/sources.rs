//! Heterogeneous signal gatherers (spec §4.2 "Aggregation"). Each source is
//! a trait object whose failure is isolated — logged, empty result — per
//! §4.2 and the §7 transient-I/O taxonomy. Grounded in the teacher's
//! `infrastructure/news/rss.rs` / `infrastructure/sentiment/alternative_me.rs`
//! per-source isolation pattern.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::signal::{Flair, Signal, Source};

/// Raw post/message fetched from an upstream source, before weighting.
#[derive(Debug, Clone)]
pub struct RawItem {
    pub symbol: String,
    pub raw_sentiment: f64,
    pub volume: u64,
    pub timestamp: DateTime<Utc>,
    pub upvotes: Option<u64>,
    pub comments: Option<u64>,
    pub flair: Option<Flair>,
    pub source_detail: String,
}

#[async_trait]
pub trait SignalSource: Send + Sync {
    fn source(&self) -> Source;
    /// Fetch raw items; on any failure, return `Ok(vec![])` and let the
    /// caller log the isolated failure via `Err` — callers always unwrap to
    /// empty on `Err` (spec §4.2 "Each gatherer's failure is isolated").
    async fn fetch(&self) -> anyhow::Result<Vec<RawItem>>;
}

/// Turn one gatherer's raw items into weighted [`Signal`]s, isolating
/// failures to an empty vec + a log line (the caller supplies the logger).
pub async fn gather_one(
    source: &dyn SignalSource,
    now: DateTime<Utc>,
    decay_half_life_minutes: f64,
) -> (Vec<Signal>, Option<String>) {
    match source.fetch().await {
        Ok(items) => {
            let signals = items
                .into_iter()
                .map(|item| {
                    Signal::new(
                        item.symbol,
                        source.source(),
                        item.source_detail,
                        item.raw_sentiment,
                        item.volume,
                        item.timestamp,
                        now,
                        decay_half_life_minutes,
                        item.upvotes,
                        item.comments,
                        item.flair,
                    )
                })
                .collect();
            (signals, None)
        }
        Err(err) => (Vec::new(), Some(format!("{}: {err}", source_name(source.source())))),
    }
}

fn source_name(source: Source) -> &'static str {
    match source {
        Source::StockTwits => "stocktwits",
        Source::FinTwit => "fintwit",
        Source::RedditWsb => "reddit:wsb",
        Source::RedditStocks => "reddit:stocks",
        Source::RedditInvesting => "reddit:investing",
        Source::RedditOptions => "reddit:options",
        Source::Crypto => "crypto",
    }
}

/// Fan out over every configured gatherer concurrently and merge into the
/// signal cache (spec §4.2 "Aggregation", §5 "independent I/O is fired
/// concurrently and joined").
pub async fn gather_all(
    sources: &[Box<dyn SignalSource>],
    now: DateTime<Utc>,
    decay_half_life_minutes: f64,
) -> (Vec<Signal>, Vec<String>) {
    let futures = sources
        .iter()
        .map(|s| gather_one(s.as_ref(), now, decay_half_life_minutes));
    let results = futures::future::join_all(futures).await;

    let mut all_signals = Vec::new();
    let mut errors = Vec::new();
    for (signals, err) in results {
        all_signals.extend(signals);
        if let Some(e) = err {
            errors.push(e);
        }
    }
    (all_signals, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource;

    #[async_trait]
    impl SignalSource for FailingSource {
        fn source(&self) -> Source {
            Source::RedditWsb
        }
        async fn fetch(&self) -> anyhow::Result<Vec<RawItem>> {
            anyhow::bail!("network timeout")
        }
    }

    struct OkSource;

    #[async_trait]
    impl SignalSource for OkSource {
        fn source(&self) -> Source {
            Source::FinTwit
        }
        async fn fetch(&self) -> anyhow::Result<Vec<RawItem>> {
            Ok(vec![RawItem {
                symbol: "AAPL".into(),
                raw_sentiment: 0.5,
                volume: 10,
                timestamp: Utc::now(),
                upvotes: Some(20),
                comments: Some(5),
                flair: None,
                source_detail: "test".into(),
            }])
        }
    }

    #[tokio::test]
    async fn failing_source_is_isolated() {
        let (signals, err) = gather_one(&FailingSource, Utc::now(), 120.0).await;
        assert!(signals.is_empty());
        assert!(err.is_some());
    }

    #[tokio::test]
    async fn gather_all_merges_ok_sources_and_reports_failures() {
        let sources: Vec<Box<dyn SignalSource>> = vec![Box::new(FailingSource), Box::new(OkSource)];
        let (signals, errors) = gather_all(&sources, Utc::now(), 120.0).await;
        assert_eq!(signals.len(), 1);
        assert_eq!(errors.len(), 1);
    }
}
