//! Weighted social/market signals (spec §3 "Signal", §4.2 scoring).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SIGNAL_TTL_HOURS: i64 = 24;
pub const SIGNAL_CACHE_CAP: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum Source {
    StockTwits,
    FinTwit,
    RedditWsb,
    RedditStocks,
    RedditInvesting,
    RedditOptions,
    Crypto,
}

impl Source {
    /// Per-source constant weight (spec §4.2: "FinTwit 0.95 ... WSB 0.6").
    pub fn weight(self) -> f64 {
        match self {
            Source::FinTwit => 0.95,
            Source::StockTwits => 0.85,
            Source::RedditInvesting => 0.8,
            Source::RedditStocks => 0.75,
            Source::RedditOptions => 0.7,
            Source::Crypto => 0.8,
            Source::RedditWsb => 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flair {
    DueDiligence,
    Yolo,
    Meme,
    Gain,
    Loss,
    Discussion,
}

impl Flair {
    /// Table lookup (spec §4.2: "DD=1.5, YOLO/Meme/Gain/Loss <= 0.6").
    pub fn multiplier(self) -> f64 {
        match self {
            Flair::DueDiligence => 1.5,
            Flair::Yolo => 0.5,
            Flair::Meme => 0.4,
            Flair::Gain => 0.6,
            Flair::Loss => 0.6,
            Flair::Discussion => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub source: Source,
    pub source_detail: String,
    pub raw_sentiment: f64,
    pub sentiment: f64,
    pub volume: u64,
    pub freshness: f64,
    pub timestamp: DateTime<Utc>,
    pub upvotes: Option<u64>,
    pub comments: Option<u64>,
    pub flair: Option<Flair>,
    pub subreddits: Option<Vec<String>>,
    pub is_crypto: bool,
    pub momentum: Option<f64>,
    pub price: Option<rust_decimal::Decimal>,
}

impl Signal {
    /// Build a signal, computing the weighted `sentiment` field from its
    /// components (spec §4.2: `raw * source_weight * decay * engagement * flair`).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        source: Source,
        source_detail: impl Into<String>,
        raw_sentiment: f64,
        volume: u64,
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
        decay_half_life_minutes: f64,
        upvotes: Option<u64>,
        comments: Option<u64>,
        flair: Option<Flair>,
    ) -> Self {
        let freshness = time_decay(now, timestamp, decay_half_life_minutes);
        let engagement = engagement_multiplier(upvotes, comments);
        let flair_mult = flair.map(Flair::multiplier).unwrap_or(1.0);
        let raw = raw_sentiment.clamp(-1.0, 1.0);
        let sentiment = raw * source.weight() * freshness * engagement * flair_mult;

        Self {
            symbol: symbol.into(),
            source,
            source_detail: source_detail.into(),
            raw_sentiment: raw,
            sentiment,
            volume,
            freshness,
            timestamp,
            upvotes,
            comments,
            flair,
            subreddits: None,
            is_crypto: matches!(source, Source::Crypto),
            momentum: None,
            price: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.timestamp).num_hours() >= SIGNAL_TTL_HOURS
    }
}

/// Exponential time decay with the configured half-life, clamped to
/// `[0.2, 1.0]` per spec §4.2.
pub fn time_decay(now: DateTime<Utc>, at: DateTime<Utc>, half_life_minutes: f64) -> f64 {
    let age_minutes = now.signed_duration_since(at).num_seconds() as f64 / 60.0;
    if age_minutes <= 0.0 || half_life_minutes <= 0.0 {
        return 1.0;
    }
    let decay = 0.5_f64.powf(age_minutes / half_life_minutes);
    decay.clamp(0.2, 1.0)
}

/// Average of bucketed upvote/comment multipliers (spec §4.2 "engagement mult").
pub fn engagement_multiplier(upvotes: Option<u64>, comments: Option<u64>) -> f64 {
    fn bucket(n: u64) -> f64 {
        match n {
            0..=9 => 0.8,
            10..=49 => 1.0,
            50..=199 => 1.2,
            200..=999 => 1.4,
            _ => 1.6,
        }
    }
    let up = upvotes.map(bucket).unwrap_or(1.0);
    let com = comments.map(bucket).unwrap_or(1.0);
    (up + com) / 2.0
}

/// Merge freshly-gathered signals into the cache: drop entries older than
/// 24h, then keep at most `SIGNAL_CACHE_CAP` with the largest `|sentiment|`
/// (spec §4.2 "Aggregation").
pub fn merge_into_cache(cache: &mut Vec<Signal>, fresh: Vec<Signal>, now: DateTime<Utc>) {
    cache.extend(fresh);
    cache.retain(|s| !s.is_expired(now));
    if cache.len() > SIGNAL_CACHE_CAP {
        cache.sort_by(|a, b| {
            b.sentiment
                .abs()
                .partial_cmp(&a.sentiment.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        cache.truncate(SIGNAL_CACHE_CAP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn time_decay_is_one_at_zero_age() {
        let now = Utc::now();
        assert_eq!(time_decay(now, now, 120.0), 1.0);
    }

    #[test]
    fn time_decay_halves_at_half_life() {
        let now = Utc::now();
        let at = now - Duration::minutes(120);
        let d = time_decay(now, at, 120.0);
        assert!((d - 0.5).abs() < 1e-9);
    }

    #[test]
    fn time_decay_clamps_to_floor() {
        let now = Utc::now();
        let at = now - Duration::hours(48);
        assert_eq!(time_decay(now, at, 120.0), 0.2);
    }

    #[test]
    fn engagement_multiplier_defaults_to_one() {
        assert_eq!(engagement_multiplier(None, None), 1.0);
    }

    #[test]
    fn flair_dd_boosts_above_one() {
        assert_eq!(Flair::DueDiligence.multiplier(), 1.5);
        assert!(Flair::Yolo.multiplier() <= 0.6);
    }

    #[test]
    fn merge_into_cache_drops_expired_and_caps_size() {
        let now = Utc::now();
        let mut cache = Vec::new();
        let stale = Signal::new(
            "OLD",
            Source::RedditWsb,
            "t",
            0.5,
            10,
            now - Duration::hours(25),
            now,
            120.0,
            None,
            None,
            None,
        );
        cache.push(stale);

        let mut fresh = Vec::new();
        for i in 0..(SIGNAL_CACHE_CAP + 10) {
            fresh.push(Signal::new(
                format!("SYM{i}"),
                Source::RedditWsb,
                "t",
                (i as f64 % 10.0) / 10.0,
                10,
                now,
                now,
                120.0,
                None,
                None,
                None,
            ));
        }
        merge_into_cache(&mut cache, fresh, now);
        assert_eq!(cache.len(), SIGNAL_CACHE_CAP);
        assert!(cache.iter().all(|s| s.symbol != "OLD"));
    }
}
