//! Ticker extraction and validation (spec §4.2 "Ticker extraction").
//!
//! Grounded in the teacher's `infrastructure/news/sentiment_analyzer.rs`
//! style of a small regex-driven scanner plus a static keyword table.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::domain::ports::BrokerAdapter;

/// Words that look like tickers (2-5 uppercase letters) but are common
/// English words or trading slang, and must never be treated as symbols.
const BLACKLIST: &[&str] = &[
    "A", "I", "THE", "AND", "FOR", "ARE", "BUT", "NOT", "YOU", "ALL", "CAN", "HAS", "HAD", "WAS",
    "OUT", "NOW", "NEW", "WHO", "GET", "GOT", "ITS", "OUR", "YOUR", "THIS", "THAT", "WITH",
    "FROM", "THEY", "BEEN", "HAVE", "WILL", "WHAT", "WHEN", "CEO", "CFO", "IPO", "ATH", "DD",
    "YOLO", "FOMO", "HODL", "LOL", "IMO", "TLDR", "EOD", "ATM", "USD", "SEC", "FED", "GDP", "CPI",
    "API", "LLC", "INC", "ETF", "USA", "USAF", "FAQ", "URL", "ASAP",
];

fn blacklist_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| BLACKLIST.iter().copied().collect())
}

const TRADING_KEYWORDS: &[&str] = &[
    "calls", "puts", "shares", "stock", "position", "long", "short", "buy", "sell", "bought",
    "sold", "holding", "moon", "squeeze", "yolo",
];

/// Extract candidate tickers from free text: `$SYM` always qualifies; a bare
/// `SYM` qualifies only when followed (within a few words) by a trading
/// keyword, per spec §4.2.
pub fn extract_candidates(text: &str, user_blacklist: &[String]) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut found = Vec::new();
    let user_bl: HashSet<&str> = user_blacklist.iter().map(|s| s.as_str()).collect();

    for (i, raw) in words.iter().enumerate() {
        let trimmed = raw.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '$');
        let (is_dollar, candidate) = if let Some(rest) = trimmed.strip_prefix('$') {
            (true, rest)
        } else {
            (false, trimmed)
        };

        if candidate.len() < 2 || candidate.len() > 5 {
            continue;
        }
        if !candidate.chars().all(|c| c.is_ascii_uppercase()) {
            continue;
        }
        let upper = candidate.to_string();
        if blacklist_set().contains(upper.as_str()) || user_bl.contains(upper.as_str()) {
            continue;
        }

        if is_dollar {
            found.push(upper);
            continue;
        }

        // Bare symbol: require a trading keyword within the next few words.
        let window_end = (i + 6).min(words.len());
        let has_keyword = words[i..window_end]
            .iter()
            .any(|w| TRADING_KEYWORDS.iter().any(|k| w.to_lowercase().contains(k)));
        if has_keyword {
            found.push(upper);
        }
    }

    found.sort();
    found.dedup();
    found
}

/// Validate a candidate ticker against a broker asset lookup, with an SEC
/// cache checked first (spec §4.2 "Validation path"). Caching (24h TTL /
/// per-process) is the caller's responsibility via [`TickerCache`].
pub async fn validate_ticker(broker: &dyn BrokerAdapter, symbol: &str) -> Result<bool> {
    match broker.get_asset(symbol).await {
        Ok(asset) => Ok(asset.tradable),
        Err(_) => Ok(false),
    }
}

const CACHE_TTL_HOURS: i64 = 24;

/// Process-wide ticker validation cache (spec §4.2 "Validation path", §7
/// "Per-process ticker validation cache"): read-mostly, 24h TTL, lives for
/// the process lifetime. Not part of persisted state.
#[derive(Default)]
pub struct TickerCache {
    entries: HashMap<String, (bool, DateTime<Utc>)>,
}

impl TickerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `symbol` is a tradable equity ticker, consulting the cache
    /// before falling back to a broker asset lookup. Failed lookups are
    /// treated as not-tradable and cached like any other result, so a
    /// persistently-unknown symbol doesn't hit the broker every tick.
    pub async fn is_tradable(&mut self, broker: &dyn BrokerAdapter, symbol: &str, now: DateTime<Utc>) -> bool {
        if let Some((tradable, checked_at)) = self.entries.get(symbol) {
            if now.signed_duration_since(*checked_at).num_hours() < CACHE_TTL_HOURS {
                return *tradable;
            }
        }
        let tradable = validate_ticker(broker, symbol).await.unwrap_or(false);
        self.entries.insert(symbol.to_string(), (tradable, now));
        tradable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollar_prefixed_ticker_always_qualifies() {
        let found = extract_candidates("yo check out $GME right now", &[]);
        assert!(found.contains(&"GME".to_string()));
    }

    #[test]
    fn bare_ticker_requires_trading_keyword() {
        let found = extract_candidates("I think GME is cool but nothing else", &[]);
        assert!(!found.contains(&"GME".to_string()));

        let found2 = extract_candidates("just bought GME calls today", &[]);
        assert!(found2.contains(&"GME".to_string()));
    }

    #[test]
    fn blacklisted_words_are_never_tickers() {
        let found = extract_candidates("$THE and $ATH bought calls", &[]);
        assert!(found.is_empty());
    }

    #[test]
    fn user_blacklist_overrides_dollar_prefix() {
        let found = extract_candidates("$FAKE bought calls", &["FAKE".to_string()]);
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn ticker_cache_remembers_untradable_without_rechecking() {
        use crate::infrastructure::mock::MockBroker;
        use rust_decimal_macros::dec;

        let broker = MockBroker::new(dec!(10_000));
        broker.set_tradable("FAKE", false).await;
        let mut cache = TickerCache::new();
        let now = Utc::now();

        assert!(!cache.is_tradable(&broker, "FAKE", now).await);
        // Flip the broker's answer; the cache should still serve the stale
        // cached value within the TTL.
        broker.set_tradable("FAKE", true).await;
        assert!(!cache.is_tradable(&broker, "FAKE", now).await);
    }

    #[tokio::test]
    async fn ticker_cache_rechecks_after_ttl_expiry() {
        use crate::infrastructure::mock::MockBroker;
        use rust_decimal_macros::dec;

        let broker = MockBroker::new(dec!(10_000));
        broker.set_tradable("FAKE", false).await;
        let mut cache = TickerCache::new();
        let now = Utc::now();
        assert!(!cache.is_tradable(&broker, "FAKE", now).await);

        broker.set_tradable("FAKE", true).await;
        let later = now + chrono::Duration::hours(25);
        assert!(cache.is_tradable(&broker, "FAKE", later).await);
    }
}
