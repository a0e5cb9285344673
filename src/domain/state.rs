//! The root `AgentState` (spec §3) — the single mutable object owned by the
//! actor (spec §4.1, §9 "single-actor discipline"). All mutation happens
//! inside a tick; external callers only observe through the admin surface.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::domain::crisis::CrisisState;
use crate::domain::dex::{CooldownEntry, DexCandidate, DexPosition, DexTradeRecord, StopLossEvent};
use crate::domain::position::PositionEntry;
use crate::domain::signal::Signal;
use crate::domain::trading::OptionPosition;

pub const LOG_CAP: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
}

/// Bounded ring buffer of the last [`LOG_CAP`] log lines, the "primary
/// feedback surface" per spec §7.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogRing(VecDeque<LogEntry>);

impl LogRing {
    pub fn push(&mut self, level: impl Into<String>, message: impl Into<String>) {
        if self.0.len() >= LOG_CAP {
            self.0.pop_front();
        }
        self.0.push_back(LogEntry {
            timestamp: Utc::now(),
            level: level.into(),
            message: message.into(),
        });
    }

    pub fn tail(&self, limit: usize) -> Vec<LogEntry> {
        self.0.iter().rev().take(limit).rev().cloned().collect()
    }
}

/// Per-model token usage and dollar cost, keyed by model name (spec §6 cost
/// table: gpt-4o $2.5/$10 per 1M, gpt-4o-mini $0.15/$0.6 per 1M).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostTracker {
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_cost_usd: Decimal,
    pub calls: u64,
}

impl CostTracker {
    pub fn record(&mut self, prompt_tokens: u64, completion_tokens: u64, cost_usd: Decimal) {
        self.total_prompt_tokens += prompt_tokens;
        self.total_completion_tokens += completion_tokens;
        self.total_cost_usd += cost_usd;
        self.calls += 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialHistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub volume: u64,
    pub sentiment: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Verdict {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResult {
    pub verdict: Verdict,
    pub confidence: f64,
    pub reasoning: String,
    pub entry_quality: Option<String>,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TwitterConfirmation {
    Confirmed,
    Contradicted,
    NoSignal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StalenessAnalysis {
    pub score: f64,
    pub stale: bool,
    pub computed_at: DateTime<Utc>,
}

fn default_opens_at() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremarketPlan {
    pub created_at: DateTime<Utc>,
    /// The broker clock's `next_open` observed while building the plan, used
    /// to detect the 09:30-09:32 execution window without hardcoding a local
    /// timezone (spec §4.1 step 6/9; see DESIGN.md "premarket window").
    #[serde(default = "default_opens_at")]
    pub opens_at: DateTime<Utc>,
    pub candidates: Vec<String>,
    pub reasoning: String,
}

/// The root state object. One instance, owned by the actor (`Agent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub config: Config,
    pub enabled: bool,

    pub signal_cache: Vec<Signal>,
    pub position_entries: HashMap<String, PositionEntry>,
    #[serde(default)]
    pub option_positions: HashMap<String, OptionPosition>,
    pub social_history: HashMap<String, Vec<SocialHistoryPoint>>,

    pub signal_research: HashMap<String, ResearchResult>,
    pub position_research: HashMap<String, ResearchResult>,
    pub staleness_analysis: HashMap<String, StalenessAnalysis>,

    pub twitter_confirmations: HashMap<String, TwitterConfirmation>,
    pub twitter_daily_reads: u32,
    pub twitter_daily_reset: DateTime<Utc>,
    pub premarket_plan: Option<PremarketPlan>,

    pub dex_signals: Vec<DexCandidate>,
    pub dex_positions: HashMap<String, DexPosition>,
    pub dex_trade_history: Vec<DexTradeRecord>,
    pub dex_realized_pnl_sol: Decimal,
    pub dex_paper_balance_sol: Decimal,
    pub dex_portfolio_history: Vec<(DateTime<Utc>, Decimal)>,

    pub dex_max_consecutive_losses: u32,
    pub dex_current_loss_streak: u32,
    pub dex_max_drawdown_pct: f64,
    pub dex_max_drawdown_duration_ms: i64,
    pub dex_drawdown_start_time: Option<DateTime<Utc>>,
    pub dex_peak_balance: Decimal,
    pub dex_peak_value: Decimal,
    pub dex_drawdown_paused: bool,

    pub dex_recent_stop_losses: Vec<StopLossEvent>,
    pub dex_circuit_breaker_until: Option<DateTime<Utc>>,

    pub dex_stop_loss_cooldowns: HashMap<String, CooldownEntry>,

    pub crisis_state: CrisisState,

    pub last_data_gather: Option<DateTime<Utc>>,
    pub last_analyst: Option<DateTime<Utc>>,
    pub last_research: Option<DateTime<Utc>>,
    pub last_dex_scan: Option<DateTime<Utc>>,
    pub last_crisis_check: Option<DateTime<Utc>>,

    pub logs: LogRing,
    pub cost_tracker: CostTracker,

    /// Bumped on every persisted write (ambient, §2 "version").
    pub version: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
}

impl AgentState {
    pub fn new(config: Config) -> Self {
        let now = Utc::now();
        let starting_balance = config.dex_starting_balance_sol;
        Self {
            config,
            enabled: true,
            signal_cache: Vec::new(),
            position_entries: HashMap::new(),
            option_positions: HashMap::new(),
            social_history: HashMap::new(),
            signal_research: HashMap::new(),
            position_research: HashMap::new(),
            staleness_analysis: HashMap::new(),
            twitter_confirmations: HashMap::new(),
            twitter_daily_reads: 0,
            twitter_daily_reset: now,
            premarket_plan: None,
            dex_signals: Vec::new(),
            dex_positions: HashMap::new(),
            dex_trade_history: Vec::new(),
            dex_realized_pnl_sol: Decimal::ZERO,
            dex_paper_balance_sol: starting_balance,
            dex_portfolio_history: Vec::new(),
            dex_max_consecutive_losses: 0,
            dex_current_loss_streak: 0,
            dex_max_drawdown_pct: 0.0,
            dex_max_drawdown_duration_ms: 0,
            dex_drawdown_start_time: None,
            dex_peak_balance: starting_balance,
            dex_peak_value: starting_balance,
            dex_drawdown_paused: false,
            dex_recent_stop_losses: Vec::new(),
            dex_circuit_breaker_until: None,
            dex_stop_loss_cooldowns: HashMap::new(),
            crisis_state: CrisisState::default(),
            last_data_gather: None,
            last_analyst: None,
            last_research: None,
            last_dex_scan: None,
            last_crisis_check: None,
            logs: LogRing::default(),
            cost_tracker: CostTracker::default(),
            version: 0,
            last_tick_at: None,
        }
    }

    /// Total DEX portfolio value: paper balance + mark-to-market of open
    /// positions (spec §4.3 "Sizing and slippage").
    pub fn dex_total_value(&self, sol_usd: Decimal, prices: &HashMap<String, Decimal>) -> Decimal {
        let mtm: Decimal = self
            .dex_positions
            .values()
            .map(|p| {
                let price = prices.get(&p.token_address).copied().unwrap_or(p.peak_price);
                p.mark_to_market_usd(price) / sol_usd.max(Decimal::new(1, 2))
            })
            .sum();
        self.dex_paper_balance_sol + mtm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_ring_caps_at_500() {
        let mut ring = LogRing::default();
        for i in 0..(LOG_CAP + 20) {
            ring.push("info", format!("line {i}"));
        }
        assert_eq!(ring.tail(LOG_CAP + 20).len(), LOG_CAP);
        let tail = ring.tail(1);
        assert_eq!(tail[0].message, format!("line {}", LOG_CAP + 19));
    }

    #[test]
    fn cost_tracker_accumulates() {
        let mut tracker = CostTracker::default();
        tracker.record(100, 50, Decimal::new(25, 2));
        tracker.record(200, 50, Decimal::new(25, 2));
        assert_eq!(tracker.total_prompt_tokens, 300);
        assert_eq!(tracker.calls, 2);
    }
}
