//! The tick actor (spec §4.1): one `AgentState`, mutated only inside `tick`
//! or an admin call, both serialized through a single `tokio::sync::Mutex`.
//! Grounded in the teacher's command-pattern actors — `application/agents/sentinel.rs`'s
//! `SentinelCommand` and `application/risk_management/commands.rs`'s `RiskCommand`
//! — adapted from their mpsc command queues to a directly-callable async API
//! since every admin operation here is a short, already-atomic state mutation
//! (documented in DESIGN.md).

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::application::signals::ticker::TickerCache;
use crate::application::signals::SignalSource;
use crate::application::{crisis, dex, llm, trader};
use crate::config::Config;
use crate::domain::ports::{
    AlarmScheduler, BrokerAdapter, ChartAnalyzer, CrisisIndicatorSource, DexProvider, LlmClient,
    Notifier, StateStore, TwitterClient,
};
use crate::domain::state::{AgentState, LogEntry, TwitterConfirmation, Verdict};

pub const TICK_INTERVAL_SECS: i64 = 30;

pub struct Agent {
    state: tokio::sync::Mutex<AgentState>,
    broker: Arc<dyn BrokerAdapter>,
    llm_client: Arc<dyn LlmClient>,
    dex_provider: Arc<dyn DexProvider>,
    chart_analyzer: Arc<dyn ChartAnalyzer>,
    crisis_sources: Vec<Box<dyn CrisisIndicatorSource>>,
    signal_sources: Vec<Box<dyn SignalSource>>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn StateStore>,
    alarm: Arc<dyn AlarmScheduler>,
    twitter_client: Arc<dyn TwitterClient>,
    /// Process-wide, non-persisted (spec §7 "Process-wide state"): survives
    /// for the life of the process, never serialized with `AgentState`.
    ticker_cache: tokio::sync::Mutex<TickerCache>,
}

#[allow(clippy::too_many_arguments)]
impl Agent {
    pub fn new(
        config: Config,
        broker: Arc<dyn BrokerAdapter>,
        llm_client: Arc<dyn LlmClient>,
        dex_provider: Arc<dyn DexProvider>,
        chart_analyzer: Arc<dyn ChartAnalyzer>,
        crisis_sources: Vec<Box<dyn CrisisIndicatorSource>>,
        signal_sources: Vec<Box<dyn SignalSource>>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn StateStore>,
        alarm: Arc<dyn AlarmScheduler>,
        twitter_client: Arc<dyn TwitterClient>,
    ) -> Self {
        Self {
            state: tokio::sync::Mutex::new(AgentState::new(config)),
            broker,
            llm_client,
            dex_provider,
            chart_analyzer,
            crisis_sources,
            signal_sources,
            notifier,
            store,
            alarm,
            twitter_client,
            ticker_cache: tokio::sync::Mutex::new(TickerCache::new()),
        }
    }

    /// Restore from a persisted blob, falling back to a fresh state on
    /// corruption (spec §6 "Persistence", §7 "never block startup on a
    /// corrupt blob").
    pub async fn restore(&self, default_config: Config) {
        match self.store.load().await {
            Ok(Some(blob)) => match serde_json::from_slice::<AgentState>(&blob) {
                Ok(mut restored) => {
                    restored.config.migrate();
                    let mut guard = self.state.lock().await;
                    *guard = restored;
                    info!("restored agent state from persistence");
                }
                Err(err) => {
                    error!(%err, "persisted state was corrupt, starting fresh");
                    let mut guard = self.state.lock().await;
                    *guard = AgentState::new(default_config);
                }
            },
            Ok(None) => info!("no persisted state found, starting fresh"),
            Err(err) => error!(%err, "failed to load persisted state, starting fresh"),
        }
    }

    async fn persist(&self, state: &AgentState) {
        match serde_json::to_vec(state) {
            Ok(blob) => {
                if let Err(err) = self.store.save(&blob).await {
                    error!(%err, "failed to persist agent state");
                }
            }
            Err(err) => error!(%err, "failed to serialize agent state"),
        }
    }

    /// Run one full tick per the §4.1 contract: disabled-check, clock,
    /// crisis check/actions (short-circuiting the rest of the tick at full
    /// crisis), data gather, research, crypto trading, DEX engine, and
    /// (market hours only) the equity trader and options sub-flow.
    pub async fn tick(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        state.last_tick_at = Some(now);

        if !state.enabled {
            // spec §4.1 step 1: "If disabled, return without rescheduling."
            // `disable()` already cancels the alarm; this branch only
            // guards against a tick that was already in flight when
            // disable landed.
            return Ok(());
        }

        let clock = match self.broker.get_clock().await {
            Ok(c) => c,
            Err(err) => {
                warn!(%err, "clock fetch failed, assuming market closed this tick");
                crate::domain::trading::MarketClock {
                    is_open: false,
                    now,
                    next_open: now,
                    next_close: now,
                }
            }
        };

        // --- crisis check ---
        let crisis_due = state
            .last_crisis_check
            .map(|t| (now - t).num_milliseconds() as u64 >= state.config.crisis_check_interval_ms)
            .unwrap_or(true);
        if state.config.crisis_mode_enabled && crisis_due && !state.crisis_state.manual_override {
            crisis::check(&mut state, &self.crisis_sources, now).await;
            state.last_crisis_check = Some(now);
        }
        if state.config.crisis_mode_enabled {
            if let Err(err) = crisis::apply_effects(&mut state, self.broker.as_ref(), now).await {
                error!(%err, "crisis effect application failed");
            }
            if state.crisis_state.level.forces_liquidation() {
                state.logs.push("warn", "tick short-circuited: full crisis blocks further trading");
                self.persist(&state).await;
                drop(state);
                self.alarm.reschedule(TICK_INTERVAL_SECS).await.ok();
                return Ok(());
            }
        }

        // --- data gather ---
        let gather_due = state
            .last_data_gather
            .map(|t| (now - t).num_milliseconds() as u64 >= state.config.data_poll_interval_ms)
            .unwrap_or(true);
        if gather_due {
            let (fresh, errors) =
                crate::application::signals::gather_all(&self.signal_sources, now, state.config.decay_half_life_minutes)
                    .await;
            for err in &errors {
                warn!(error = %err, "signal source failed this tick");
            }
            let validated = self.validate_fresh_signals(fresh, now).await;
            crate::domain::signal::merge_into_cache(&mut state.signal_cache, validated, now);
            state.last_data_gather = Some(now);
        }

        // --- research pass ---
        let research_due = state
            .last_research
            .map(|t| (now - t).num_milliseconds() as u64 >= state.config.research_interval_ms)
            .unwrap_or(true);
        if research_due {
            self.run_research_pass(&mut state, now).await;
            state.last_research = Some(now);
        }

        // --- pre-market plan (spec §4.1 step 6: weekday 09:25-09:29, no plan
        // cached yet). Detected clock-relative (minutes to `next_open`)
        // rather than against a hardcoded local timezone; see DESIGN.md
        // "premarket window".
        if !clock.is_open && state.premarket_plan.is_none() {
            let minutes_to_open = (clock.next_open - now).num_minutes();
            if (1..=5).contains(&minutes_to_open) {
                self.run_premarket_analysis(&mut state, clock.next_open, now).await;
            }
        }

        // --- crypto trading (independent of market hours) ---
        if state.config.crypto_enabled {
            if let Err(err) = trader::run_exits(&mut state, self.broker.as_ref(), now).await {
                error!(%err, "crypto exit pass failed");
            }
            if let Err(err) = trader::run_entries(&mut state, self.broker.as_ref(), now).await {
                error!(%err, "crypto entry pass failed");
            }
        }

        // --- DEX momentum engine ---
        let dex_due = state
            .last_dex_scan
            .map(|t| (now - t).num_milliseconds() as u64 >= state.config.dex_scan_interval_ms)
            .unwrap_or(true);
        if state.config.dex_enabled && dex_due {
            let cfg = state.config.clone();
            let outcome = dex::scan_and_trade(
                &mut state,
                &cfg,
                self.dex_provider.as_ref(),
                Some(self.chart_analyzer.as_ref()),
                now,
            )
            .await;
            if !outcome.opened.is_empty() || !outcome.closed.is_empty() {
                info!(opened = outcome.opened.len(), closed = outcome.closed.len(), "DEX scan complete");
            }
            for line in outcome.logs {
                state.logs.push("info", line);
            }
            state.last_dex_scan = Some(now);
        }

        // --- equities (market hours only) ---
        if clock.is_open && state.config.stocks_enabled {
            // Pre-market plan execution precedes the analyst pass (spec §4.1
            // ordering guarantees): inside the 09:30-09:32 window, spend the
            // cached plan's candidates, then clear it so tomorrow's
            // pre-market window can build a fresh one.
            if let Some(plan) = state.premarket_plan.clone() {
                if (now - plan.opens_at).num_minutes() <= 2 {
                    match trader::run_entries_filtered(&mut state, self.broker.as_ref(), now, Some(&plan.candidates)).await {
                        Ok(opened) => {
                            if !opened.is_empty() {
                                info!(?opened, "executed pre-market plan");
                            }
                        }
                        Err(err) => error!(%err, "pre-market plan execution failed"),
                    }
                    state.premarket_plan = None;
                }
            }

            // Analyst pass precedes exits/entries (spec §4.1 ordering guarantees:
            // "pre-market plan execution precedes analyst"; analyst's fresh
            // SELL/BUY verdicts should drive the very exits/entries passes
            // below, not the next tick's).
            let analyst_due = state
                .last_analyst
                .map(|t| (now - t).num_milliseconds() as u64 >= state.config.analyst_interval_ms)
                .unwrap_or(true);
            if analyst_due {
                self.run_analyst_pass(&mut state, now).await;
                state.last_analyst = Some(now);
            }

            if let Err(err) = trader::run_exits(&mut state, self.broker.as_ref(), now).await {
                error!(%err, "equity exit pass failed");
            }
            if let Err(err) = trader::run_entries(&mut state, self.broker.as_ref(), now).await {
                error!(%err, "equity entry pass failed");
            }

            if state.config.options_enabled {
                if let Err(err) = trader::options::evaluate_exits(&mut state, self.broker.as_ref(), now).await {
                    error!(%err, "options exit pass failed");
                }
            }

            if state.config.twitter_enabled {
                self.check_breaking_news(&mut state, now).await;
            }
        }

        state.version += 1;
        self.persist(&state).await;
        drop(state);
        self.alarm.reschedule(TICK_INTERVAL_SECS).await.ok();
        Ok(())
    }

    /// Drop signals whose symbol isn't a known-tradable ticker (spec §4.2
    /// "Validation path"): crypto signals skip the broker lookup entirely,
    /// equity candidates are checked against the per-process
    /// [`TickerCache`](crate::application::signals::ticker::TickerCache).
    async fn validate_fresh_signals(
        &self,
        fresh: Vec<crate::domain::signal::Signal>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Vec<crate::domain::signal::Signal> {
        let mut cache = self.ticker_cache.lock().await;
        let mut kept = Vec::with_capacity(fresh.len());
        for signal in fresh {
            if signal.is_crypto || cache.is_tradable(self.broker.as_ref(), &signal.symbol, now).await {
                kept.push(signal);
            }
        }
        kept
    }

    /// Batch research pass: send the top `signal_research_batch` fresh
    /// signals (by absolute weighted sentiment) to the LLM and store verdicts
    /// (spec §4.2 "batch research").
    async fn run_research_pass(&self, state: &mut AgentState, now: chrono::DateTime<chrono::Utc>) {
        let mut symbols: Vec<String> = state.signal_cache.iter().map(|s| s.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();
        symbols.truncate(state.config.signal_research_batch);

        for symbol in symbols {
            let summary: String = state
                .signal_cache
                .iter()
                .filter(|s| s.symbol == symbol)
                .map(|s| format!("[{:?} {:.2}] ", s.source, s.sentiment))
                .collect();
            let prompt = llm::build_research_prompt(&symbol, &summary);
            match llm::run_verdict_request(
                self.llm_client.as_ref(),
                &state.config.research_model,
                prompt,
                &mut state.cost_tracker,
                now,
            )
            .await
            {
                Ok(Some(result)) => {
                    if result.verdict == Verdict::Buy {
                        state.signal_research.insert(symbol, result);
                    }
                }
                Ok(None) => {}
                Err(err) => warn!(%symbol, %err, "research request failed"),
            }
        }
    }

    /// Equity analyst pass (spec §4.4 "LLM analyst pass, runs every
    /// `analyst_interval_ms` during market hours"): ask the analyst model
    /// about the top fresh, not-yet-held candidates (feeding `run_entries`
    /// via `signal_research`, distinct from the signal-level batch research
    /// pass above) and about every currently held equity/crypto position
    /// (feeding `run_exits`'s LLM-sell trigger via `position_research`).
    async fn run_analyst_pass(&self, state: &mut AgentState, now: chrono::DateTime<chrono::Utc>) {
        let mut candidates: Vec<String> = state.signal_cache.iter().map(|s| s.symbol.clone()).collect();
        candidates.sort();
        candidates.dedup();
        candidates.retain(|s| !state.position_entries.contains_key(s));
        candidates.truncate(10);

        let held: Vec<String> = state.position_entries.keys().cloned().collect();

        for symbol in candidates.into_iter().chain(held) {
            let sentiment_summary: String = state
                .signal_cache
                .iter()
                .filter(|s| s.symbol == symbol)
                .map(|s| format!("[{:?} {:.2}] ", s.source, s.sentiment))
                .collect();
            let price_context = match state.position_entries.get(&symbol) {
                Some(entry) => format!(
                    "held since {}, entry price {}, peak price {}",
                    entry.entry_time, entry.entry_price, entry.peak_price
                ),
                None => "not currently held".to_string(),
            };

            let prompt = llm::build_analyst_prompt(&symbol, &sentiment_summary, &price_context);
            match llm::run_verdict_request(
                self.llm_client.as_ref(),
                &state.config.analyst_model,
                prompt,
                &mut state.cost_tracker,
                now,
            )
            .await
            {
                Ok(Some(result)) => {
                    if state.position_entries.contains_key(&symbol) {
                        state.position_research.insert(symbol, result);
                    } else if result.verdict == Verdict::Buy {
                        state.signal_research.insert(symbol, result);
                    }
                }
                Ok(None) => {}
                Err(err) => warn!(%symbol, %err, "analyst request failed"),
            }
        }
    }

    /// Build the day's pre-market plan: the top fresh, not-yet-held
    /// candidates, researched with the analyst model and cached for
    /// execution in the 09:30-09:32 window (spec §4.1 step 6).
    async fn run_premarket_analysis(
        &self,
        state: &mut AgentState,
        opens_at: chrono::DateTime<chrono::Utc>,
        now: chrono::DateTime<chrono::Utc>,
    ) {
        let mut symbols: Vec<String> = state.signal_cache.iter().map(|s| s.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();
        symbols.retain(|s| !state.position_entries.contains_key(s));
        symbols.truncate(state.config.signal_research_batch);

        let mut candidates = Vec::new();
        let mut reasoning = String::new();
        for symbol in symbols {
            let summary: String = state
                .signal_cache
                .iter()
                .filter(|s| s.symbol == symbol)
                .map(|s| format!("[{:?} {:.2}] ", s.source, s.sentiment))
                .collect();
            let prompt = llm::build_analyst_prompt(&symbol, &summary, "not currently held, pre-market screening");
            match llm::run_verdict_request(
                self.llm_client.as_ref(),
                &state.config.analyst_model,
                prompt,
                &mut state.cost_tracker,
                now,
            )
            .await
            {
                Ok(Some(result)) if result.verdict == Verdict::Buy => {
                    reasoning.push_str(&format!("{symbol}: {}\n", result.reasoning));
                    candidates.push(symbol.clone());
                    state.signal_research.insert(symbol, result);
                }
                Ok(_) => {}
                Err(err) => warn!(%symbol, %err, "pre-market research request failed"),
            }
        }

        info!(count = candidates.len(), "built pre-market plan");
        state.logs.push("info", format!("pre-market plan built with {} candidates", candidates.len()));
        state.premarket_plan = Some(crate::domain::state::PremarketPlan {
            created_at: now,
            opens_at,
            candidates,
            reasoning,
        });
    }

    /// Check Twitter/X for breaking confirmation or contradiction on every
    /// held equity/crypto symbol, respecting the daily read budget (spec §4.1
    /// step 9 "check breaking news for held symbols", §5 "budget 200/day").
    async fn check_breaking_news(&self, state: &mut AgentState, now: chrono::DateTime<chrono::Utc>) {
        if now.signed_duration_since(state.twitter_daily_reset).num_hours() >= 24 {
            state.twitter_daily_reads = 0;
            state.twitter_daily_reset = now;
        }

        let held: Vec<String> = state.position_entries.keys().cloned().collect();
        for symbol in held {
            if state.twitter_daily_reads >= state.config.twitter_daily_budget {
                state.logs.push("info", "twitter daily read budget exhausted, skipping remaining symbols");
                break;
            }
            state.twitter_daily_reads += 1;
            match self.twitter_client.check_symbol(&symbol).await {
                Ok(verdict) => {
                    state.twitter_confirmations.insert(symbol, verdict);
                }
                Err(err) => {
                    warn!(%symbol, %err, "twitter breaking-news check failed");
                    state.twitter_confirmations.insert(symbol, TwitterConfirmation::NoSignal);
                }
            }
        }
    }

    pub async fn status(&self) -> AgentStatus {
        let state = self.state.lock().await;
        AgentStatus {
            enabled: state.enabled,
            crisis_level: state.crisis_state.level,
            open_equity_positions: state.position_entries.len(),
            open_dex_positions: state.dex_positions.len(),
            dex_paper_balance_sol: state.dex_paper_balance_sol,
            version: state.version,
            last_tick_at: state.last_tick_at,
        }
    }

    /// Full dashboard snapshot for `GET /status` (spec §6 "account,
    /// positions, clock, config, signals, logs[-100], research, DEX
    /// positions with live P&L and metrics, portfolio history, crisis
    /// state"). Broker reads are best-effort: a failed account/position/clock
    /// fetch degrades to `None`/empty rather than failing the whole request.
    pub async fn full_status(&self) -> FullStatus {
        let account = self.broker.get_account().await.ok();
        let positions = self.broker.get_positions().await.unwrap_or_default();
        let clock = self.broker.get_clock().await.ok();

        let state = self.state.lock().await;

        let dex_metrics = dex::metrics::calculate_metrics(&state.dex_trade_history);
        let dex_positions: Vec<DexPositionView> = state
            .dex_positions
            .values()
            .map(|p| DexPositionView {
                symbol: p.symbol.clone(),
                token_address: p.token_address.clone(),
                tier: p.tier,
                entry_price: p.entry_price,
                peak_price: p.peak_price,
                unrealized_pl_pct: p.pl_pct(p.peak_price),
                entry_stake_sol: p.entry_stake_sol,
            })
            .collect();

        FullStatus {
            enabled: state.enabled,
            version: state.version,
            last_tick_at: state.last_tick_at,
            account,
            positions,
            clock,
            crisis_state: state.crisis_state.clone(),
            config: state.config.clone(),
            signals: state.signal_cache.clone(),
            logs: state.logs.tail(100),
            signal_research: state.signal_research.clone(),
            dex_positions,
            dex_metrics,
            dex_paper_balance_sol: state.dex_paper_balance_sol,
            dex_realized_pnl_sol: state.dex_realized_pnl_sol,
            dex_circuit_breaker_until: state.dex_circuit_breaker_until,
            dex_drawdown_paused: state.dex_drawdown_paused,
            dex_portfolio_history: state.dex_portfolio_history.clone(),
            position_entries: state.position_entries.clone(),
            option_positions: state.option_positions.clone(),
            premarket_plan: state.premarket_plan.clone(),
            cost_tracker: state.cost_tracker.clone(),
        }
    }

    pub async fn enable(&self) {
        let mut state = self.state.lock().await;
        state.enabled = true;
        state.logs.push("info", "agent enabled via admin command");
        drop(state);
        self.alarm.reschedule(TICK_INTERVAL_SECS).await.ok();
    }

    pub async fn disable(&self) {
        let mut state = self.state.lock().await;
        state.enabled = false;
        state.logs.push("warn", "agent disabled via admin command");
        drop(state);
        self.alarm.cancel().await.ok();
    }

    /// Kill switch: disable, clear the alarm, and drop the signal cache and
    /// pre-market plan. Open positions are deliberately left alone (spec §6
    /// admin surface "/kill": "Open positions are not auto-closed"), gated
    /// by a separate secret from the general admin token.
    pub async fn kill(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.enabled = false;
        state.signal_cache.clear();
        state.premarket_plan = None;
        self.alarm.cancel().await.ok();
        state.logs.push("warn", "KILL SWITCH engaged: agent disabled, signal cache cleared");
        self.notifier.notify("kill switch engaged").await.ok();
        self.persist(&state).await;
        Ok(())
    }

    pub async fn signals(&self) -> Vec<crate::domain::signal::Signal> {
        let state = self.state.lock().await;
        state.signal_cache.clone()
    }

    pub async fn logs(&self, limit: usize) -> Vec<LogEntry> {
        let state = self.state.lock().await;
        state.logs.tail(limit)
    }

    pub async fn costs(&self) -> crate::domain::state::CostTracker {
        let state = self.state.lock().await;
        state.cost_tracker.clone()
    }

    pub async fn dex_reset(&self) {
        let mut state = self.state.lock().await;
        let starting = state.config.dex_starting_balance_sol;
        state.dex_positions.clear();
        state.dex_trade_history.clear();
        state.dex_realized_pnl_sol = rust_decimal::Decimal::ZERO;
        state.dex_paper_balance_sol = starting;
        state.dex_portfolio_history.clear();
        state.dex_max_consecutive_losses = 0;
        state.dex_current_loss_streak = 0;
        state.dex_max_drawdown_pct = 0.0;
        state.dex_max_drawdown_duration_ms = 0;
        state.dex_drawdown_start_time = None;
        state.dex_peak_balance = starting;
        state.dex_peak_value = starting;
        state.dex_drawdown_paused = false;
        state.dex_recent_stop_losses.clear();
        state.dex_circuit_breaker_until = None;
        state.dex_stop_loss_cooldowns.clear();
        state.logs.push("warn", "DEX paper book reset via admin command");
    }

    pub async fn dex_clear_cooldowns(&self) {
        let mut state = self.state.lock().await;
        state.dex_stop_loss_cooldowns.clear();
        state.logs.push("info", "DEX cooldowns cleared via admin command");
    }

    pub async fn dex_clear_breaker(&self) {
        let mut state = self.state.lock().await;
        state.dex_circuit_breaker_until = None;
        state.dex_recent_stop_losses.clear();
        state.logs.push("info", "DEX circuit breaker cleared via admin command");
    }

    /// Partial config merge (spec §6 admin surface "`POST /config`"). Live
    /// reinitialization of the broker/LLM/DEX HTTP clients from the new
    /// credentials is out of scope here: those adapters are constructed once
    /// at process start and held behind `Arc<dyn _>`, so a credential change
    /// takes effect on the next restart (documented in DESIGN.md); every
    /// other tunable takes effect on the very next tick.
    pub async fn merge_config(&self, patch: serde_json::Value) -> Result<()> {
        let mut state = self.state.lock().await;
        state.config.apply_patch(&patch)?;
        state.logs.push("info", "config merged via admin command");
        self.persist(&state).await;
        Ok(())
    }

    pub async fn crisis_toggle(&self, enabled: bool, level: Option<crate::domain::crisis::CrisisLevel>) {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        crisis::set_manual_override(&mut state, enabled, level, now);
    }

    pub async fn crisis_check_now(&self) {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        crisis::check(&mut state, &self.crisis_sources, now).await;
        state.last_crisis_check = Some(now);
    }

    pub async fn trigger(&self) -> Result<()> {
        self.tick().await
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AgentStatus {
    pub enabled: bool,
    pub crisis_level: crate::domain::crisis::CrisisLevel,
    pub open_equity_positions: usize,
    pub open_dex_positions: usize,
    pub dex_paper_balance_sol: rust_decimal::Decimal,
    pub version: u64,
    pub last_tick_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DexPositionView {
    pub symbol: String,
    pub token_address: String,
    pub tier: crate::domain::dex::Tier,
    pub entry_price: rust_decimal::Decimal,
    pub peak_price: rust_decimal::Decimal,
    /// P&L against `peak_price`, the last price the engine observed for this
    /// position — not a fresh broker/DEX quote (none is fetched for a
    /// read-only status call).
    pub unrealized_pl_pct: f64,
    pub entry_stake_sol: rust_decimal::Decimal,
}

/// Full admin dashboard snapshot (spec §6 `GET /status`).
#[derive(Debug, Clone, serde::Serialize)]
pub struct FullStatus {
    pub enabled: bool,
    pub version: u64,
    pub last_tick_at: Option<chrono::DateTime<chrono::Utc>>,
    pub account: Option<crate::domain::trading::Account>,
    pub positions: Vec<crate::domain::trading::Position>,
    pub clock: Option<crate::domain::trading::MarketClock>,
    pub crisis_state: crate::domain::crisis::CrisisState,
    pub config: Config,
    pub signals: Vec<crate::domain::signal::Signal>,
    pub logs: Vec<LogEntry>,
    pub signal_research: std::collections::HashMap<String, crate::domain::state::ResearchResult>,
    pub dex_positions: Vec<DexPositionView>,
    pub dex_metrics: dex::metrics::DexTradingMetrics,
    pub dex_paper_balance_sol: rust_decimal::Decimal,
    pub dex_realized_pnl_sol: rust_decimal::Decimal,
    pub dex_circuit_breaker_until: Option<chrono::DateTime<chrono::Utc>>,
    pub dex_drawdown_paused: bool,
    pub dex_portfolio_history: Vec<(chrono::DateTime<chrono::Utc>, rust_decimal::Decimal)>,
    pub position_entries: std::collections::HashMap<String, crate::domain::position::PositionEntry>,
    pub option_positions: std::collections::HashMap<String, crate::domain::trading::OptionPosition>,
    pub premarket_plan: Option<crate::domain::state::PremarketPlan>,
    pub cost_tracker: crate::domain::state::CostTracker,
}
