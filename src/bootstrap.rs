//! Process wiring: build every concrete adapter from [`Config`] and assemble
//! a running [`Agent`], shared by both binaries (`src/main.rs` and
//! `src/bin/server.rs`). Grounded in the teacher's `application/system/mod.rs`
//! composition-root shape.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info};

use crate::application::actor::Agent;
use crate::application::signals::SignalSource;
use crate::config::Config;
use crate::domain::ports::{
    AlarmScheduler, BrokerAdapter, ChartAnalyzer, CrisisIndicatorSource, DexProvider, LlmClient, Notifier, StateStore,
    TwitterClient,
};
use crate::infrastructure::alarm::StoreBackedAlarmScheduler;
use crate::infrastructure::broker_http::AlpacaBroker;
use crate::infrastructure::crisis_sources;
use crate::infrastructure::dex_http::{BirdeyeChartAnalyzer, BirdeyeDexProvider};
use crate::infrastructure::llm_http::OpenAiClient;
use crate::infrastructure::notify::{DiscordNotifier, NullNotifier};
use crate::infrastructure::persistence::SqliteStateStore;
use crate::infrastructure::signal_sources::{CryptoRssSource, RedditSource, StockTwitsSource};
use crate::infrastructure::twitter_http::{NullTwitterClient, TwitterHttpClient};

/// A live, wired [`Agent`] plus the pieces the run loop and the admin HTTP
/// server need directly.
pub struct Runtime {
    pub agent: Arc<Agent>,
    pub alarm: Arc<StoreBackedAlarmScheduler>,
    pub config: Config,
}

/// Build every adapter and the [`Agent`] from `Config`, then restore any
/// persisted state (spec §7 "never block startup on a corrupt blob").
pub async fn build(config: Config, db_url: &str) -> Result<Runtime> {
    let store: Arc<dyn StateStore> = Arc::new(SqliteStateStore::new(db_url).await?);
    let alarm = Arc::new(StoreBackedAlarmScheduler::new(store.clone()));

    let broker: Arc<dyn BrokerAdapter> = Arc::new(AlpacaBroker::new(
        config.broker_api_key.clone(),
        config.broker_api_secret.clone(),
        config.broker_base_url.clone(),
    ));
    let llm_client: Arc<dyn LlmClient> =
        Arc::new(OpenAiClient::with_base_url(config.llm_api_key.clone(), config.llm_base_url.clone()));
    let dex_provider: Arc<dyn DexProvider> = Arc::new(BirdeyeDexProvider::new(config.dex_provider_api_key.clone()));
    let chart_analyzer: Arc<dyn ChartAnalyzer> =
        Arc::new(BirdeyeChartAnalyzer::new(config.dex_provider_api_key.clone()));

    let crisis_indicator_sources: Vec<Box<dyn CrisisIndicatorSource>> = crisis_sources::default_sources(
        config.fred_api_key.clone(),
        config.fred_series_ted.clone(),
        config.fred_series_yield_curve.clone(),
        config.fred_series_fed_balance.clone(),
    );

    let mut signal_sources: Vec<Box<dyn SignalSource>> = vec![
        Box::new(RedditSource::wsb()),
        Box::new(RedditSource::stocks()),
        Box::new(RedditSource::investing()),
        Box::new(RedditSource::options()),
        Box::new(StockTwitsSource::new(vec![
            "SPY", "QQQ", "TSLA", "NVDA", "AAPL", "AMD", "GME", "AMC", "PLTR", "SOFI",
        ])),
    ];
    if config.crypto_enabled {
        signal_sources.push(Box::new(CryptoRssSource::new("https://www.coindesk.com/arc/outboundfeeds/rss/")));
    }

    let notifier: Arc<dyn Notifier> = match &config.discord_webhook_url {
        Some(url) if !url.is_empty() => Arc::new(DiscordNotifier::new(url.clone())),
        _ => Arc::new(NullNotifier),
    };

    let twitter_client: Arc<dyn TwitterClient> = match &config.twitter_bearer_token {
        Some(token) if !token.is_empty() => Arc::new(TwitterHttpClient::new(token.clone())),
        _ => Arc::new(NullTwitterClient),
    };

    let agent = Arc::new(Agent::new(
        config.clone(),
        broker,
        llm_client,
        dex_provider,
        chart_analyzer,
        crisis_indicator_sources,
        signal_sources,
        notifier,
        store,
        alarm.clone() as Arc<dyn AlarmScheduler>,
        twitter_client,
    ));

    agent.restore(config.clone()).await;
    info!("agent state restored from persistence (or started fresh)");

    Ok(Runtime { agent, alarm, config })
}

/// Drive the tick loop forever: sleep until the persisted alarm's fire time,
/// waking early whenever `reschedule`/`cancel` moves it (spec §4.1 "ensures
/// an alarm is scheduled" on every tick — honoring that alarm is the run
/// loop's only job). Forces an immediate first tick on startup, recovering
/// an overdue alarm left by a crashed prior process (spec §7).
pub async fn run_tick_loop(runtime: &Runtime) {
    runtime.alarm.reschedule(0).await.ok();
    let notify = runtime.alarm.notifier();

    loop {
        let fire_at = runtime.alarm.next_fire().await.unwrap_or(None);
        let sleep_for = match fire_at {
            Some(at) => {
                let millis = (at - chrono::Utc::now()).num_milliseconds().max(0) as u64;
                Duration::from_millis(millis)
            }
            None => Duration::from_secs(3600),
        };

        tokio::select! {
            _ = tokio::time::sleep(sleep_for) => {}
            _ = notify.notified() => continue,
        }

        if let Err(err) = runtime.agent.tick().await {
            error!(%err, "tick failed");
        }
    }
}
