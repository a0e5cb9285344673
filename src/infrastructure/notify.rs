//! [`Notifier`] implementations: a Discord webhook and a no-op fallback used
//! when no webhook is configured (spec §6 "Notifier", §4.6 "crisis level
//! transitions are pushed to the configured notifier").

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;

use crate::domain::ports::Notifier;
use crate::infrastructure::core::http_client_factory::HttpClientFactory;

pub struct DiscordNotifier {
    webhook_url: String,
    client: ClientWithMiddleware,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: HttpClientFactory::create_client(),
        }
    }
}

#[derive(Debug, Serialize)]
struct WebhookBody {
    content: String,
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let body = WebhookBody {
            content: message.chars().take(2000).collect(),
        };
        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .context("discord webhook request failed")?;
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("discord webhook rejected: {text}");
        }
        Ok(())
    }
}

/// Used when no webhook is configured; notifications are dropped silently
/// rather than the tick failing on an absent collaborator.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _message: &str) -> Result<()> {
        Ok(())
    }
}
