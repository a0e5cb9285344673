//! LLM research and analyst passes (spec §4.2, §4.4, §6 "LLM client").
//! Prompt assembly and response parsing live here; the HTTP transport is an
//! injected [`LlmClient`](crate::domain::ports::LlmClient) implementation.
//! The teacher's own `application/agents/analyst.rs` is pure TA-indicator
//! based and has no LLM integration anywhere in its tree; there is nothing to
//! ground this module on there, so it is built directly from spec §4.2/§4.4/§6
//! in the teacher's general request/response-struct idiom (see DESIGN.md).

use anyhow::Result;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use crate::domain::ports::{ChatMessage, CompletionRequest, LlmClient};
use crate::domain::state::{CostTracker, ResearchResult, Verdict};

/// Per-1M-token USD pricing (spec §6 cost table).
fn model_pricing(model: &str) -> (f64, f64) {
    match model {
        "gpt-4o" => (2.5, 10.0),
        "gpt-4o-mini" => (0.15, 0.6),
        _ => (2.5, 10.0),
    }
}

fn cost_for(model: &str, prompt_tokens: u64, completion_tokens: u64) -> Decimal {
    let (prompt_rate, completion_rate) = model_pricing(model);
    let prompt_cost = prompt_tokens as f64 / 1_000_000.0 * prompt_rate;
    let completion_cost = completion_tokens as f64 / 1_000_000.0 * completion_rate;
    Decimal::from_f64(prompt_cost + completion_cost).unwrap_or(Decimal::ZERO)
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    verdict: String,
    confidence: f64,
    reasoning: String,
    #[serde(default)]
    entry_quality: Option<String>,
}

fn parse_verdict(raw: &str, now: chrono::DateTime<chrono::Utc>) -> Option<ResearchResult> {
    let parsed: RawVerdict = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(err) => {
            // Parse failures degrade to "no recommendation", never a panic
            // or a silent Hold (spec §7 "LLM output must never crash the tick").
            warn!(%err, "LLM response was not valid JSON, treating as no recommendation");
            return None;
        }
    };
    let verdict = match parsed.verdict.to_ascii_uppercase().as_str() {
        "BUY" => Verdict::Buy,
        "SELL" => Verdict::Sell,
        "HOLD" => Verdict::Hold,
        other => {
            warn!(verdict = other, "unrecognized LLM verdict, treating as no recommendation");
            return None;
        }
    };
    Some(ResearchResult {
        verdict,
        confidence: parsed.confidence.clamp(0.0, 1.0),
        reasoning: parsed.reasoning,
        entry_quality: parsed.entry_quality,
        computed_at: now,
    })
}

/// Assemble the analyst prompt for one symbol's entry decision (spec §4.4).
pub fn build_analyst_prompt(symbol: &str, sentiment_summary: &str, price_context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system",
            content: "You are a disciplined trading analyst. Respond ONLY with compact JSON: \
                {\"verdict\": \"BUY\"|\"SELL\"|\"HOLD\", \"confidence\": 0.0-1.0, \"reasoning\": \"...\", \
                \"entry_quality\": \"excellent\"|\"good\"|\"marginal\"|null}."
                .to_string(),
        },
        ChatMessage {
            role: "user",
            content: format!(
                "Symbol: {symbol}\nSocial sentiment: {sentiment_summary}\nPrice context: {price_context}\n\
                Decide BUY, SELL, or HOLD."
            ),
        },
    ]
}

/// Assemble the deeper research prompt used for signal/position research
/// passes (spec §4.2 "batch research").
pub fn build_research_prompt(symbol: &str, recent_signals: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system",
            content: "You are a research analyst validating retail trading chatter against \
                fundamentals. Respond ONLY with compact JSON: \
                {\"verdict\": \"BUY\"|\"SELL\"|\"HOLD\", \"confidence\": 0.0-1.0, \"reasoning\": \"...\"}."
                .to_string(),
        },
        ChatMessage {
            role: "user",
            content: format!("Symbol: {symbol}\nRecent signals:\n{recent_signals}"),
        },
    ]
}

/// Run a completion request and parse it into a [`ResearchResult`],
/// recording cost against the tracker regardless of parse outcome (spec §7
/// "cost is recorded even on parse failure").
pub async fn run_verdict_request(
    client: &dyn LlmClient,
    model: &str,
    messages: Vec<ChatMessage>,
    cost_tracker: &mut CostTracker,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Option<ResearchResult>> {
    let request = CompletionRequest {
        model: model.to_string(),
        messages,
        max_tokens: 400,
        temperature: 0.2,
        json_mode: true,
    };
    let response = client.complete(request).await?;
    let cost = cost_for(model, response.usage.prompt_tokens, response.usage.completion_tokens);
    cost_tracker.record(response.usage.prompt_tokens, response.usage.completion_tokens, cost);
    Ok(parse_verdict(&response.content, now))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_verdict_accepts_well_formed_json() {
        let now = chrono::Utc::now();
        let raw = r#"{"verdict":"BUY","confidence":0.82,"reasoning":"strong momentum","entry_quality":"excellent"}"#;
        let result = parse_verdict(raw, now).unwrap();
        assert_eq!(result.verdict, Verdict::Buy);
        assert!((result.confidence - 0.82).abs() < 1e-9);
        assert_eq!(result.entry_quality.as_deref(), Some("excellent"));
    }

    #[test]
    fn parse_verdict_degrades_to_none_on_malformed_json() {
        let now = chrono::Utc::now();
        assert!(parse_verdict("not json", now).is_none());
    }

    #[test]
    fn parse_verdict_degrades_to_none_on_unknown_verdict_string() {
        let now = chrono::Utc::now();
        let raw = r#"{"verdict":"MAYBE","confidence":0.5,"reasoning":"unsure"}"#;
        assert!(parse_verdict(raw, now).is_none());
    }

    #[test]
    fn cost_table_matches_spec() {
        let cost = cost_for("gpt-4o", 1_000_000, 1_000_000);
        assert_eq!(cost, Decimal::from_f64(12.5).unwrap());
        let cost_mini = cost_for("gpt-4o-mini", 1_000_000, 1_000_000);
        assert_eq!(cost_mini, Decimal::from_f64(0.75).unwrap());
    }
}
