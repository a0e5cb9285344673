//! Admin HTTP surface (spec §6): a small axum router exposing read-only
//! status endpoints and a handful of mutating control endpoints, every one
//! of them gated by a bearer token compared in constant time. Grounded in
//! the teacher's headless `src/bin/server.rs` for the tracing/shutdown
//! shape and the pack's dashboard-style axum router
//! (`other_examples/.../src-dashboard-mod.rs`) for the `Router::new().route(...)`
//! layout, generalized from a read-only telemetry feed to a full
//! status+control surface.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::application::actor::Agent;

#[derive(Clone)]
struct AdminState {
    agent: Arc<Agent>,
    admin_token: String,
    kill_switch_secret: String,
}

/// Build the admin router. `admin_token`/`kill_switch_secret` are read once
/// at startup from [`crate::config::Config`] (`API_TOKEN`/`KILL_SWITCH_SECRET`)
/// and never change for the life of the process — a token rotation needs a
/// restart, matching `Agent::merge_config`'s credential-reload limitation.
pub fn router(agent: Arc<Agent>, admin_token: String, kill_switch_secret: String) -> Router {
    let state = AdminState {
        agent,
        admin_token,
        kill_switch_secret,
    };

    Router::new()
        .route("/status", get(status))
        .route("/config", post(config))
        .route("/enable", post(enable))
        .route("/disable", post(disable))
        .route("/logs", get(logs))
        .route("/costs", get(costs))
        .route("/signals", get(signals))
        .route("/trigger", post(trigger))
        .route("/kill", post(kill))
        .route("/dex/reset", post(dex_reset))
        .route("/dex/clear-cooldowns", post(dex_clear_cooldowns))
        .route("/dex/clear-breaker", post(dex_clear_breaker))
        .route("/crisis/toggle", post(crisis_toggle))
        .route("/crisis/check", post(crisis_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Constant-time byte comparison so a timing side-channel can't be used to
/// recover the token one byte at a time.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

fn authorize(headers: &HeaderMap, expected: &str) -> Result<(), (StatusCode, Json<Value>)> {
    let unauthorized = || (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })));
    let Some(token) = bearer_token(headers) else {
        return Err(unauthorized());
    };
    if expected.is_empty() || !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        return Err(unauthorized());
    }
    Ok(())
}

async fn status(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.admin_token) {
        return resp.into_response();
    }
    Json(state.agent.full_status().await).into_response()
}

async fn config(State(state): State<AdminState>, headers: HeaderMap, Json(patch): Json<Value>) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.admin_token) {
        return resp.into_response();
    }
    match state.agent.merge_config(patch).await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(err) => {
            warn!(%err, "config merge rejected");
            (StatusCode::BAD_REQUEST, Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}

async fn enable(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.admin_token) {
        return resp.into_response();
    }
    state.agent.enable().await;
    Json(json!({ "ok": true })).into_response()
}

async fn disable(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.admin_token) {
        return resp.into_response();
    }
    state.agent.disable().await;
    Json(json!({ "ok": true })).into_response()
}

#[derive(Deserialize)]
struct LogsQuery {
    limit: Option<usize>,
}

async fn logs(State(state): State<AdminState>, headers: HeaderMap, Query(q): Query<LogsQuery>) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.admin_token) {
        return resp.into_response();
    }
    let limit = q.limit.unwrap_or(100);
    Json(state.agent.logs(limit).await).into_response()
}

async fn costs(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.admin_token) {
        return resp.into_response();
    }
    Json(state.agent.costs().await).into_response()
}

async fn signals(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.admin_token) {
        return resp.into_response();
    }
    Json(state.agent.signals().await).into_response()
}

async fn trigger(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.admin_token) {
        return resp.into_response();
    }
    match state.agent.trigger().await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(err) => {
            warn!(%err, "manual trigger failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}

/// Gated by `KILL_SWITCH_SECRET`, a separate credential from the general
/// admin token (spec §6 "/kill uses a distinct secret"), so a leaked admin
/// token alone can't engage the kill switch.
async fn kill(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.kill_switch_secret) {
        return resp.into_response();
    }
    match state.agent.kill().await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": err.to_string() }))).into_response(),
    }
}

async fn dex_reset(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.admin_token) {
        return resp.into_response();
    }
    state.agent.dex_reset().await;
    Json(json!({ "ok": true })).into_response()
}

async fn dex_clear_cooldowns(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.admin_token) {
        return resp.into_response();
    }
    state.agent.dex_clear_cooldowns().await;
    Json(json!({ "ok": true })).into_response()
}

async fn dex_clear_breaker(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.admin_token) {
        return resp.into_response();
    }
    state.agent.dex_clear_breaker().await;
    Json(json!({ "ok": true })).into_response()
}

#[derive(Deserialize, Default)]
struct CrisisTogglePayload {
    #[serde(rename = "manualOverride")]
    manual_override: Option<bool>,
    level: Option<u8>,
}

async fn crisis_toggle(
    State(state): State<AdminState>,
    headers: HeaderMap,
    body: Option<Json<CrisisTogglePayload>>,
) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.admin_token) {
        return resp.into_response();
    }
    let payload = body.map(|Json(p)| p).unwrap_or_default();
    let enabled = payload.manual_override.unwrap_or(true);
    let level = match payload.level {
        Some(0) => Some(crate::domain::crisis::CrisisLevel::Normal),
        Some(1) => Some(crate::domain::crisis::CrisisLevel::Elevated),
        Some(2) => Some(crate::domain::crisis::CrisisLevel::HighAlert),
        Some(3) => Some(crate::domain::crisis::CrisisLevel::FullCrisis),
        Some(other) => {
            warn!(level = other, "crisis/toggle: ignoring out-of-range level");
            None
        }
        None => None,
    };
    state.agent.crisis_toggle(enabled, level).await;
    Json(json!({ "ok": true, "manualOverride": enabled })).into_response()
}

async fn crisis_check(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(resp) = authorize(&headers, &state.admin_token) {
        return resp.into_response();
    }
    state.agent.crisis_check_now().await;
    Json(json!({ "ok": true })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_rejects_different_lengths() {
        assert!(!constant_time_eq(b"abc", b"ab"));
    }

    #[test]
    fn constant_time_eq_matches_equal_slices() {
        assert!(constant_time_eq(b"secret-token", b"secret-token"));
    }

    #[test]
    fn bearer_token_strips_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn bearer_token_rejects_missing_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
