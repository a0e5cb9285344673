use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by the equity/crypto trader when a buy or sell is refused.
#[derive(Debug, Error)]
pub enum TradingError {
    #[error("insufficient cash: need ${need}, available ${available}")]
    InsufficientCash { need: Decimal, available: Decimal },

    #[error("position not found: {symbol}")]
    PositionNotFound { symbol: String },

    #[error("invalid order for {symbol}: {reason}")]
    InvalidOrder { symbol: String, reason: String },

    #[error("order execution failed for {symbol}: {reason}")]
    ExecutionFailed { symbol: String, reason: String },

    #[error("sell blocked by PDT guard: {daytrade_count} day trades, equity ${equity} < $25,000")]
    PdtBlocked {
        daytrade_count: u32,
        equity: Decimal,
    },

    #[error("exchange {exchange} not in allowed_exchanges")]
    DisallowedExchange { exchange: String },
}

/// Errors from the DEX paper-trading engine.
#[derive(Debug, Error)]
pub enum DexError {
    #[error("token {address} already held")]
    AlreadyHeld { address: String },

    #[error("circuit breaker active until {until}")]
    CircuitBreakerActive { until: chrono::DateTime<chrono::Utc> },

    #[error("drawdown pause active")]
    DrawdownPaused,

    #[error("stop-loss cooldown active for {address}")]
    CooldownActive { address: String },

    #[error("tier {tier} at max concurrent positions")]
    TierFull { tier: String },

    #[error("reduced size below minimum viable ({min} SOL): {reduced} SOL")]
    BelowMinViable { reduced: Decimal, min: Decimal },

    #[error("position not found: {address}")]
    PositionNotFound { address: String },
}

/// Errors fetching or parsing crisis indicators. All sources degrade to
/// `None` on failure (spec §6 "all failures -> null"); this type exists for
/// logging context, not for control flow.
#[derive(Debug, Error)]
pub enum CrisisDataError {
    #[error("indicator source {source} unreachable: {reason}")]
    Unreachable { source: String, reason: String },

    #[error("indicator source {source} returned unparsable data")]
    Unparsable { source: String },
}

/// Errors from the LLM research client.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("response was not valid JSON: {reason}")]
    ParseFailed { reason: String },

    #[error("model {model} not in cost table")]
    UnknownModel { model: String },
}

/// Errors from the DEX/price/chart data providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// Errors from the durable state store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read state: {reason}")]
    ReadFailed { reason: String },

    #[error("failed to write state: {reason}")]
    WriteFailed { reason: String },

    #[error("stored state is corrupt: {reason}")]
    Corrupt { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdt_blocked_formats_equity() {
        let err = TradingError::PdtBlocked {
            daytrade_count: 3,
            equity: Decimal::new(2400000, 2),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 day trades"));
        assert!(msg.contains("24000.00"));
    }

    #[test]
    fn dex_error_display_is_stable() {
        let err = DexError::TierFull {
            tier: "microspray".to_string(),
        };
        assert_eq!(err.to_string(), "tier microspray at max concurrent positions");
    }
}
