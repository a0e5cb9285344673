//! The DEX momentum paper-trading engine (spec §4.3) — the largest
//! subsystem, grounded in the teacher's
//! `application/risk_management/{circuit_breaker_service,trailing_stops,sizing_engine}.rs`
//! state-machine style.

pub mod engine;
pub mod entry;
pub mod exits;
pub mod metrics;
pub mod sizing;

pub use engine::{liquidate_all, scan_and_trade, DexTickOutcome};
