//! Concrete adapters for every [`domain::ports`](crate::domain::ports) trait
//! (spec §6): HTTP-backed collaborators, SQLite persistence, and in-memory
//! mocks for tests.

pub mod alarm;
pub mod broker_http;
pub mod core;
pub mod crisis_sources;
pub mod dex_http;
pub mod llm_http;
pub mod notify;
pub mod persistence;
pub mod mock;
pub mod signal_sources;
pub mod twitter_http;
