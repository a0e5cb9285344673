//! Signal acquisition: per-source gatherers, ticker extraction/validation,
//! and cache aggregation (spec §4.2).

pub mod sources;
pub mod ticker;

pub use sources::{gather_all, RawItem, SignalSource};
