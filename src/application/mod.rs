//! Application layer: the tick actor and its subsystems (spec §4).

pub mod actor;
pub mod crisis;
pub mod dex;
pub mod llm;
pub mod signals;
pub mod trader;
