pub mod crisis;
pub mod dex;
pub mod errors;
pub mod ports;
pub mod position;
pub mod signal;
pub mod state;
pub mod trading;
