//! Outer surfaces the agent is driven through. The only member today is the
//! admin HTTP API (spec §6); the teacher's egui dashboard has no counterpart
//! here (spec Non-goals exclude a UI).

pub mod admin;
