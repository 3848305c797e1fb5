//! Logistics domain actions

mod advance;
mod history;

pub use advance::{advance_logistics, AdvanceOutcome};
pub use history::{collect_logistics_history, logistics_history};
