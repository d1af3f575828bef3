//! Open-loop load generator for the front-end service.
//!
//! Requests are fired at a fixed rate regardless of how fast replies come
//! back, so a slow or failing dependency shows up as latency and breaker
//! states in the summary instead of a lower request rate.

pub mod runner;
pub mod summary;

pub use runner::{fire_once, parse_reply, run_load, tick_period, LoadError, LoadOutcome};
pub use summary::{LatencySummary, LoadSummary};
