//! Fault-injecting upstream service.
//!
//! # Data Flow
//! ```text
//! GET /work
//!     → injector.rs (draw base + random extra delay, fail or not)
//!     → server.rs (sleep, record stats, 500 or WorkResponse)
//! ```
//!
//! # Design Decisions
//! - Failures are plain 500s with a text body, like an unhandled crash
//! - Latency is recorded for failed calls too

pub mod injector;
pub mod server;

pub use injector::{FaultInjector, FaultPlan};
pub use server::{UpstreamServer, UpstreamState, WorkResponse};
