//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!
//! Request handlers additionally feed:
//!     → stats.rs (counters + latency samples → mean / p95 snapshot)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → /metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
pub mod stats;
