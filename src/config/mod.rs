//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: SERVICE_B_URL, MAX_RETRIES, ...)
//!     → validation.rs (semantic checks)
//!     → FrontendConfig / UpstreamServiceConfig (validated, immutable)
//!     → used once at startup to build the client, breaker and routers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_frontend_config, load_upstream_config, ConfigError};
pub use schema::{
    BreakerConfig, FaultConfig, FrontendConfig, ListenerConfig, ObservabilityConfig,
    TimeoutConfig, UpstreamConfig, UpstreamServiceConfig,
};
pub use validation::ValidationError;
