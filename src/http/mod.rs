//! HTTP protocol handling for the front-end service.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → server.rs handlers (/process → ResilientClient::fetch)
//!     → response.rs (ProcessResponse, Prometheus text)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use response::{HealthResponse, ProcessResponse};
pub use server::{AppState, HttpServer};
