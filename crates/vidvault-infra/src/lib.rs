//! Vidvault Infrastructure Library
//!
//! Shared plumbing for the HTTP service:
//! - Middleware (request ID, security headers)
//! - Tracing subscriber initialization
//! - The JSON error body returned by every failing endpoint

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod error;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{
    request_id_middleware, security_headers_middleware, RequestId,
};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat};

pub use error::ErrorResponse;
