//! Vidvault API Library
//!
//! HTTP handlers, the upload orchestrator and application setup. The binary in `main.rs` is a
//! thin wrapper around [`setup::initialize_app`].

pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod services;
pub mod setup;
pub mod state;

// Re-exports
pub use error::HttpAppError;
pub use services::upload::{UploadConfig, UploadOrchestrator, UploadStage};
pub use state::AppState;
pub use vidvault_infra::ErrorResponse;
