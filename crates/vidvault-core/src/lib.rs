//! Vidvault Core Library
//!
//! Domain models, error types, configuration and the authentication seam shared by
//! every vidvault crate.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use auth::Authenticator;
pub use config::{BaseConfig, Config, VideoServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{AspectClassification, StorageReference, VideoRecord};
pub use storage_types::{ReferenceMode, StorageBackend};
