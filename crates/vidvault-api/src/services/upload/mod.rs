//! Video upload pipeline
//!
//! authenticate → authorize → stage → probe → rewrite → key + upload → update record

mod config;
mod orchestrator;
mod staging;

pub use config::UploadConfig;
pub use orchestrator::{UploadOrchestrator, UploadStage};
pub use staging::{content_type_essence, StagedUpload, STAGING_PREFIX};
