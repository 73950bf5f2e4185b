//! Application setup and initialization
//!
//! Everything `main.rs` needs to turn a [`Config`] into a running router, kept here so the
//! steps can be exercised on their own.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use vidvault_core::Config;
use vidvault_infra::LogFormat;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    let log_format = config
        .log_format()
        .parse::<LogFormat>()
        .map_err(|e| anyhow::anyhow!(e))?;
    vidvault_infra::init_telemetry(log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    // Setup database
    let pool = database::setup_database(&config).await?;

    // Setup storage
    let storage = storage::setup_storage(&config).await?;

    // Initialize all services and repositories
    let state = services::initialize_services(&config, pool, storage)?;

    // Setup routes
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
