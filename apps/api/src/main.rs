//! Kasboek dashboard API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod state;

use kasboek_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::api_router::build_router;
use crate::api_services::build_app_runtime;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let runtime = build_app_runtime(&config).await?;
    let app = build_router(runtime.state, &config.frontend_url)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "kasboek-api listening");

    let served = axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")));

    for task in runtime.background_tasks {
        task.abort();
    }

    served
}
