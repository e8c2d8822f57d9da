pub mod api;
pub mod board;
pub mod config;
pub mod errors;
pub mod metrics_defs;
pub mod token;
pub mod webhook;

#[cfg(test)]
mod testutils;

use crate::api::ConsoleService;
use crate::errors::ConsoleError;
use shared::http::run_http_service;

pub async fn run(config: config::Config) -> Result<(), ConsoleError> {
    let api_token = config.monday.resolve_api_token();
    if api_token.is_none() {
        tracing::warn!(
            "No board API token configured and {} is unset; board updates will fail",
            config::API_TOKEN_ENV
        );
    }

    tracing::info!(
        board_id = config.monday.board_id,
        webhook = %config.webhook.url,
        "Starting payments console"
    );

    let app = api::router(ConsoleService::new(&config, api_token)?);
    run_http_service(&config.listener.host, config.listener.port, app).await?;
    Ok(())
}
