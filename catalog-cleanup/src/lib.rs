pub mod api;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod metrics_defs;
pub mod migration;
pub mod naming;
pub mod reconciler;

#[cfg(test)]
mod testutils;

use crate::api::CleanupService;
use crate::catalog::client::HttpCatalog;
use crate::errors::CleanupError;
use crate::reconciler::GroupReconciler;
use shared::http::run_http_service;
use std::sync::Arc;

pub async fn run(config: config::Config) -> Result<(), CleanupError> {
    let catalog = HttpCatalog::new(&config.catalog, config.retry.policy())?;
    let reconciler = GroupReconciler::new(
        Arc::new(catalog),
        config.catalog.page_size,
        config.batch_size,
    );

    tracing::info!(
        catalog = %config.catalog.base_url,
        target_group = %config.target_group_name,
        dry_run_default = config.dry_run_default,
        "Starting catalog cleanup service"
    );

    let app = api::router(CleanupService::new(reconciler, &config));
    run_http_service(&config.listener.host, config.listener.port, app).await?;
    Ok(())
}
