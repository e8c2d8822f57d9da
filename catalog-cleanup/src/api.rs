use crate::config::Config;
use crate::errors::CleanupError;
use crate::metrics_defs::REQUEST_DURATION;
use crate::reconciler::{GroupReconciler, ReconcileOptions, ReconcileSummary, SourceItem};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use shared::histogram;
use shared::http::health;
use std::sync::Arc;
use std::time::Instant;

const DRY_RUN_NOTE: &str = "Dry run - no writes performed";
const COMMITTED_NOTE: &str = "Committed";

#[derive(Clone)]
pub struct CleanupService {
    reconciler: GroupReconciler,
    target_group_name: String,
    dry_run_default: bool,
}

impl CleanupService {
    pub fn new(reconciler: GroupReconciler, config: &Config) -> Self {
        CleanupService {
            reconciler,
            target_group_name: config.target_group_name.trim().to_string(),
            dry_run_default: config.dry_run_default,
        }
    }
}

pub fn router(service: CleanupService) -> Router {
    Router::new()
        .route("/", post(handler).fallback(method_not_allowed))
        .route("/health", get(health))
        .with_state(Arc::new(service))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CleanupRequest {
    #[serde(default)]
    items: serde_json::Value,
    #[serde(default)]
    dry_run: Option<bool>,
    #[serde(default)]
    target_group_name: Option<String>,
}

impl CleanupRequest {
    fn parse(body: &[u8]) -> Result<Self, CleanupError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(CleanupRequest::default());
        }
        serde_json::from_slice(body).map_err(|e| CleanupError::InvalidBody(e.to_string()))
    }

    fn take_items(&mut self) -> Result<Vec<SourceItem>, CleanupError> {
        match self.items.take() {
            serde_json::Value::Array(items) if !items.is_empty() => {
                Ok(items.iter().map(SourceItem::from_row).collect())
            }
            _ => Err(CleanupError::MissingItems),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanupResponse {
    dry_run: bool,
    target_group: String,
    received_items: usize,
    processed_items: usize,
    actually_moved: usize,
    groups_checked: usize,
    groups_deleted: usize,
    note: &'static str,
}

impl CleanupResponse {
    fn new(options: ReconcileOptions, summary: ReconcileSummary) -> Self {
        CleanupResponse {
            dry_run: options.dry_run,
            target_group: options.target_group_name,
            received_items: summary.received_items,
            processed_items: summary.processed_items,
            actually_moved: summary.actually_moved,
            groups_checked: summary.groups_checked,
            groups_deleted: summary.groups_deleted,
            note: if options.dry_run {
                DRY_RUN_NOTE
            } else {
                COMMITTED_NOTE
            },
        }
    }
}

impl IntoResponse for CleanupResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

async fn handler(
    State(service): State<Arc<CleanupService>>,
    body: Bytes,
) -> Result<CleanupResponse, CleanupError> {
    let started = Instant::now();

    let mut request = CleanupRequest::parse(&body)?;
    let items = request.take_items()?;

    let target_group_name = request
        .target_group_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(&service.target_group_name)
        .to_string();
    let options = ReconcileOptions {
        target_group_name,
        dry_run: request.dry_run.unwrap_or(service.dry_run_default),
    };

    tracing::info!(
        items = items.len(),
        dry_run = options.dry_run,
        target_group = %options.target_group_name,
        "Catalog cleanup requested"
    );

    let result = service.reconciler.reconcile(&items, &options).await;

    let status = if result.is_ok() { "ok" } else { "error" };
    histogram!(
        REQUEST_DURATION,
        "status" => status,
        "dry_run" => options.dry_run.to_string()
    )
    .record(started.elapsed().as_secs_f64());

    Ok(CleanupResponse::new(options, result?))
}

async fn method_not_allowed() -> CleanupError {
    CleanupError::MethodNotAllowed
}
