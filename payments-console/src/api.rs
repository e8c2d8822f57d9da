use crate::board::BoardClient;
use crate::config::{Config, MetaConfig, MondayConfig};
use crate::errors::ConsoleError;
use crate::metrics_defs::CONSOLE_ACTIONS;
use crate::token::{decode_link, is_truthy, value_as_number, value_as_text};
use crate::webhook::{WebhookClient, WebhookPayload};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::map_response;
use axum::response::Json;
use axum::routing::{get, post};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use shared::counter;
use shared::http::{allow_any_origin, health};
use std::sync::Arc;

#[derive(Clone)]
pub struct ConsoleService {
    board: BoardClient,
    webhook: WebhookClient,
    monday: MondayConfig,
    meta: MetaConfig,
}

impl ConsoleService {
    pub fn new(config: &Config, api_token: Option<String>) -> Result<Self, ConsoleError> {
        Ok(ConsoleService {
            board: BoardClient::new(&config.monday, api_token)?,
            webhook: WebhookClient::new(&config.webhook)?,
            monday: config.monday.clone(),
            meta: config.meta.clone(),
        })
    }
}

pub fn router(service: ConsoleService) -> Router {
    Router::new()
        .route(
            "/",
            post(handler)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route("/health", get(health))
        .layer(map_response(allow_any_origin))
        .with_state(Arc::new(service))
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Action {
    Decode,
    UpdateAdvance,
    SendWebhook,
}

impl Action {
    fn parse(value: &Value) -> Result<Self, ConsoleError> {
        if !is_truthy(value) {
            return Err(ConsoleError::MissingAction);
        }
        match value.as_str() {
            Some("decode") => Ok(Action::Decode),
            Some("updateAdvance") => Ok(Action::UpdateAdvance),
            Some("sendWebhook") => Ok(Action::SendWebhook),
            _ => Err(ConsoleError::UnknownAction),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Action::Decode => "decode",
            Action::UpdateAdvance => "updateAdvance",
            Action::SendWebhook => "sendWebhook",
        }
    }
}

/// Fields are kept loosely typed; each action validates what it needs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConsoleRequest {
    #[serde(default)]
    action: Value,
    #[serde(default)]
    link: Value,
    #[serde(default)]
    single_project_item_id: Value,
    #[serde(default)]
    amount: Value,
    #[serde(default)]
    advance_override: Value,
}

impl ConsoleRequest {
    fn parse(body: &[u8]) -> Result<Self, ConsoleError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ConsoleRequest::default());
        }
        serde_json::from_slice(body).map_err(|e| ConsoleError::InvalidBody(e.to_string()))
    }

    fn link(&self) -> Result<&str, ConsoleError> {
        self.link
            .as_str()
            .filter(|link| !link.is_empty())
            .ok_or(ConsoleError::MissingField("link"))
    }

    fn item_id(&self) -> Option<String> {
        value_as_text(&self.single_project_item_id)
    }
}

async fn handler(
    State(service): State<Arc<ConsoleService>>,
    body: Bytes,
) -> Result<Json<Value>, ConsoleError> {
    let request = ConsoleRequest::parse(&body)?;
    let action = Action::parse(&request.action)?;

    let result = match action {
        Action::Decode => decode(&request),
        Action::UpdateAdvance => update_advance(&service, &request).await,
        Action::SendWebhook => send_webhook(&service, &request).await,
    };

    let outcome = if result.is_ok() { "ok" } else { "error" };
    counter!(CONSOLE_ACTIONS, "action" => action.as_str(), "outcome" => outcome).increment(1);

    result.map(Json)
}

fn decode(request: &ConsoleRequest) -> Result<Value, ConsoleError> {
    let decoded = decode_link(request.link()?)?;
    Ok(json!({ "extracted": decoded.extracted }))
}

async fn update_advance(
    service: &ConsoleService,
    request: &ConsoleRequest,
) -> Result<Value, ConsoleError> {
    let item_id = request
        .item_id()
        .ok_or(ConsoleError::MissingField("singleProjectItemId"))?;
    if request.amount.is_null() {
        return Err(ConsoleError::MissingField("amount"));
    }
    let amount = value_as_number(&request.amount).ok_or(ConsoleError::InvalidAmount)?;

    service.board.update_advance_amount(&item_id, amount).await?;
    Ok(json!({ "updated": true }))
}

async fn send_webhook(
    service: &ConsoleService,
    request: &ConsoleRequest,
) -> Result<Value, ConsoleError> {
    let link = request.link()?;

    let item_id = request
        .item_id()
        .or_else(|| {
            decode_link(link)
                .ok()
                .and_then(|decoded| decoded.single_project_item_id())
        })
        .ok_or(ConsoleError::MissingField("singleProjectItemId"))?;

    let decoded = decode_link(link)?;
    let payload = WebhookPayload::resend_link(
        link,
        decoded,
        item_id,
        request.advance_override.as_f64(),
        &service.monday,
        &service.meta,
        Utc::now(),
    );

    service.webhook.send(&payload).await?;
    Ok(json!({ "sent": true }))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> ConsoleError {
    ConsoleError::MethodNotAllowed
}
