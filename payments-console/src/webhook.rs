use crate::board::round_cents;
use crate::config::{MetaConfig, MondayConfig, WebhookConfig};
use crate::errors::ConsoleError;
use crate::token::{DecodedLink, Extracted};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const RESEND_EVENT: &str = "resend_payment_link";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub event: &'static str,
    pub sent_at: String,
    pub link: String,
    pub extracted: Extracted,
    pub raw_payload: Value,
    pub overrides: Overrides,
    pub monday: BoardReference,
    pub meta: Meta,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overrides {
    pub advance_amount: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardReference {
    pub board_id: u64,
    pub single_project_item_id: String,
    pub columns: ColumnReference,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnReference {
    pub lead_id: String,
    pub advance_link: String,
    pub final_link: String,
    pub advance_amount: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub ui_version: String,
    pub source: String,
}

impl WebhookPayload {
    pub fn resend_link(
        link: &str,
        decoded: DecodedLink,
        item_id: String,
        advance_override: Option<f64>,
        monday: &MondayConfig,
        meta: &MetaConfig,
        sent_at: DateTime<Utc>,
    ) -> Self {
        WebhookPayload {
            event: RESEND_EVENT,
            sent_at: sent_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            link: link.to_string(),
            extracted: decoded.extracted,
            raw_payload: decoded.payload,
            overrides: Overrides {
                advance_amount: advance_override
                    .filter(|a| a.is_finite())
                    .map(round_cents),
            },
            monday: BoardReference {
                board_id: monday.board_id,
                single_project_item_id: item_id,
                columns: ColumnReference {
                    lead_id: monday.columns.lead_id.clone(),
                    advance_link: monday.columns.advance_link.clone(),
                    final_link: monday.columns.final_link.clone(),
                    advance_amount: monday.columns.advance_amount.clone(),
                },
            },
            meta: Meta {
                ui_version: meta.ui_version.clone(),
                source: meta.source.clone(),
            },
        }
    }
}

#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    url: String,
}

impl WebhookClient {
    pub fn new(config: &WebhookConfig) -> Result<Self, ConsoleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(WebhookClient {
            client,
            url: config.url.to_string(),
        })
    }

    pub async fn send(&self, payload: &WebhookPayload) -> Result<(), ConsoleError> {
        let response = self.client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConsoleError::Webhook {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            item_id = %payload.monday.single_project_item_id,
            "Payment link sent to webhook"
        );
        Ok(())
    }
}
