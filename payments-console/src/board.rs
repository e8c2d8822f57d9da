//! Monday board access over its GraphQL API.

use crate::config::{BoardColumns, MondayConfig};
use crate::errors::ConsoleError;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;

const UPDATE_COLUMNS_MUTATION: &str = concat!(
    "mutation Update($boardId: ID!, $itemId: ID!, $cols: JSON!) { ",
    "change_multiple_column_values(",
    "board_id: $boardId, item_id: $itemId, column_values: $cols",
    ") { id } }",
);

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Default, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Value,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}

/// Rounds to two decimals, halves rounding up.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0 + 0.5).floor() / 100.0
}

#[derive(Clone)]
pub struct BoardClient {
    client: reqwest::Client,
    api_url: String,
    api_token: Option<String>,
    board_id: u64,
    columns: BoardColumns,
}

impl BoardClient {
    pub fn new(config: &MondayConfig, api_token: Option<String>) -> Result<Self, ConsoleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(BoardClient {
            client,
            api_url: config.api_url.clone(),
            api_token,
            board_id: config.board_id,
            columns: config.columns.clone(),
        })
    }

    async fn graphql(&self, query: &str, variables: Value) -> Result<Value, ConsoleError> {
        let token = self
            .api_token
            .as_deref()
            .ok_or(ConsoleError::MissingApiToken)?;

        let response = self
            .client
            .post(&self.api_url)
            .header(AUTHORIZATION, token)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let parsed: GraphQlResponse = serde_json::from_str(&text).unwrap_or_default();

        if !status.is_success() || !parsed.errors.is_empty() {
            let messages: Vec<&str> = parsed
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .filter(|m| !m.is_empty())
                .collect();
            let message = if messages.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or(status.as_str())
                    .to_string()
            } else {
                messages.join("; ")
            };
            return Err(ConsoleError::Board(message));
        }

        Ok(parsed.data)
    }

    /// Writes several columns of one item in a single mutation.
    pub async fn update_columns(
        &self,
        item_id: &str,
        values: Map<String, Value>,
    ) -> Result<(), ConsoleError> {
        let variables = json!({
            "boardId": self.board_id.to_string(),
            "itemId": item_id,
            "cols": Value::Object(values).to_string(),
        });

        self.graphql(UPDATE_COLUMNS_MUTATION, variables).await?;
        Ok(())
    }

    /// Sets the advance amount column, rounded to cents. Returns the amount written.
    pub async fn update_advance_amount(
        &self,
        item_id: &str,
        amount: f64,
    ) -> Result<f64, ConsoleError> {
        let rounded = round_cents(amount);
        if !rounded.is_finite() {
            return Err(ConsoleError::InvalidAmount);
        }

        let mut values = Map::new();
        values.insert(self.columns.advance_amount.clone(), json!(rounded));
        self.update_columns(item_id, values).await?;

        tracing::info!(item_id, amount = rounded, "Advance amount updated");
        Ok(rounded)
    }
}
