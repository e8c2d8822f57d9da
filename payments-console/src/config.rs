use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const API_TOKEN_ENV: &str = "MONDAY_API_TOKEN";

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Invalid API URL {0:?}")]
    InvalidApiUrl(String),

    #[error("Board id cannot be 0")]
    InvalidBoardId,

    #[error("Column id for {0} is empty")]
    EmptyColumn(&'static str),

    #[error("{0} must be greater than 0")]
    ZeroValue(&'static str),
}

/// Payments console service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    pub monday: MondayConfig,
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub meta: MetaConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.monday.validate()?;

        if self.webhook.timeout_secs == 0 {
            return Err(ValidationError::ZeroValue("webhook.timeout_secs"));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3001,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MondayConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Falls back to the `MONDAY_API_TOKEN` environment variable
    #[serde(default)]
    pub api_token: Option<String>,
    pub board_id: u64,
    pub columns: BoardColumns,
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

impl MondayConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if Url::parse(&self.api_url).is_err() {
            return Err(ValidationError::InvalidApiUrl(self.api_url.clone()));
        }
        if self.board_id == 0 {
            return Err(ValidationError::InvalidBoardId);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::ZeroValue("monday.timeout_secs"));
        }

        let columns = [
            ("advance_link", &self.columns.advance_link),
            ("final_link", &self.columns.final_link),
            ("lead_id", &self.columns.lead_id),
            ("advance_amount", &self.columns.advance_amount),
        ];
        for (name, id) in columns {
            if id.trim().is_empty() {
                return Err(ValidationError::EmptyColumn(name));
            }
        }

        Ok(())
    }

    /// The configured token, or the environment's when none is configured.
    pub fn resolve_api_token(&self) -> Option<String> {
        self.api_token
            .clone()
            .or_else(|| std::env::var(API_TOKEN_ENV).ok())
            .filter(|token| !token.trim().is_empty())
    }
}

/// Column ids on the single project board
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BoardColumns {
    pub advance_link: String,
    pub final_link: String,
    pub lead_id: String,
    pub advance_amount: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WebhookConfig {
    pub url: Url,
    #[serde(default = "default_webhook_timeout_secs")]
    pub timeout_secs: u64,
}

/// Identifies this console in outgoing webhook payloads
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetaConfig {
    #[serde(default = "default_ui_version")]
    pub ui_version: String,
    #[serde(default = "default_source")]
    pub source: String,
}

impl Default for MetaConfig {
    fn default() -> Self {
        MetaConfig {
            ui_version: default_ui_version(),
            source: default_source(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.monday.com/v2".into()
}

fn default_api_timeout_secs() -> u64 {
    30
}

fn default_webhook_timeout_secs() -> u64 {
    30
}

fn default_ui_version() -> String {
    "1.3.0".into()
}

fn default_source() -> String {
    "switchboard-payments-console".into()
}
