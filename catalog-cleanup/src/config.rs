use serde::Deserialize;
use shared::retry::RetryPolicy;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Catalog API key is empty")]
    EmptyApiKey,

    #[error("Target group name is empty")]
    EmptyTargetGroup,

    #[error("{0} must be greater than 0")]
    ZeroValue(&'static str),
}

/// Catalog cleanup service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Group that migrated items end up in, unless the request names another one
    #[serde(default = "default_target_group_name")]
    pub target_group_name: String,
    /// Applied when a request does not say whether it is a dry run
    #[serde(default = "default_dry_run")]
    pub dry_run_default: bool,
    /// Number of items whose updates are in flight at the same time
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;

        if self.catalog.api_key.trim().is_empty() {
            return Err(ValidationError::EmptyApiKey);
        }
        if self.target_group_name.trim().is_empty() {
            return Err(ValidationError::EmptyTargetGroup);
        }
        if self.batch_size == 0 {
            return Err(ValidationError::ZeroValue("batch_size"));
        }
        if self.catalog.page_size == 0 {
            return Err(ValidationError::ZeroValue("catalog.page_size"));
        }
        if self.catalog.timeout_secs == 0 {
            return Err(ValidationError::ZeroValue("catalog.timeout_secs"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ValidationError::ZeroValue("retry.max_attempts"));
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
            port: 3000,
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
pub struct CatalogConfig {
    pub base_url: Url,
    pub api_key: String,
    /// Sent as `X-Company-Id` when set
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Rows requested per page from list endpoints
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// The n-th retry waits `n * backoff_step_ms`
    pub backoff_step_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: 3,
            backoff_step_ms: 1500,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::linear(
            self.max_attempts,
            Duration::from_millis(self.backoff_step_ms),
        )
    }
}

fn default_target_group_name() -> String {
    "xxx_pvz grupė".into()
}

fn default_dry_run() -> bool {
    true
}

fn default_batch_size() -> usize {
    200
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_page_size() -> u32 {
    500
}
