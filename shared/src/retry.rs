//! Retry policy for outbound calls to third-party APIs.
//!
//! Only responses whose status is in the retryable set are retried. Transport errors
//! (connection refused, client timeout) are surfaced on the first occurrence.

use crate::metrics_defs::{UPSTREAM_REQUESTS, UPSTREAM_RETRIES};
use reqwest::{Response, StatusCode};
use std::future::Future;
use tokio::time::{Duration, sleep};

pub const RETRIABLE_STATUS_CODES: &[StatusCode] = &[
    StatusCode::TOO_MANY_REQUESTS,     // 429
    StatusCode::INTERNAL_SERVER_ERROR, // 500
    StatusCode::BAD_GATEWAY,           // 502
    StatusCode::SERVICE_UNAVAILABLE,   // 503
    StatusCode::GATEWAY_TIMEOUT,       // 504
];

#[derive(thiserror::Error, Debug)]
pub enum RetryError {
    #[error("upstream returned {status} after {attempts} attempts")]
    Exhausted {
        attempts: u32,
        status: StatusCode,
        body: String,
    },
    #[error("upstream returned {status}")]
    Status { status: StatusCode, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl RetryError {
    /// Status of the last upstream response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RetryError::Exhausted { status, .. } | RetryError::Status { status, .. } => {
                Some(*status)
            }
            RetryError::Transport(e) => e.status(),
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            RetryError::Exhausted { body, .. } | RetryError::Status { body, .. } => Some(body),
            RetryError::Transport(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    retryable: Vec<StatusCode>,
    max_attempts: u32,
    backoff_step: Duration,
}

impl RetryPolicy {
    fn new(retryable: &[StatusCode], max_attempts: u32, backoff_step: Duration) -> Self {
        RetryPolicy {
            retryable: retryable.to_vec(),
            max_attempts: max_attempts.max(1),
            backoff_step,
        }
    }

    /// Retries 429/500/502/503/504 with linearly increasing delay.
    pub fn linear(max_attempts: u32, step: Duration) -> Self {
        Self::new(RETRIABLE_STATUS_CODES, max_attempts, step)
    }

    /// `step * n` after the n-th failed attempt.
    pub fn delay(&self, failed_attempts: u32) -> Duration {
        self.backoff_step * failed_attempts.max(1)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_retryable(&self, status: StatusCode) -> bool {
        self.retryable.contains(&status)
    }

    /// Runs `operation` until it yields a successful response, a non-retryable status,
    /// or the attempt budget is spent. Non-success responses are returned as errors
    /// carrying the upstream body.
    pub async fn send<F, Fut>(&self, mut operation: F) -> Result<Response, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Response, reqwest::Error>>,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;
            crate::counter!(UPSTREAM_REQUESTS).increment(1);

            let response = operation().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            if !self.is_retryable(status) {
                let body = response.text().await.unwrap_or_default();
                return Err(RetryError::Status { status, body });
            }

            if attempts >= self.max_attempts {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(%status, attempts, "Upstream retries exhausted");
                return Err(RetryError::Exhausted {
                    attempts,
                    status,
                    body,
                });
            }

            let delay = self.delay(attempts);
            tracing::debug!(
                %status,
                attempts,
                delay_ms = delay.as_millis() as u64,
                "Retrying upstream call"
            );
            crate::counter!(UPSTREAM_RETRIES).increment(1);
            sleep(delay).await;
        }
    }
}
