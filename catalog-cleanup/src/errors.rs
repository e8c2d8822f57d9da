use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::http::make_error_response;
use shared::retry::RetryError;

/// Errors from talking to the catalog service
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("catalog call {path} failed: {source}")]
    Upstream {
        path: &'static str,
        #[source]
        source: RetryError,
    },

    #[error("malformed response from catalog call {path}: {source}")]
    MalformedResponse {
        path: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid catalog configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl CatalogError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CatalogError::Upstream { source, .. } => source.status(),
            _ => None,
        }
    }

    /// What to echo back to the caller: the upstream error body when it is JSON,
    /// otherwise the upstream text or this error's message.
    pub fn upstream_payload(&self) -> serde_json::Value {
        let body = match self {
            CatalogError::Upstream { source, .. } => source.body(),
            _ => None,
        };

        match body.map(str::trim).filter(|b| !b.is_empty()) {
            Some(text) => serde_json::from_str(text)
                .unwrap_or_else(|_| serde_json::Value::String(text.to_string())),
            None => serde_json::Value::String(self.to_string()),
        }
    }
}

/// Request-level errors of the cleanup endpoint
#[derive(thiserror::Error, Debug)]
pub enum CleanupError {
    #[error("Body must include {{ items: [ ... ] }}")]
    MissingItems,

    #[error("Use POST")]
    MethodNotAllowed,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for CleanupError {
    fn into_response(self) -> Response {
        match self {
            CleanupError::MissingItems | CleanupError::InvalidBody(_) => {
                make_error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            CleanupError::MethodNotAllowed => {
                make_error_response(StatusCode::METHOD_NOT_ALLOWED, self.to_string())
            }
            CleanupError::Catalog(e) => {
                tracing::error!(error = %e, "Catalog cleanup failed");
                make_error_response(StatusCode::INTERNAL_SERVER_ERROR, e.upstream_payload())
            }
            CleanupError::Io(e) => {
                make_error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upstream(status: StatusCode, body: &str) -> CatalogError {
        CatalogError::Upstream {
            path: "/api/reference-book/item-groups/delete",
            source: RetryError::Status {
                status,
                body: body.to_string(),
            },
        }
    }

    #[test]
    fn test_upstream_payload_json_body() {
        let err = upstream(StatusCode::BAD_REQUEST, r#"{"message": "Group has items"}"#);
        assert_eq!(err.upstream_payload(), json!({"message": "Group has items"}));
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_upstream_payload_text_body() {
        let err = upstream(StatusCode::BAD_GATEWAY, "bad gateway");
        assert_eq!(err.upstream_payload(), json!("bad gateway"));
    }

    #[test]
    fn test_upstream_payload_falls_back_to_message() {
        let err = upstream(StatusCode::FORBIDDEN, "  ");
        let payload = err.upstream_payload();
        assert!(payload.as_str().unwrap().contains("403"));

        let err = CatalogError::InvalidConfig("empty api key".into());
        assert_eq!(
            err.upstream_payload(),
            json!("invalid catalog configuration: empty api key")
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CleanupError::MissingItems.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CleanupError::MethodNotAllowed.into_response().status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            CleanupError::from(upstream(StatusCode::NOT_FOUND, ""))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
