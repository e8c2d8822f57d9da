use crate::token::DecodeError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::http::make_error_response;

#[derive(thiserror::Error, Debug)]
pub enum ConsoleError {
    #[error("Missing 'action'.")]
    MissingAction,

    #[error("Unknown action.")]
    UnknownAction,

    #[error("Missing '{0}'.")]
    MissingField(&'static str),

    #[error("Invalid amount.")]
    InvalidAmount,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("MONDAY_API_TOKEN is not set.")]
    MissingApiToken,

    #[error("Monday API error: {0}")]
    Board(String),

    #[error("webhook error: {status} {body}")]
    Webhook { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = match self {
            ConsoleError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ConsoleError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };

        if status != StatusCode::METHOD_NOT_ALLOWED {
            tracing::warn!(error = %self, "Console request failed");
        }

        make_error_response(status, self.to_string())
    }
}
