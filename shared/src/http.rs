use axum::Router;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tokio::net::TcpListener;

pub async fn run_http_service(host: &str, port: u16, app: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening");
    axum::serve(listener, app).await
}

#[derive(Serialize)]
struct ErrorBody {
    error: serde_json::Value,
}

/// JSON error response of the form `{"error": ...}`.
pub fn make_error_response(status: StatusCode, error: impl Into<serde_json::Value>) -> Response {
    let body = ErrorBody {
        error: error.into(),
    };
    (status, Json(body)).into_response()
}

/// Response middleware allowing any origin to call the service from a browser.
/// Install with `axum::middleware::map_response(allow_any_origin)`.
pub async fn allow_any_origin(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}

/// Liveness probe handler.
pub async fn health() -> &'static str {
    "ok\n"
}
