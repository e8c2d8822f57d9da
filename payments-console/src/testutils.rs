use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Clone, Debug)]
pub struct ReceivedRequest {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Default)]
struct ServerState {
    requests: Mutex<Vec<ReceivedRequest>>,
    responses: Mutex<VecDeque<(u16, String)>>,
    delay: Mutex<Duration>,
}

/// Local HTTP endpoint standing in for the board API or the webhook. Every request is
/// recorded; scripted responses are served in order, then `200 {}`.
pub struct MockEndpoint {
    port: u16,
    state: Arc<ServerState>,
}

impl MockEndpoint {
    pub async fn spawn() -> Self {
        let state = Arc::new(ServerState::default());
        let app = Router::new().fallback(receive).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockEndpoint { port, state }
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}/hook", self.port)
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.state
            .responses
            .lock()
            .unwrap()
            .push_back((status, body.to_string()));
    }

    /// Holds every later response back for `delay`.
    pub fn delay_responses(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = delay;
    }

    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn receive(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    state.requests.lock().unwrap().push(ReceivedRequest {
        authorization: header("authorization"),
        content_type: header("content-type"),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    });

    let (status, body) = state
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((200, "{}".to_string()));

    let delay = *state.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    (StatusCode::from_u16(status).unwrap(), body).into_response()
}
