//! Test utilities for penny-core
//!
//! Provides a mock text-generation server speaking the hosted inference API
//! (`POST /models/{model}` with a bearer token). Each server instance answers
//! every request the same way, selected by `MockResponse`.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// Bearer token the mock server accepts
pub const MOCK_TOKEN: &str = "hf_test";

/// How the mock server answers
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// `[{"generated_text": ...}]`
    Array(String),
    /// `{"generated_text": ...}`
    Object(String),
    /// A bare JSON string
    RawString(String),
    /// 200 with a body that contains no JSON
    Garbage,
    /// 200 with a provider JSON body that carries no generated text
    Envelope(Value),
    /// HTTP 500
    ServerError,
    /// `Array` reply after a delay
    Slow(Duration, String),
}

struct ServerState {
    response: MockResponse,
    requests: Mutex<Vec<Value>>,
}

/// Mock inference server for tests
pub struct MockInferenceServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockInferenceServer {
    /// Start the mock server on an available port
    pub async fn start(response: MockResponse) -> Self {
        let state = Arc::new(ServerState {
            response,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/models/*model", post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request bodies received so far
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockInferenceServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Well-formed advice as a model might return it, wrapped in prose
pub fn advice_reply() -> String {
    format!(
        "Here is the advice you asked for.\n{}\nHope this helps!",
        json!({
            "insights": ["Dining spending is 50% over budget."],
            "suggestedBudgetChanges": [
                {"categoryName": "Dining", "targetMonthlyAmount": 210, "rationale": "Trim two restaurant visits."}
            ],
            "tips": ["Plan meals on Sunday."],
            "followUps": ["Is the dining spend mostly work lunches?"],
            "assumptions": ["Only posted transactions are included."],
            "confidence": 0.72
        })
    )
}

async fn handle_generate(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", MOCK_TOKEN))
        .unwrap_or(false);

    if !authorized {
        return (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response();
    }

    state.requests.lock().unwrap().push(body);

    match &state.response {
        MockResponse::Array(text) => Json(json!([{ "generated_text": text }])).into_response(),
        MockResponse::Object(text) => Json(json!({ "generated_text": text })).into_response(),
        MockResponse::RawString(text) => Json(json!(text)).into_response(),
        MockResponse::Garbage => (StatusCode::OK, "<html>model is loading</html>").into_response(),
        MockResponse::Envelope(body) => Json(body.clone()).into_response(),
        MockResponse::ServerError => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal inference error").into_response()
        }
        MockResponse::Slow(delay, text) => {
            tokio::time::sleep(*delay).await;
            Json(json!([{ "generated_text": text }])).into_response()
        }
    }
}
