//! HTTP delivery shell.
//!
//! Exposes the answer pipeline as a streaming HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/chat` | Answer a question; body is the streamed plain-text answer |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! An empty question is rejected with a JSON error body:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Generation failures before the first token produce a plain-text 500.
//! A failure after partial output appends a visible `[stream error]` marker
//! and ends the body; the partial answer is never silently truncated.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! chat clients.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::completion::CompletionClient;
use crate::config::Config;
use crate::pipeline::AnswerPipeline;
use crate::search::SearchClient;

/// Shared application state passed to route handlers via Axum's `State`
/// extractor. The pipeline owns both upstream clients; there is no other
/// process-wide state.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<AnswerPipeline<SearchClient>>,
}

/// Starts the HTTP delivery shell.
///
/// Constructs the upstream clients from config and environment, binds to the
/// configured address, and serves until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let search = SearchClient::from_env(config)?;
    let completion = CompletionClient::from_env(config)?;
    let field = search.primary_field().to_string();
    let pipeline = Arc::new(AnswerPipeline::new(search, completion, field));

    let bind_addr = config.bind_addr();
    let app = router(pipeline);

    println!("ragline listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the router around an already-constructed pipeline.
/// Split out from [`run_server`] so tests can serve it on an ephemeral port.
pub fn router(pipeline: Arc<AnswerPipeline<SearchClient>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { pipeline })
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /chat ============

/// JSON request body for `POST /chat`.
#[derive(Deserialize)]
struct ChatRequest {
    question: String,
}

/// Handler for `POST /chat`.
///
/// Runs the pipeline and streams the answer as `text/plain`. Token fragments
/// are forwarded in upstream arrival order with no buffering beyond line
/// reassembly in the completion client.
async fn handle_chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    if req.question.trim().is_empty() {
        return bad_request("question must not be empty").into_response();
    }

    let stream = match state.pipeline.answer_stream(&req.question).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Error generating completion: {:#}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error generating response")
                .into_response();
        }
    };

    // A mid-stream failure emits the marker once, then the body ends.
    let body_stream = stream.scan(false, |failed, item| {
        if *failed {
            return future::ready(None);
        }
        let chunk = match item {
            Ok(fragment) => Bytes::from(fragment),
            Err(e) => {
                eprintln!("Completion stream failed mid-answer: {:#}", e);
                *failed = true;
                Bytes::from_static(b"\n[stream error]")
            }
        };
        future::ready(Some(Ok::<_, Infallible>(chunk)))
    });

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body_stream),
    )
        .into_response()
}
