use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use docqa_rag::{Answer, ServiceLifecycle, ServiceState};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<ServiceLifecycle>,
}

impl AppState {
    pub fn new(lifecycle: Arc<ServiceLifecycle>) -> Self {
        Self { lifecycle }
    }
}

/// Body of `POST /call`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallRequest {
    #[serde(default)]
    pub question: Option<String>,
}

/// One retrieved chunk, as reported back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    pub text: String,
    pub page: usize,
    pub score: f32,
}

/// Body of a successful `POST /call` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallResponse {
    pub query: String,
    pub result: String,
    pub sources: Vec<SourceRef>,
}

impl From<Answer> for CallResponse {
    fn from(answer: Answer) -> Self {
        Self {
            query: answer.query,
            result: answer.result,
            sources: answer
                .sources
                .into_iter()
                .map(|s| SourceRef { text: s.chunk.text, page: s.chunk.page, score: s.score })
                .collect(),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub chunks: usize,
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/call", post(call))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn run_server(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;

    info!("docqa listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("docqa stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let (status, code) = match state.lifecycle.state() {
        ServiceState::Ready => ("ok", StatusCode::OK),
        other => (other.as_str(), StatusCode::SERVICE_UNAVAILABLE),
    };
    let chunks = state.lifecycle.service().map(|s| s.chunk_count()).unwrap_or(0);
    (code, Json(HealthResponse { status: status.to_string(), chunks }))
}

async fn call(
    State(state): State<AppState>,
    payload: Result<Json<CallRequest>, JsonRejection>,
) -> Result<Json<CallResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let question = request
        .question
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("question must be a non-empty string"))?;

    let answer = state.lifecycle.answer(&question).await?;
    Ok(Json(answer.into()))
}
