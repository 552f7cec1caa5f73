//! HTTP surface of the query service.
//!
//! Exposes `POST /api/ask`, `GET /api/schema` and `GET /health` over axum,
//! with request tracing and an origin-restricted CORS policy.

mod cors;

pub use cors::{build_cors_layer, normalize_origin};

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::db::TableColumns;
use crate::error::{AgentError, Result};
use crate::query::{AskResponse, AskService};

type AppState = Arc<AskService>;

/// Body of `POST /api/ask`.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// The natural-language question.
    pub query: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    detail: String,
}

impl AgentError {
    /// HTTP status reported for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::PolicyRejected(_) | Self::ExecutionFailed(_) => StatusCode::BAD_REQUEST,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Llm(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Load(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AgentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(category = self.category(), "{self}");
        }
        let body = Json(ErrorPayload {
            detail: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Builds the application router.
pub fn build_router(service: Arc<AskService>, allowed_origins: &[String]) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/ask", post(ask_handler))
        .route("/api/schema", get(schema_handler))
        .with_state(service);

    let router = match build_cors_layer(allowed_origins) {
        Some(layer) => router.layer(layer),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

/// Serves the API until Ctrl-C.
pub async fn serve(config: &ServerConfig, service: AskService) -> Result<()> {
    let app = build_router(Arc::new(service), &config.allowed_origins);
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AgentError::internal(format!("failed to bind {addr}: {e}")))?;

    tracing::info!(
        %addr,
        allowed_origins = ?config.allowed_origins,
        "data agent listening"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AgentError::internal(format!("server error: {e}")))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn ask_handler(
    State(service): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let response = service.ask(&payload.query).await?;
    Ok(Json(response))
}

async fn schema_handler(State(service): State<AppState>) -> Result<Json<Vec<TableColumns>>> {
    let schema = service.schema().await?;
    Ok(Json(schema.snapshot()))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => tracing::error!(?err, "failed to listen for shutdown signal"),
    }
}
