//! HTTP surface
//!
//! - `GET /` and `POST /`: server-rendered page with the analysis form
//! - `POST /analyze`: JSON API
//! - `GET /health`: liveness probe

pub mod chart;
mod handlers;
mod page;

pub use handlers::{AnalyzeResponse, UnavailablePart};
pub use page::PageRenderer;

use crate::analysis::Analyzer;
use crate::error::{AnalysisError, ErrorKind};
use axum::extract::Request;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// State shared by every request
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pages: Arc<PageRenderer>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Result<Self, minijinja::Error> {
        Ok(Self {
            analyzer: Arc::new(analyzer),
            pages: Arc::new(PageRenderer::new()?),
        })
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::submit))
        .route("/analyze", post(handlers::analyze))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %Uuid::new_v4(),
            )
        }))
        .layer(CatchPanicLayer::custom(handlers::handle_panic))
}

/// Serve until Ctrl-C
pub async fn serve(state: AppState, bind_address: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Errors returned to HTTP clients as `{"error": message}`
#[derive(Debug)]
pub enum ApiError {
    NoText,
    InvalidJson,
    InvalidText(&'static str),
    Analysis(AnalysisError),
    Internal(String),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        ApiError::Analysis(err)
    }
}

impl From<minijinja::Error> for ApiError {
    fn from(err: minijinja::Error) -> Self {
        ApiError::Internal(format!("template error: {}", err))
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::AuthenticationFailure => StatusCode::BAD_GATEWAY,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoText | ApiError::InvalidJson | ApiError::InvalidText(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Analysis(err) => status_for(err.kind()),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the user
    pub fn message(&self) -> String {
        match self {
            ApiError::NoText => "No text provided".to_string(),
            ApiError::InvalidJson => "Invalid JSON body".to_string(),
            ApiError::InvalidText(msg) => msg.to_string(),
            // Locally detected or reported per document; safe to echo
            ApiError::Analysis(AnalysisError::InvalidInput(msg)) => msg.clone(),
            ApiError::Analysis(err) => err.kind().user_message().to_string(),
            ApiError::Internal(_) => ErrorKind::Internal.user_message().to_string(),
        }
    }

    fn retry_after(&self) -> Option<u64> {
        match self {
            ApiError::Analysis(AnalysisError::RateLimited { retry_after_secs }) => {
                Some(*retry_after_secs)
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::info!("Request rejected ({}): {}", status, self.message());
        }

        let mut response = (status, Json(json!({ "error": self.message() }))).into_response();
        if let Some(secs) = self.retry_after() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
