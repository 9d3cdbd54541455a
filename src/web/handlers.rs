//! Request handlers

use super::page::{PageView, ResultView};
use super::{ApiError, AppState};
use crate::analysis::{AnalysisRequest, AnalysisResult, LanguageInfo, Operation};
use crate::client::ConfidenceScores;
use crate::error::ErrorKind;
use axum::body::Bytes;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::any::Any;

/// Body of a successful `POST /analyze`
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// Label, or "unavailable" when sentiment analysis failed
    pub sentiment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_scores: Option<ConfidenceScores>,
    pub key_phrases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguageInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<UnavailablePart>,
}

/// A part of the result that could not be produced
#[derive(Debug, Serialize)]
pub struct UnavailablePart {
    pub operation: Operation,
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&AnalysisResult> for AnalyzeResponse {
    fn from(result: &AnalysisResult) -> Self {
        let sentiment = result.sentiment();
        Self {
            sentiment: sentiment
                .map(|s| s.label.to_string())
                .unwrap_or_else(|| "unavailable".to_string()),
            confidence_scores: sentiment.map(|s| s.confidence_scores),
            key_phrases: result.key_phrases().to_vec(),
            language: result.language().cloned(),
            unavailable: result
                .failures()
                .into_iter()
                .map(|f| UnavailablePart {
                    operation: f.operation,
                    kind: f.kind,
                    message: match f.kind {
                        ErrorKind::InvalidInput => f.message.clone(),
                        kind => kind.user_message().to_string(),
                    },
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PageForm {
    pub text: Option<String>,
}

/// Extract `text` from a JSON body
fn parse_request(body: &[u8]) -> Result<AnalysisRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::NoText);
    }

    let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::InvalidJson)?;
    match value.get("text") {
        Some(Value::String(text)) => Ok(AnalysisRequest { text: text.clone() }),
        None | Some(Value::Null) => Err(ApiError::NoText),
        Some(_) => Err(ApiError::InvalidText("Text must be a string")),
    }
}

pub async fn analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let request = parse_request(&body)?;
    let result = state.analyzer.analyze(&request.text).await?;

    tracing::info!(
        complete = result.is_complete(),
        key_phrases = result.key_phrases().len(),
        "Analysis finished"
    );
    Ok(Json(AnalyzeResponse::from(&result)))
}

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let view = PageView::new(state.analyzer.options().max_text_chars);
    Ok(Html(state.pages.render(&view)?))
}

pub async fn submit(
    State(state): State<AppState>,
    form: Result<Form<PageForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let mut view = PageView::new(state.analyzer.options().max_text_chars);

    let text = match form {
        Ok(Form(PageForm { text: Some(text) })) => text,
        Ok(Form(PageForm { text: None })) => {
            let err = ApiError::NoText;
            view.error = Some(err.message());
            return render_page(&state, &view, err.status());
        }
        Err(rejection) => {
            let status = rejection.status();
            tracing::info!("Form rejected ({}): {}", status, rejection.body_text());
            view.error = Some(rejection.body_text());
            return render_page(&state, &view, status);
        }
    };
    view.text = text.clone();

    let status = match state.analyzer.analyze(&text).await {
        Ok(result) => {
            view.result = Some(ResultView::from(&result));
            StatusCode::OK
        }
        Err(e) => {
            let err = ApiError::from(e);
            view.error = Some(err.message());
            err.status()
        }
    };

    render_page(&state, &view, status)
}

fn render_page(
    state: &AppState,
    view: &PageView,
    status: StatusCode,
) -> Result<Response, ApiError> {
    Ok((status, Html(state.pages.render(view)?)).into_response())
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Route not found" })))
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}

pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);

    ApiError::Internal(detail).into_response()
}
