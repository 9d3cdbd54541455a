//! REST client for the analyze-text API
//!
//! All three operations go through the same endpoint and differ only in the
//! task `kind` and the shape of the returned documents.

use super::{
    ConfidenceScores, DetectedLanguage, DocumentError, DocumentResult, DocumentSentiment,
    LanguageClient, SentimentLabel, TextDocument,
};
use crate::config::LanguageServiceConfig;
use crate::error::{AnalysisError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const ANALYZE_TEXT_PATH: &str = "/language/:analyze-text";
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// API key for a Language resource
#[derive(Clone)]
pub struct KeyCredential {
    key: String,
}

impl KeyCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for KeyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyCredential(***)")
    }
}

/// Client for the Language service analyze-text endpoint
#[derive(Clone)]
pub struct TextAnalyticsClient {
    http: Client,
    endpoint: String,
    credential: KeyCredential,
    api_version: String,
    default_language: Option<String>,
}

// ============ Request/Response types ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeTextRequest<'a> {
    kind: &'static str,
    analysis_input: AnalysisInput<'a>,
    parameters: TaskParameters,
}

#[derive(Debug, Serialize)]
struct AnalysisInput<'a> {
    documents: &'a [TextDocument],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskParameters {
    model_version: &'static str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeTextResponse<D> {
    results: TaskResults<D>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskResults<D> {
    documents: Vec<D>,
    #[serde(default)]
    errors: Vec<WireDocumentError>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDocumentError {
    id: String,
    error: WireError,
}

#[derive(Debug, Deserialize)]
struct WireError {
    code: String,
    message: String,
    #[serde(default)]
    innererror: Option<Box<WireError>>,
}

impl WireError {
    /// The innermost message is the most specific one
    fn detail(&self) -> &str {
        match &self.innererror {
            Some(inner) => inner.detail(),
            None => &self.message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: WireError,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentDocument {
    id: String,
    sentiment: SentimentLabel,
    confidence_scores: ConfidenceScores,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyPhraseDocument {
    id: String,
    key_phrases: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LanguageDocument {
    id: String,
    detected_language: WireDetectedLanguage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDetectedLanguage {
    name: String,
    #[serde(rename = "iso6391Name")]
    iso6391_name: String,
    confidence_score: f64,
}

trait Identified {
    fn id(&self) -> &str;
}

impl Identified for SentimentDocument {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for KeyPhraseDocument {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for LanguageDocument {
    fn id(&self) -> &str {
        &self.id
    }
}

impl TextAnalyticsClient {
    /// Create a new client. The endpoint is not contacted.
    pub fn new(
        endpoint: &str,
        credential: KeyCredential,
        config: &LanguageServiceConfig,
    ) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credential,
            api_version: config.api_version.clone(),
            default_language: config.default_language.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fill in the configured language for documents without one
    fn with_default_language(&self, documents: &[TextDocument]) -> Vec<TextDocument> {
        documents
            .iter()
            .cloned()
            .map(|doc| match doc.language {
                Some(_) => doc,
                None => doc.with_language(self.default_language.clone()),
            })
            .collect()
    }

    async fn analyze_text<D>(
        &self,
        kind: &'static str,
        documents: &[TextDocument],
    ) -> Result<TaskResults<D>>
    where
        D: DeserializeOwned,
    {
        let url = format!("{}{}", self.endpoint, ANALYZE_TEXT_PATH);
        let request = AnalyzeTextRequest {
            kind,
            analysis_input: AnalysisInput { documents },
            parameters: TaskParameters {
                model_version: "latest",
            },
        };

        tracing::debug!("Submitting {} document(s) for {}", documents.len(), kind);

        let resp = self
            .http
            .post(&url)
            .query(&[("api-version", self.api_version.as_str())])
            .header(SUBSCRIPTION_KEY_HEADER, self.credential.key())
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(resp.headers());
            let body = resp.text().await.unwrap_or_default();
            return Err(error_for_status(status, retry_after, &body));
        }

        let text = resp.text().await?;
        let response: AnalyzeTextResponse<D> = serde_json::from_str(&text).map_err(|e| {
            AnalysisError::InvalidResponse(format!(
                "{} response did not parse: {} - response: {}",
                kind,
                e,
                truncate(&text, 200)
            ))
        })?;

        tracing::debug!(
            model_version = response.results.model_version.as_deref().unwrap_or("unknown"),
            "{} completed",
            kind
        );
        Ok(response.results)
    }
}

/// Order batch results by the submitted document ids
fn collect_documents<D, T>(
    documents: &[TextDocument],
    results: TaskResults<D>,
    convert: impl Fn(D) -> T,
) -> Result<Vec<DocumentResult<T>>>
where
    D: Identified,
{
    let TaskResults { documents: mut successes, errors, .. } = results;

    documents
        .iter()
        .map(|doc| {
            if let Some(pos) = successes.iter().position(|d| d.id() == doc.id) {
                return Ok(Ok(convert(successes.swap_remove(pos))));
            }
            if let Some(err) = errors.iter().find(|e| e.id == doc.id) {
                return Ok(Err(DocumentError {
                    id: err.id.clone(),
                    code: err.error.code.clone(),
                    message: err.error.detail().to_string(),
                }));
            }
            Err(AnalysisError::InvalidResponse(format!(
                "no result for document {}",
                doc.id
            )))
        })
        .collect()
}

fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Map a non-success HTTP status to an error
fn error_for_status(status: StatusCode, retry_after_secs: u64, body: &str) -> AnalysisError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.detail().to_string())
        .unwrap_or_else(|_| truncate(body, 200).to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AnalysisError::AuthenticationFailure(message)
        }
        StatusCode::TOO_MANY_REQUESTS => AnalysisError::RateLimited { retry_after_secs },
        StatusCode::BAD_REQUEST => AnalysisError::InvalidInput(message),
        s if s.is_server_error() => AnalysisError::ServiceUnavailable(format!("{}: {}", s, message)),
        s => AnalysisError::Api {
            status: s.as_u16(),
            message,
        },
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl LanguageClient for TextAnalyticsClient {
    async fn detect_language(
        &self,
        documents: &[TextDocument],
    ) -> Result<Vec<DocumentResult<DetectedLanguage>>> {
        // Detection documents carry no language hint
        let plain: Vec<TextDocument> = documents
            .iter()
            .map(|d| TextDocument::new(d.id.clone(), d.text.clone()))
            .collect();
        let results = self
            .analyze_text::<LanguageDocument>("LanguageDetection", &plain)
            .await?;

        collect_documents(documents, results, |d| DetectedLanguage {
            name: d.detected_language.name,
            iso6391_name: d.detected_language.iso6391_name,
            confidence_score: d.detected_language.confidence_score,
        })
    }

    async fn analyze_sentiment(
        &self,
        documents: &[TextDocument],
    ) -> Result<Vec<DocumentResult<DocumentSentiment>>> {
        let documents = self.with_default_language(documents);
        let results = self
            .analyze_text::<SentimentDocument>("SentimentAnalysis", &documents)
            .await?;

        collect_documents(&documents, results, |d| DocumentSentiment {
            sentiment: d.sentiment,
            confidence_scores: d.confidence_scores,
        })
    }

    async fn extract_key_phrases(
        &self,
        documents: &[TextDocument],
    ) -> Result<Vec<DocumentResult<Vec<String>>>> {
        let documents = self.with_default_language(documents);
        let results = self
            .analyze_text::<KeyPhraseDocument>("KeyPhraseExtraction", &documents)
            .await?;

        collect_documents(&documents, results, |d| d.key_phrases)
    }
}
