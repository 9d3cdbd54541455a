//! Language service client
//!
//! This module provides the interface to the cloud language-analysis API:
//! - Language detection
//! - Sentiment analysis
//! - Key phrase extraction
//!
//! Every operation takes a batch of documents and returns one result per
//! document, in input order.

mod text_analytics;

pub use text_analytics::{KeyCredential, TextAnalyticsClient};

use crate::config::LanguageServiceConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single document submitted for analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextDocument {
    pub id: String,
    pub text: String,
    /// ISO 639-1 hint; the service assumes English when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TextDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }
}

/// Error reported for one document inside an otherwise successful batch
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentError {
    pub id: String,
    pub code: String,
    pub message: String,
}

pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability of each sentiment label, as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl ConfidenceScores {
    pub fn total(&self) -> f64 {
        self.positive + self.neutral + self.negative
    }

    /// True when the scores form a distribution within `epsilon` of 1.0
    pub fn is_normalized(&self, epsilon: f64) -> bool {
        (self.total() - 1.0).abs() <= epsilon
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSentiment {
    pub sentiment: SentimentLabel,
    pub confidence_scores: ConfidenceScores,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLanguage {
    pub name: String,
    /// ISO 639-1 code
    pub iso6391_name: String,
    pub confidence_score: f64,
}

/// Document-batch operations offered by the language service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageClient: Send + Sync {
    async fn detect_language(
        &self,
        documents: &[TextDocument],
    ) -> Result<Vec<DocumentResult<DetectedLanguage>>>;

    async fn analyze_sentiment(
        &self,
        documents: &[TextDocument],
    ) -> Result<Vec<DocumentResult<DocumentSentiment>>>;

    async fn extract_key_phrases(
        &self,
        documents: &[TextDocument],
    ) -> Result<Vec<DocumentResult<Vec<String>>>>;
}

/// Build a client bound to `endpoint` and authenticated with `key`.
///
/// Nothing is sent over the network here; a bad endpoint or key surfaces on
/// the first call.
pub fn get_client(endpoint: &str, key: &str) -> Result<TextAnalyticsClient> {
    TextAnalyticsClient::new(endpoint, KeyCredential::new(key), &LanguageServiceConfig::default())
}

/// Build a client from the `[language]` configuration section
pub fn from_config(config: &LanguageServiceConfig) -> Result<TextAnalyticsClient> {
    TextAnalyticsClient::new(&config.endpoint, KeyCredential::new(&config.api_key), config)
}
