//! Fan-out/fan-in over the language service
//!
//! The three operations have no data dependency, so they run concurrently,
//! each under its own timeout. A call that times out is dropped, which
//! cancels its in-flight request.

use super::{AnalysisResult, LanguageInfo, Operation, OperationFailure, SentimentAnalysis};
use crate::client::{DocumentResult, LanguageClient, TextDocument};
use crate::config::Config;
use crate::error::{AnalysisError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Id of the only document this service submits
const DOCUMENT_ID: &str = "0";

#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    /// Upper bound for each external call
    pub request_timeout: Duration,
    /// Longest accepted input, in characters
    pub max_text_chars: usize,
}

impl AnalyzerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_timeout: config.language.request_timeout(),
            max_text_chars: config.server.max_text_chars,
        }
    }
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_text_chars: 5000,
        }
    }
}

/// Runs one analysis per call against a shared client
#[derive(Clone)]
pub struct Analyzer {
    client: Arc<dyn LanguageClient>,
    options: AnalyzerOptions,
}

impl Analyzer {
    pub fn new(client: Arc<dyn LanguageClient>, options: AnalyzerOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Trim and check the input before anything is sent
    pub fn validate<'a>(&self, text: &'a str) -> Result<&'a str> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AnalysisError::InvalidInput("No text provided".to_string()));
        }
        if text.chars().count() > self.options.max_text_chars {
            return Err(AnalysisError::InvalidInput(format!(
                "Text exceeds maximum allowed length ({} characters).",
                self.options.max_text_chars
            )));
        }
        Ok(text)
    }

    /// Analyze `text` with all three operations.
    ///
    /// Fails only when the input is rejected or when every operation failed;
    /// otherwise the failed parts are flagged in the result.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        let text = self.validate(text)?;
        let documents = vec![TextDocument::new(DOCUMENT_ID, text)];

        let (language, sentiment, key_phrases) = tokio::join!(
            self.bounded(Operation::LanguageDetection, self.client.detect_language(&documents)),
            self.bounded(Operation::SentimentAnalysis, self.client.analyze_sentiment(&documents)),
            self.bounded(Operation::KeyPhraseExtraction, self.client.extract_key_phrases(&documents)),
        );

        let sentiment = sentiment.map(|doc| SentimentAnalysis {
            label: doc.sentiment,
            confidence_scores: doc.confidence_scores,
        });
        let language = language.map(|lang| LanguageInfo {
            name: lang.name,
            code: lang.iso6391_name,
            confidence: lang.confidence_score,
        });

        match (sentiment, key_phrases, language) {
            (Err(sentiment), Err(key_phrases), Err(language)) => {
                self.flag(Operation::SentimentAnalysis, &sentiment);
                self.flag(Operation::KeyPhraseExtraction, &key_phrases);
                self.flag(Operation::LanguageDetection, &language);
                tracing::error!("All language service operations failed");
                Err(sentiment)
            }
            (sentiment, key_phrases, language) => Ok(AnalysisResult {
                sentiment: sentiment.map_err(|e| self.flag(Operation::SentimentAnalysis, &e)),
                key_phrases: key_phrases
                    .map_err(|e| self.flag(Operation::KeyPhraseExtraction, &e)),
                language: language.map_err(|e| self.flag(Operation::LanguageDetection, &e)),
            }),
        }
    }

    /// Apply the per-call timeout and pick out our document's result
    async fn bounded<T, F>(&self, operation: Operation, call: F) -> Result<T>
    where
        F: Future<Output = Result<Vec<DocumentResult<T>>>>,
    {
        let timeout = self.options.request_timeout;
        let batch = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AnalysisError::Timeout {
                    timeout_secs: timeout.as_secs().max(1),
                })
            }
        };

        match batch.into_iter().next() {
            Some(Ok(value)) => Ok(value),
            Some(Err(doc_err)) => Err(AnalysisError::InvalidInput(format!(
                "{} ({})",
                doc_err.message, doc_err.code
            ))),
            None => Err(AnalysisError::InvalidResponse(format!(
                "{} returned no documents",
                operation
            ))),
        }
    }

    fn flag(&self, operation: Operation, error: &AnalysisError) -> OperationFailure {
        tracing::warn!(
            operation = %operation,
            kind = ?error.kind(),
            "Language service operation failed: {}",
            error
        );
        OperationFailure::new(operation, error)
    }
}
