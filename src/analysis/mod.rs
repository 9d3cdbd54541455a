//! Text analysis
//!
//! Combines the three independent language-service operations into a single
//! typed result. Each part of the result is either available or carries the
//! failure of the operation that should have produced it.

pub mod aggregator;

pub use aggregator::{Analyzer, AnalyzerOptions};

use crate::client::{ConfidenceScores, SentimentLabel};
use crate::error::{AnalysisError, ErrorKind};
use serde::{Deserialize, Serialize};

/// Text submitted by a caller
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
}

/// External operation contributing to a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    LanguageDetection,
    SentimentAnalysis,
    KeyPhraseExtraction,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::LanguageDetection => "language_detection",
            Operation::SentimentAnalysis => "sentiment_analysis",
            Operation::KeyPhraseExtraction => "key_phrase_extraction",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one part of a result is missing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationFailure {
    pub operation: Operation,
    pub kind: ErrorKind,
    pub message: String,
}

impl OperationFailure {
    pub fn new(operation: Operation, error: &AnalysisError) -> Self {
        Self {
            operation,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

pub type Outcome<T> = std::result::Result<T, OperationFailure>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentAnalysis {
    pub label: SentimentLabel,
    pub confidence_scores: ConfidenceScores,
}

/// Primary language of the text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageInfo {
    pub name: String,
    /// ISO 639-1 code
    pub code: String,
    pub confidence: f64,
}

/// Merged result of one analysis
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub sentiment: Outcome<SentimentAnalysis>,
    /// Ordered as returned by the service
    pub key_phrases: Outcome<Vec<String>>,
    pub language: Outcome<LanguageInfo>,
}

impl AnalysisResult {
    pub fn sentiment(&self) -> Option<&SentimentAnalysis> {
        self.sentiment.as_ref().ok()
    }

    pub fn key_phrases(&self) -> &[String] {
        match &self.key_phrases {
            Ok(phrases) => phrases.as_slice(),
            Err(_) => &[],
        }
    }

    pub fn language(&self) -> Option<&LanguageInfo> {
        self.language.as_ref().ok()
    }

    /// Failures of the operations that did not contribute
    pub fn failures(&self) -> Vec<&OperationFailure> {
        [
            self.sentiment.as_ref().err(),
            self.key_phrases.as_ref().err(),
            self.language.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }
}
