//! Server-rendered analysis page

use super::chart;
use crate::analysis::{AnalysisResult, Operation};
use crate::error::ErrorKind;
use minijinja::{context, Environment};
use serde::Serialize;

const PAGE_NAME: &str = "index.html";
const PAGE_TEMPLATE: &str = include_str!("../../templates/index.html");

/// Renders the page; HTML autoescaping applies because of the `.html` name
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(PAGE_NAME, PAGE_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn render(&self, view: &PageView) -> Result<String, minijinja::Error> {
        let template = self.env.get_template(PAGE_NAME)?;
        template.render(context! { page => view })
    }
}

#[derive(Debug, Default, Serialize)]
pub struct PageView {
    pub text: String,
    pub max_chars: usize,
    pub error: Option<String>,
    pub result: Option<ResultView>,
}

impl PageView {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScoreView {
    pub label: &'static str,
    pub class: &'static str,
    pub percent: String,
}

#[derive(Debug, Serialize)]
pub struct ResultView {
    /// Badge text, upper case
    pub sentiment: String,
    /// CSS class for the badge
    pub sentiment_class: String,
    pub scores: Vec<ScoreView>,
    pub chart_svg: Option<String>,
    pub key_phrases: Vec<String>,
    pub language: Option<String>,
    pub notices: Vec<String>,
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

impl From<&AnalysisResult> for ResultView {
    fn from(result: &AnalysisResult) -> Self {
        let sentiment = result.sentiment();

        let scores = sentiment
            .map(|s| {
                let c = &s.confidence_scores;
                vec![
                    ScoreView { label: "Positive", class: "positive", percent: percent(c.positive) },
                    ScoreView { label: "Neutral", class: "neutral", percent: percent(c.neutral) },
                    ScoreView { label: "Negative", class: "negative", percent: percent(c.negative) },
                ]
            })
            .unwrap_or_default();

        let notices = result
            .failures()
            .into_iter()
            .map(|f| {
                let reason = match f.kind {
                    ErrorKind::InvalidInput => f.message.as_str(),
                    kind => kind.user_message(),
                };
                format!("{} unavailable: {}", describe(f.operation), reason)
            })
            .collect();

        Self {
            sentiment: sentiment
                .map(|s| s.label.as_str().to_uppercase())
                .unwrap_or_else(|| "UNAVAILABLE".to_string()),
            sentiment_class: sentiment
                .map(|s| s.label.as_str().to_string())
                .unwrap_or_else(|| "unavailable".to_string()),
            scores,
            chart_svg: sentiment.map(|s| chart::confidence_chart(&s.confidence_scores)),
            key_phrases: result.key_phrases().to_vec(),
            language: result
                .language()
                .map(|l| format!("{} \u{2022} {}", l.name.to_uppercase(), l.code)),
            notices,
        }
    }
}

fn describe(operation: Operation) -> &'static str {
    match operation {
        Operation::LanguageDetection => "Language detection",
        Operation::SentimentAnalysis => "Sentiment analysis",
        Operation::KeyPhraseExtraction => "Key phrase extraction",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{LanguageInfo, OperationFailure, SentimentAnalysis};
    use crate::client::{ConfidenceScores, SentimentLabel};

    fn result() -> AnalysisResult {
        AnalysisResult {
            sentiment: Ok(SentimentAnalysis {
                label: SentimentLabel::Positive,
                confidence_scores: ConfidenceScores {
                    positive: 0.9,
                    neutral: 0.075,
                    negative: 0.025,
                },
            }),
            key_phrases: Ok(vec!["<b>bold</b> claim".to_string()]),
            language: Ok(LanguageInfo {
                name: "English".to_string(),
                code: "en".to_string(),
                confidence: 0.99,
            }),
        }
    }

    #[test]
    fn test_result_view() {
        let view = ResultView::from(&result());
        assert_eq!(view.sentiment, "POSITIVE");
        assert_eq!(view.sentiment_class, "positive");
        assert_eq!(view.scores[0].percent, "90.0%");
        assert_eq!(view.scores[2].percent, "2.5%");
        assert_eq!(view.language.as_deref(), Some("ENGLISH \u{2022} en"));
        assert!(view.chart_svg.is_some());
        assert!(view.notices.is_empty());
    }

    #[test]
    fn test_result_view_without_sentiment() {
        let mut result = result();
        result.sentiment = Err(OperationFailure {
            operation: Operation::SentimentAnalysis,
            kind: ErrorKind::Timeout,
            message: "Timed out after 10 seconds".to_string(),
        });
        let view = ResultView::from(&result);
        assert_eq!(view.sentiment, "UNAVAILABLE");
        assert!(view.scores.is_empty());
        assert!(view.chart_svg.is_none());
        assert_eq!(view.notices.len(), 1);
        assert!(view.notices[0].starts_with("Sentiment analysis unavailable"));
    }

    #[test]
    fn test_render_escapes_user_content() {
        let renderer = PageRenderer::new().unwrap();
        let mut view = PageView::new(5000);
        view.text = "<script>alert(1)</script>".to_string();
        view.result = Some(ResultView::from(&result()));

        let html = renderer.render(&view).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>bold</b>"));
        // The chart is trusted markup
        assert!(html.contains("<svg"));
    }

    #[test]
    fn test_render_empty_page() {
        let renderer = PageRenderer::new().unwrap();
        let html = renderer.render(&PageView::new(5000)).unwrap();
        assert!(html.contains("<form"));
        assert!(html.contains("maxlength=\"5000\""));
        assert!(!html.contains("Sentiment Confidence Scores"));
    }
}
