//! Sentiment confidence bar chart
//!
//! Rendered as inline SVG per request, so no image file is shared between
//! concurrent requests.

use crate::client::ConfidenceScores;

const WIDTH: f64 = 480.0;
const HEIGHT: f64 = 320.0;
const MARGIN_LEFT: f64 = 56.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 40.0;

/// (label, css class, fill colour)
const BARS: [(&str, &str, &str); 3] = [
    ("Positive", "positive", "#2e9d5b"),
    ("Neutral", "neutral", "#8a8f98"),
    ("Negative", "negative", "#d0453b"),
];

const TICKS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

/// SVG bar chart of the three confidence scores on a 0..1 axis
pub fn confidence_chart(scores: &ConfidenceScores) -> String {
    let values = [scores.positive, scores.neutral, scores.negative];
    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_height;
    let slot = plot_width / BARS.len() as f64;
    let bar_width = slot * 0.6;

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="confidence-chart" viewBox="0 0 {w} {h}" width="{w}" height="{h}" role="img" aria-label="Sentiment Confidence Scores">"#,
        w = WIDTH,
        h = HEIGHT
    ));
    svg.push_str(&format!(
        r#"<text x="{x}" y="24" text-anchor="middle" font-size="16">Sentiment Confidence Scores</text>"#,
        x = WIDTH / 2.0
    ));
    svg.push_str(&format!(
        r#"<text x="14" y="{y}" text-anchor="middle" font-size="12" transform="rotate(-90 14 {y})">Score</text>"#,
        y = MARGIN_TOP + plot_height / 2.0
    ));

    for tick in TICKS {
        let y = baseline - tick * plot_height;
        svg.push_str(&format!(
            r##"<line x1="{x1}" y1="{y:.1}" x2="{x2}" y2="{y:.1}" stroke="#e0e0e0"/><text x="{tx}" y="{ty:.1}" text-anchor="end" font-size="11">{tick:.2}</text>"##,
            x1 = MARGIN_LEFT,
            x2 = WIDTH - MARGIN_RIGHT,
            tx = MARGIN_LEFT - 6.0,
            ty = y + 4.0,
        ));
    }

    for (i, ((label, class, colour), value)) in BARS.iter().zip(values).enumerate() {
        let value = clamp_unit(value);
        let height = value * plot_height;
        let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_width) / 2.0;
        let y = baseline - height;
        svg.push_str(&format!(
            r#"<rect class="bar {class}" x="{x:.1}" y="{y:.1}" width="{bw:.1}" height="{height:.1}" fill="{colour}"><title>{label}: {pct:.1}%</title></rect>"#,
            bw = bar_width,
            pct = value * 100.0,
        ));
        svg.push_str(&format!(
            r#"<text x="{cx:.1}" y="{ly}" text-anchor="middle" font-size="12">{label}</text>"#,
            cx = x + bar_width / 2.0,
            ly = baseline + 20.0,
        ));
    }

    svg.push_str(&format!(
        r##"<line x1="{x1}" y1="{b}" x2="{x2}" y2="{b}" stroke="#444"/></svg>"##,
        x1 = MARGIN_LEFT,
        x2 = WIDTH - MARGIN_RIGHT,
        b = baseline
    ));
    svg
}

/// Scores come from the service untrusted; NaN draws as zero
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores() -> ConfidenceScores {
        ConfidenceScores {
            positive: 0.98,
            neutral: 0.01,
            negative: 0.01,
        }
    }

    #[test]
    fn test_chart_has_three_bars() {
        let svg = confidence_chart(&scores());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains("Sentiment Confidence Scores"));
        assert!(svg.contains(">Score<"));
        for label in ["Positive", "Neutral", "Negative"] {
            assert!(svg.contains(label));
        }
    }

    #[test]
    fn test_chart_has_ticks_and_labels() {
        let svg = confidence_chart(&scores());
        // title, y-axis label, five ticks, three bar labels
        assert_eq!(svg.matches("<text").count(), 10);
        assert_eq!(svg.matches("<line").count(), 6);
        for tick in ["0.00", "0.25", "0.50", "0.75", "1.00"] {
            assert!(svg.contains(&format!(">{}</text>", tick)));
        }
        assert!(svg.contains("<title>Positive: 98.0%</title>"));
    }

    #[test]
    fn test_bar_height_proportional() {
        let svg = confidence_chart(&ConfidenceScores {
            positive: 1.0,
            neutral: 0.5,
            negative: 0.0,
        });
        let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        assert!(svg.contains(&format!(r#"height="{:.1}""#, plot_height)));
        assert!(svg.contains(&format!(r#"height="{:.1}""#, plot_height / 2.0)));
        assert!(svg.contains(r#"height="0.0""#));
    }

    #[test]
    fn test_out_of_range_scores_clamped() {
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        let svg = confidence_chart(&ConfidenceScores {
            positive: f64::NAN,
            neutral: 2.0,
            negative: -1.0,
        });
        assert!(!svg.contains("NaN"));
    }
}
