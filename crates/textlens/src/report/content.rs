use crate::analysis::{AnalysisResult, RawScores};

/// Rendered in place of any field the backend did not supply.
pub const NOT_AVAILABLE: &str = "not available";

const READING_LEVEL_HEADING: &str = "Reading Level";
const RAW_METRICS_HEADING: &str = "Raw Metrics";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportField {
    pub label: String,
    pub value: String,
}

impl ReportField {
    fn new(label: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            label: label.into(),
            value: value.unwrap_or(NOT_AVAILABLE).to_string(),
        }
    }

    pub fn line(&self) -> String {
        format!("{}: {}", self.label, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBlock {
    pub heading: String,
    pub fields: Vec<ReportField>,
}

/// Ordered blocks of labeled fields shared by every rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContent {
    pub blocks: Vec<ReportBlock>,
}

impl ReportContent {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let mut blocks = vec![ReportBlock {
            heading: result.mode().report_heading().to_string(),
            fields: result
                .summary()
                .fields()
                .into_iter()
                .map(|(label, value)| ReportField::new(label, value))
                .collect(),
        }];

        if let Some(interpretation) = result.interpretation() {
            blocks.push(ReportBlock {
                heading: READING_LEVEL_HEADING.to_string(),
                fields: vec![
                    ReportField::new("Grade Band", Some(interpretation.level.label())),
                    ReportField::new("Interpretation", Some(interpretation.message)),
                ],
            });
        }

        if let Some(scores) = result.raw_scores().filter(|scores| !scores.is_empty()) {
            blocks.push(metrics_block(scores));
        }

        Self { blocks }
    }
}

fn metrics_block(scores: &RawScores) -> ReportBlock {
    ReportBlock {
        heading: RAW_METRICS_HEADING.to_string(),
        fields: scores
            .iter()
            .map(|(metric, value)| ReportField {
                label: humanize_metric(metric),
                value: format!("{value:.2}"),
            })
            .collect(),
    }
}

fn humanize_metric(metric: &str) -> String {
    metric
        .split(['_', '-', '.'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
