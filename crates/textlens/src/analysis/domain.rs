use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::interpreter::{Interpretation, ScoreInterpreter};
use super::orchestrator::SubmitError;

/// Analysis capability offered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    Readability,
    Tone,
    Plagiarism,
}

impl AnalysisMode {
    pub const fn ordered() -> [Self; 3] {
        [Self::Readability, Self::Tone, Self::Plagiarism]
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Self::Readability => "readability",
            Self::Tone => "tone",
            Self::Plagiarism => "plagiarism",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Readability => "Readability",
            Self::Tone => "Tone",
            Self::Plagiarism => "Plagiarism",
        }
    }

    /// Heading used for the mode's summary block in composed reports.
    pub const fn report_heading(self) -> &'static str {
        match self {
            Self::Readability => "Readability Summary",
            Self::Tone => "Tone Analysis",
            Self::Plagiarism => "Plagiarism Report",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown analysis mode '{0}' (expected readability, tone or plagiarism)")]
pub struct UnknownMode(pub String);

impl FromStr for AnalysisMode {
    type Err = UnknownMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "readability" => Ok(Self::Readability),
            "tone" => Ok(Self::Tone),
            "plagiarism" => Ok(Self::Plagiarism),
            _ => Err(UnknownMode(value.to_string())),
        }
    }
}

/// Text accepted for submission. Construction rejects blank input so a request
/// that exists is always safe to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    text: String,
    mode: AnalysisMode,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>, mode: AnalysisMode) -> Result<Self, SubmitError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SubmitError::Validation);
        }
        Ok(Self { text, mode })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }
}

/// Backend-computed numeric metrics keyed by metric name, kept in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawScores(BTreeMap<String, f64>);

impl RawScores {
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.0.get(metric).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for RawScores {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadabilitySummary {
    #[serde(default, deserialize_with = "scalar_text")]
    pub overall_readability: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub education_level: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub sentence_complexity: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub word_simplicity: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub insight: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneSummary {
    #[serde(default, deserialize_with = "scalar_text")]
    pub dominant_tone: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub confidence: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlagiarismSummary {
    #[serde(default, deserialize_with = "scalar_text")]
    pub plagiarism_score: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub feedback: Option<String>,
}

/// Qualitative fields returned by the backend, closed per mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Summary {
    Readability(ReadabilitySummary),
    Tone(ToneSummary),
    Plagiarism(PlagiarismSummary),
}

impl Summary {
    /// Summary with every field absent.
    pub fn empty(mode: AnalysisMode) -> Self {
        match mode {
            AnalysisMode::Readability => Self::Readability(ReadabilitySummary::default()),
            AnalysisMode::Tone => Self::Tone(ToneSummary::default()),
            AnalysisMode::Plagiarism => Self::Plagiarism(PlagiarismSummary::default()),
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        match self {
            Self::Readability(_) => AnalysisMode::Readability,
            Self::Tone(_) => AnalysisMode::Tone,
            Self::Plagiarism(_) => AnalysisMode::Plagiarism,
        }
    }

    /// Decode the backend's `summary` object for the given mode.
    pub fn from_value(mode: AnalysisMode, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match mode {
            AnalysisMode::Readability => Self::Readability(serde_json::from_value(value)?),
            AnalysisMode::Tone => Self::Tone(serde_json::from_value(value)?),
            AnalysisMode::Plagiarism => Self::Plagiarism(serde_json::from_value(value)?),
        })
    }

    /// Labeled fields in display order. The order is fixed per mode.
    pub fn fields(&self) -> Vec<(&'static str, Option<&str>)> {
        match self {
            Self::Readability(summary) => vec![
                ("Overall Readability", summary.overall_readability.as_deref()),
                ("Education Level", summary.education_level.as_deref()),
                ("Sentence Complexity", summary.sentence_complexity.as_deref()),
                ("Word Simplicity", summary.word_simplicity.as_deref()),
                ("Insight", summary.insight.as_deref()),
                ("Suggestion", summary.suggestion.as_deref()),
            ],
            Self::Tone(summary) => vec![
                ("Dominant Tone", summary.dominant_tone.as_deref()),
                ("Confidence", summary.confidence.as_deref()),
                ("Feedback", summary.feedback.as_deref()),
            ],
            Self::Plagiarism(summary) => vec![
                ("Plagiarism Score", summary.plagiarism_score.as_deref()),
                ("Feedback", summary.feedback.as_deref()),
            ],
        }
    }
}

/// Completed analysis. Built once from a gateway response and never mutated;
/// the interpretation step consumes the value and returns a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    mode: AnalysisMode,
    summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_scores: Option<RawScores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interpretation: Option<Interpretation>,
}

impl AnalysisResult {
    pub fn new(summary: Summary, raw_scores: Option<RawScores>) -> Self {
        Self {
            mode: summary.mode(),
            summary,
            raw_scores,
            interpretation: None,
        }
    }

    /// Attach the local reading-level band. Only readability results carry one.
    pub fn interpreted(self, interpreter: &ScoreInterpreter) -> Self {
        let interpretation = match self.mode {
            AnalysisMode::Readability => Some(interpreter.interpret(self.raw_scores.as_ref())),
            AnalysisMode::Tone | AnalysisMode::Plagiarism => None,
        };
        Self {
            interpretation,
            ..self
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn raw_scores(&self) -> Option<&RawScores> {
        self.raw_scores.as_ref()
    }

    pub fn interpretation(&self) -> Option<&Interpretation> {
        self.interpretation.as_ref()
    }
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }))
}
