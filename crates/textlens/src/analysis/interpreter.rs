use serde::Serialize;

use super::domain::RawScores;

/// Metric consulted for the reading-level band when none is configured.
pub const DEFAULT_EASE_METRIC: &str = "flesch_reading_ease";

/// Qualitative readability tier derived from a reading-ease score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeBand {
    VeryEasy,
    FairlyEasy,
    Moderate,
    Difficult,
    VeryDifficult,
    Indeterminate,
}

impl GradeBand {
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryEasy => "Very Easy",
            Self::FairlyEasy => "Fairly Easy",
            Self::Moderate => "Moderate",
            Self::Difficult => "Difficult",
            Self::VeryDifficult => "Very Difficult",
            Self::Indeterminate => "Indeterminate",
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::VeryEasy => "Very easy to read; suitable for a general audience.",
            Self::FairlyEasy => "Easy to read; suitable for a general audience.",
            Self::Moderate => "Moderately complex; best suited to educated readers.",
            Self::Difficult => "Challenging; typical of academic or professional writing.",
            Self::VeryDifficult => {
                "Very hard to read; consider shorter sentences and simpler words."
            }
            Self::Indeterminate => "No reading ease score was reported; no band assigned.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interpretation {
    pub level: GradeBand,
    pub message: &'static str,
}

/// Maps raw reading-ease scores onto grade bands. Stateless apart from the
/// name of the metric it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreInterpreter {
    ease_metric: String,
}

impl Default for ScoreInterpreter {
    fn default() -> Self {
        Self::new(DEFAULT_EASE_METRIC)
    }
}

impl ScoreInterpreter {
    pub fn new(ease_metric: impl Into<String>) -> Self {
        Self {
            ease_metric: ease_metric.into(),
        }
    }

    pub fn ease_metric(&self) -> &str {
        &self.ease_metric
    }

    /// Bands are closed on the upper bound: a score sitting exactly on a
    /// threshold belongs to the lower band.
    pub fn classify(ease: Option<f64>) -> Interpretation {
        let level = match ease {
            Some(score) if !score.is_finite() => GradeBand::Indeterminate,
            Some(score) if score > 80.0 => GradeBand::VeryEasy,
            Some(score) if score > 60.0 => GradeBand::FairlyEasy,
            Some(score) if score > 40.0 => GradeBand::Moderate,
            Some(score) if score > 20.0 => GradeBand::Difficult,
            Some(_) => GradeBand::VeryDifficult,
            None => GradeBand::Indeterminate,
        };

        Interpretation {
            level,
            message: level.message(),
        }
    }

    pub fn interpret(&self, raw_scores: Option<&RawScores>) -> Interpretation {
        Self::classify(raw_scores.and_then(|scores| scores.get(&self.ease_metric)))
    }
}
