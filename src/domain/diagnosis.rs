//! Prediction result types.
//!
//! Translates the classifier's raw class label into a verdict.

use serde::{Deserialize, Serialize};

/// Binary verdict for cardiovascular disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Disease predicted present
    Positive,
    /// Disease predicted absent
    Negative,
}

impl Verdict {
    /// Short verdict string.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Positive => "Positive for cardiovascular disease",
            Self::Negative => "Negative for cardiovascular disease",
        }
    }

    /// Sentence shown as the result headline.
    #[must_use]
    pub fn headline(&self) -> &'static str {
        match self {
            Self::Positive => "The person is predicted to have heart disease",
            Self::Negative => "The person is predicted to not have heart disease",
        }
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Positive)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "POSITIVE"),
            Self::Negative => write!(f, "NEGATIVE"),
        }
    }
}

/// How to treat a class label other than 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPolicy {
    /// Reject the prediction.
    #[default]
    Strict,
    /// Report it as negative.
    Lenient,
}

impl std::str::FromStr for LabelPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!(
                "unknown label policy {other:?} (expected \"strict\" or \"lenient\")"
            )),
        }
    }
}

/// Outcome of one prediction. Created per request and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Class label as returned by the classifier
    pub label: i64,

    /// Verdict derived from the label
    pub verdict: Verdict,
}

impl PredictionResult {
    #[must_use]
    pub fn new(label: i64, verdict: Verdict) -> Self {
        Self { label, verdict }
    }

    /// Verdict string for display.
    #[must_use]
    pub fn message(&self) -> &'static str {
        self.verdict.message()
    }
}
