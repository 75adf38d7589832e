use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient_string;

/// The model's quality verdict for one question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// low | medium | high
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub humor: Option<String>,
    /// youth | teen | adult
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub age_level: Option<String>,
    /// "true", or a description of what is wrong with the question
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

impl ScoreReport {
    pub fn is_empty(&self) -> bool {
        self.humor.is_none()
            && self.age_level.is_none()
            && self.accuracy.is_none()
            && self.problem.is_none()
    }

    pub fn is_problem(&self) -> bool {
        self.problem.is_some()
            || self
                .accuracy
                .as_deref()
                .is_some_and(|a| a.trim().eq_ignore_ascii_case("false"))
    }
}

/// One entry of a reviewer's feedback document, keyed by content id.
///
/// Robot reviews carry a `ScoreReport`; human reports carry `"type"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    #[serde(flatten)]
    pub score: ScoreReport,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

impl FeedbackEntry {
    pub fn from_review(score: ScoreReport, question: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            score,
            kind: None,
            timestamp: Some(timestamp),
            question: Some(question.to_string()),
        }
    }

    /// Same rule the audit uses to flag a record, plus human `"type": "problem"` reports.
    pub fn is_problem(&self) -> bool {
        self.kind.as_deref() == Some("problem") || self.score.is_problem()
    }

    /// Short label for logs.
    pub fn label(&self) -> &str {
        if let Some(kind) = self.kind.as_deref() {
            kind
        } else if self.score.is_problem() {
            "problem"
        } else {
            "score"
        }
    }
}
