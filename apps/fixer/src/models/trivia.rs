use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A corrected trivia question as persisted in the `trivia` collection.
///
/// `content_id` is the identity key. `answers[0]` was the correct answer at
/// the moment of write and `correct_answer` mirrors it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriviaRecord {
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub lang: String,
    pub question: String,
    pub answers: Vec<String>,
    pub correct_answer: String,
    pub content_id: String,
    /// Tie-breakers for downstream sampling, not security-relevant.
    #[serde(default)]
    pub random_1: u32,
    #[serde(default)]
    pub random_2: u32,
    #[serde(default)]
    pub random_3: u32,
    #[serde(default)]
    pub proofed: bool,
    #[serde(default)]
    pub to_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl TriviaRecord {
    /// Reviewed records are skipped by every audit scan.
    pub fn is_reviewed(&self) -> bool {
        self.proofed || self.to_review
    }
}

/// One parsed line of model output, before normalization.
///
/// Everything is optional here; the normalizer decides what is required.
/// Unknown fields such as `source` or `tags` are dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTrivia {
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub question: Option<String>,
    /// Transient index into `answers`; never persisted.
    #[serde(default)]
    pub answer: Option<Value>,
    #[serde(default)]
    pub answers: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "super::lenient_string")]
    pub explanation: Option<String>,
}
