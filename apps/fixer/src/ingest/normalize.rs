use rand::Rng;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;
use crate::models::scalar_to_string;
use crate::models::trivia::{RawTrivia, TriviaRecord};
use crate::store::content_id;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("record does not match the trivia schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("answer #{0} is not a string")]
    InvalidAnswer(usize),
}

impl NormalizeError {
    /// Attaches the offending line for the problem log.
    pub fn into_app_error(self, line: &str) -> AppError {
        match self {
            NormalizeError::MissingField(field) => AppError::MissingRequiredField {
                field,
                line: line.to_string(),
            },
            other => AppError::MalformedRecord {
                line: line.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Three independent tie-breakers for downstream sampling and ordering.
pub fn tie_breakers<R: Rng>(rng: &mut R) -> [u32; 3] {
    [rng.gen(), rng.gen(), rng.gen()]
}

/// Builds the persisted record from one parsed model line.
///
/// `answers[0]` becomes `correct_answer`; the transient `answer` index is
/// dropped; the record starts unreviewed. Fails when `question` or a
/// non-empty `answers` list is missing.
pub fn normalize<R: Rng>(
    value: Map<String, Value>,
    rng: &mut R,
) -> Result<TriviaRecord, NormalizeError> {
    let raw: RawTrivia = serde_json::from_value(Value::Object(value))?;

    let question = raw
        .question
        .filter(|q| !q.trim().is_empty())
        .ok_or(NormalizeError::MissingField("question"))?;

    let answers = raw
        .answers
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, a)| scalar_to_string(a).ok_or(NormalizeError::InvalidAnswer(i)))
        .collect::<Result<Vec<_>, _>>()?;
    let correct_answer = answers
        .first()
        .cloned()
        .ok_or(NormalizeError::MissingField("answers"))?;

    if let Some(index) = raw.answer {
        debug!("Dropping transient answer index {} for '{}'", index, question);
    }

    let [random_1, random_2, random_3] = tie_breakers(rng);

    Ok(TriviaRecord {
        category_id: raw.category_id,
        lang: raw.lang,
        content_id: content_id(&question),
        question,
        answers,
        correct_answer,
        random_1,
        random_2,
        random_3,
        proofed: false,
        to_review: false,
        explanation: raw.explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_normalize_sets_correct_answer_and_identity() {
        let mut rng = StdRng::seed_from_u64(7);
        let record = normalize(
            object(json!({
                "category_id": "SCIENCE_AND_NATURE",
                "lang": "en",
                "question": "How is \"Ethylene Glycol\" better known?",
                "answer": 0,
                "answers": ["Antifreeze", "Brake fluid", "Coolant", "Motor oil"],
                "explanation": "It lowers the freezing point of water.",
                "source": "",
            })),
            &mut rng,
        )
        .unwrap();

        assert_eq!(record.correct_answer, "Antifreeze");
        assert_eq!(record.answers.len(), 4);
        assert_eq!(record.content_id, content_id(&record.question));
        assert!(!record.proofed);
        assert!(!record.to_review);

        let persisted = serde_json::to_value(&record).unwrap();
        assert!(persisted.get("answer").is_none());
        assert!(persisted.get("source").is_none());
    }

    #[test]
    fn test_tie_breakers_come_from_rng() {
        let value = object(json!({"question": "Q", "answers": ["A"]}));
        let a = normalize(value.clone(), &mut StdRng::seed_from_u64(1)).unwrap();
        let b = normalize(value, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(
            (a.random_1, a.random_2, a.random_3),
            (b.random_1, b.random_2, b.random_3)
        );
        assert_ne!(a.random_1, a.random_2);
    }

    #[test]
    fn test_missing_answers_is_missing_field() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = normalize(object(json!({"question": "Q"})), &mut rng).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingField("answers")));

        let err = normalize(object(json!({"question": "Q", "answers": []})), &mut rng).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingField("answers")));
        assert!(matches!(
            err.into_app_error("{}"),
            AppError::MissingRequiredField { field: "answers", .. }
        ));
    }

    #[test]
    fn test_missing_question_is_missing_field() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = normalize(object(json!({"question": "  ", "answers": ["A"]})), &mut rng)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::MissingField("question")));
    }

    #[test]
    fn test_numeric_answers_are_accepted_but_objects_are_not() {
        let mut rng = StdRng::seed_from_u64(0);
        let record = normalize(
            object(json!({"question": "Moon landing year?", "answers": [1969, "1970"]})),
            &mut rng,
        )
        .unwrap();
        assert_eq!(record.correct_answer, "1969");

        let err = normalize(
            object(json!({"question": "Q", "answers": ["A", {"x": 1}]})),
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidAnswer(1)));
        assert!(matches!(
            err.into_app_error("line"),
            AppError::MalformedRecord { .. }
        ));
    }

    #[test]
    fn test_wrong_field_type_is_schema_error() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = normalize(object(json!({"question": 5, "answers": ["A"]})), &mut rng)
            .unwrap_err();
        assert!(matches!(err, NormalizeError::Schema(_)));
    }
}
