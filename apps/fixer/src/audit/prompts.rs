// Audit LLM prompt templates.

use crate::llm_client::prompts::FewShotExample;

/// Identity under which robot reviews are merged into `trivia_feedback`.
pub const REVIEWER_ID: &str = "trivia-fixer robot";

pub const AUDIT_SYSTEM: &str = "\
You are an editor and producer for a trivia gameshow. \
Please rate and respond to the following trivia questions.";

pub const SCORING_INSTRUCTION: &str = "\
Review the following question and return a JSON object scoring it for humor (low/medium/high), \
age_level (youth/teen/adult), and accuracy (\"true\", or a description of any problems with the question). \
If the input is not a usable trivia question, return {\"problem\": \"<what is wrong>\"} instead.";

/// Calibration pairs for the scoring scale.
pub const SCORING_EXAMPLES: [FewShotExample; 4] = [
    FewShotExample {
        input: r#"The phrase "Homo sapiens" means ____"#,
        output: r#"{"humor": "low", "age_level": "teen", "accuracy": "true"}"#,
    },
    FewShotExample {
        input: "__________ and short tailed shrews get by on only two hours of sleep a day.",
        output: r#"{"humor": "low", "age_level": "adult", "accuracy": "true"}"#,
    },
    FewShotExample {
        input: "Elephants and short tailed shrews get by on only two hours of sleep a day.",
        output: r#"{"problem": "input is not a question"}"#,
    },
    FewShotExample {
        input: "Alligators and ________ have something in common, at least auditorily. They can hear notes only up to 4,000 vibrations a second.",
        output: r#"{"humor": "medium", "age_level": "teen", "accuracy": "true"}"#,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feedback::ScoreReport;

    #[test]
    fn test_calibration_outputs_are_valid_scores() {
        for example in SCORING_EXAMPLES {
            let report: ScoreReport = serde_json::from_str(example.output).unwrap();
            assert!(!report.is_empty());
        }
    }
}
