//! Response repair: recovers one record per line from near-JSON model output.
//!
//! Per line:
//! - blank or whitespace-only lines are skipped, as are bare markdown fences
//!   and lone `[` / `]` lines from a model that wrapped its output in an array;
//! - trailing whitespace is dropped, then exactly one trailing `,` is removed;
//! - the rest must parse as a JSON object.
//!
//! A line that fails is reported as `Malformed` with its original text and
//! parsing continues with the next line.

use serde_json::{Map, Value};

pub const TRAILING_SEPARATOR: char = ',';

#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Record {
        raw: String,
        value: Map<String, Value>,
    },
    Malformed {
        raw: String,
        reason: String,
    },
}

/// Returns the parseable part of `line`, or `None` when the line carries no record.
pub fn repair_line(line: &str) -> Option<&str> {
    let trimmed = line.trim_end();
    let content = trimmed.trim_start();
    if content.is_empty() || content.starts_with("```") || content == "[" || content == "]" {
        return None;
    }
    Some(trimmed.strip_suffix(TRAILING_SEPARATOR).unwrap_or(trimmed))
}

pub fn parse_line(line: &str) -> Option<LineOutcome> {
    let repaired = repair_line(line)?;
    let outcome = match serde_json::from_str::<Value>(repaired) {
        Ok(Value::Object(value)) => LineOutcome::Record {
            raw: line.to_string(),
            value,
        },
        Ok(other) => LineOutcome::Malformed {
            raw: line.to_string(),
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        },
        Err(e) => LineOutcome::Malformed {
            raw: line.to_string(),
            reason: e.to_string(),
        },
    };
    Some(outcome)
}

pub fn parse_response(text: &str) -> Vec<LineOutcome> {
    text.lines().filter_map(parse_line).collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(outcome: &LineOutcome) -> &Map<String, Value> {
        match outcome {
            LineOutcome::Record { value, .. } => value,
            LineOutcome::Malformed { raw, reason } => panic!("malformed {raw}: {reason}"),
        }
    }

    #[test]
    fn test_repair_line_edge_cases() {
        assert_eq!(repair_line(""), None);
        assert_eq!(repair_line("   \t"), None);
        assert_eq!(repair_line("```json"), None);
        assert_eq!(repair_line("]"), None);
        assert_eq!(repair_line(r#"{"a":1}"#), Some(r#"{"a":1}"#));
        assert_eq!(repair_line(r#"{"a":1},"#), Some(r#"{"a":1}"#));
        assert_eq!(repair_line("{\"a\":1},  \r"), Some(r#"{"a":1}"#));
        // only one separator is removed
        assert_eq!(repair_line(r#"{"a":1},,"#), Some(r#"{"a":1},"#));
    }

    #[test]
    fn test_trailing_separator_repairs_to_same_object() {
        let with = parse_line(r#"{"question":"Q","answers":["A"]},"#).unwrap();
        let without = parse_line(r#"{"question":"Q","answers":["A"]}"#).unwrap();
        assert_eq!(record(&with), record(&without));
    }

    #[test]
    fn test_malformed_line_does_not_stop_later_lines() {
        let text = "{\"question\":\"one\"},\n{\"question\":\"broken\" \"answers\"},\n\n{\"question\":\"three\"}";
        let outcomes = parse_response(text);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(record(&outcomes[0])["question"], json!("one"));
        assert!(matches!(
            &outcomes[1],
            LineOutcome::Malformed { raw, .. } if raw == "{\"question\":\"broken\" \"answers\"},"
        ));
        assert_eq!(record(&outcomes[2])["question"], json!("three"));
    }

    #[test]
    fn test_non_object_json_is_malformed() {
        let outcome = parse_line("\"just a string\",").unwrap();
        assert!(matches!(
            outcome,
            LineOutcome::Malformed { ref reason, .. } if reason.contains("a string")
        ));
    }

    #[test]
    fn test_fenced_response_yields_only_records() {
        let text = "```json\n{\"question\":\"Q\"}\n```\n";
        let outcomes = parse_response(text);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(record(&outcomes[0])["question"], json!("Q"));
    }
}
