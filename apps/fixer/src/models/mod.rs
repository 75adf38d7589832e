pub mod feedback;
pub mod trivia;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Renders a JSON scalar as text. Models sometimes emit `1969` or `true`
/// where a string was asked for.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `deserialize_with` helper for optional text fields that may arrive as scalars.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => scalar_to_string(&v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a scalar, got {v}"))),
    }
}
