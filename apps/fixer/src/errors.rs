use thiserror::Error;

use crate::llm_client::LlmError;
use crate::store::StoreError;

/// Application-level error type.
///
/// Per-line and per-record variants (`MalformedRecord`, `MissingRequiredField`,
/// `ModelResponseUnparseable`) are logged and routed to the problem sink by the
/// caller; they never abort the batch or scan that produced them. The remaining
/// variants abort the run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Malformed record: {reason} (line: {line})")]
    MalformedRecord { line: String, reason: String },

    #[error("Missing required field '{field}' (line: {line})")]
    MissingRequiredField { field: &'static str, line: String },

    #[error("Model quota exceeded after {attempts} attempts")]
    ModelQuotaExceeded { attempts: u32 },

    #[error("Unparseable model response: {reason} (text: {text})")]
    ModelResponseUnparseable { text: String, reason: String },

    #[error("LLM error: {0}")]
    Llm(LlmError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::RateLimited { retries } => AppError::ModelQuotaExceeded { attempts: retries },
            other => AppError::Llm(other),
        }
    }
}

impl AppError {
    /// True for failures scoped to a single line or record.
    pub fn is_record_scoped(&self) -> bool {
        matches!(
            self,
            AppError::MalformedRecord { .. }
                | AppError::MissingRequiredField { .. }
                | AppError::ModelResponseUnparseable { .. }
        )
    }
}
