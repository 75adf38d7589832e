//! Audit loop: rescans unreviewed trivia and drives each record to a reviewed state.
//!
//! UNPROOFED ─┬─ answer leaks into question ─→ rewrite question, to_review=true
//!            └─ otherwise → model score ─→ feedback merged, then
//!                                           proofed=true (clean) or to_review=true (problem)
//!
//! Reviewed records are never rescanned, so repeated runs converge. An
//! unparseable score skips only that record and writes nothing for it.

use chrono::Utc;
use futures::StreamExt;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::audit::leakage::{answer_leaks, blank_out};
use crate::audit::prompts::{AUDIT_SYSTEM, REVIEWER_ID, SCORING_EXAMPLES, SCORING_INSTRUCTION};
use crate::errors::AppError;
use crate::llm_client::{strip_json_fences, ChatSession, GenerationParams, LlmError};
use crate::models::feedback::{FeedbackEntry, ScoreReport};
use crate::models::trivia::TriviaRecord;
use crate::state::AppState;
use crate::store::{fields, DocumentStore, FEEDBACK_COLLECTION, TRIVIA_COLLECTION};

pub const AUDIT_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.2,
    max_output_tokens: 1024,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    AlreadyReviewed,
    LeakRewritten,
    Scored { problem: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub scanned: usize,
    pub skipped: usize,
    pub rewritten: usize,
    pub scored: usize,
    pub problems: usize,
    pub unparseable: usize,
}

impl AuditSummary {
    pub(crate) fn record(&mut self, outcome: ReviewOutcome) {
        match outcome {
            ReviewOutcome::AlreadyReviewed => self.skipped += 1,
            ReviewOutcome::LeakRewritten => self.rewritten += 1,
            ReviewOutcome::Scored { problem } => {
                self.scored += 1;
                if problem {
                    self.problems += 1;
                }
            }
        }
    }
}

pub async fn run_audit(state: &AppState, dry_run: bool) -> Result<AuditSummary, AppError> {
    let store = state.store.as_ref();
    let mut summary = AuditSummary::default();
    let mut docs = store.stream_unreviewed(TRIVIA_COLLECTION);

    while let Some(doc) = docs.next().await {
        let doc = doc?;
        summary.scanned += 1;
        let mut record: TriviaRecord = match doc.decode() {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping document that is not a trivia record: {}", e);
                summary.skipped += 1;
                continue;
            }
        };
        record.content_id = doc.key;
        debug!("Checking question {}", record.content_id);

        match review_record(state, &record, dry_run).await {
            Ok(outcome) => summary.record(outcome),
            Err(e) if e.is_record_scoped() => {
                error!("Review of {} skipped: {}", record.content_id, e);
                summary.unparseable += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Audit complete: {} scanned, {} rewritten, {} scored ({} problems), {} unparseable, {} skipped",
        summary.scanned,
        summary.rewritten,
        summary.scored,
        summary.problems,
        summary.unparseable,
        summary.skipped
    );
    Ok(summary)
}

pub async fn review_record(
    state: &AppState,
    record: &TriviaRecord,
    dry_run: bool,
) -> Result<ReviewOutcome, AppError> {
    if record.is_reviewed() {
        debug!("Question {} already reviewed, skipping", record.content_id);
        return Ok(ReviewOutcome::AlreadyReviewed);
    }
    let store = state.store.as_ref();

    if answer_leaks(&record.question, &record.correct_answer) {
        warn!(
            "Found answer in question: \"{}\" ({}) ({})",
            record.question, record.correct_answer, record.content_id
        );
        let rewritten = blank_out(&record.question, &record.correct_answer);
        info!("New question: \"{}\"", rewritten);
        if !dry_run {
            store
                .update(
                    TRIVIA_COLLECTION,
                    &record.content_id,
                    &fields(json!({ "question": rewritten, "to_review": true })),
                )
                .await?;
        }
        return Ok(ReviewOutcome::LeakRewritten);
    }

    let mut session = ChatSession::start(
        state.llm.as_ref(),
        state.config.retry,
        AUDIT_SYSTEM,
        &SCORING_EXAMPLES,
    );
    let prompt = format!("{SCORING_INSTRUCTION}\n\n{}", record.question);
    let text = session
        .send(&prompt, AUDIT_PARAMS)
        .await
        .map_err(unparseable_if_empty)?;
    debug!(
        "Response from model for '{}' ({}): {}",
        record.question, record.content_id, text
    );

    let score = parse_score(&text)?;
    let problem = store_score(store, record, &score, dry_run).await?;
    if !dry_run {
        let flag = if problem { "to_review" } else { "proofed" };
        let mut partial = Map::new();
        partial.insert(flag.to_string(), Value::Bool(true));
        store
            .update(TRIVIA_COLLECTION, &record.content_id, &partial)
            .await?;
    }
    Ok(ReviewOutcome::Scored { problem })
}

/// An empty completion is a bad answer for this record, not a failed call.
pub(crate) fn unparseable_if_empty(err: LlmError) -> AppError {
    match err {
        LlmError::EmptyContent => AppError::ModelResponseUnparseable {
            text: String::new(),
            reason: "empty response".to_string(),
        },
        other => other.into(),
    }
}

/// Parses the model's verdict, tolerating code fences around the JSON.
pub fn parse_score(text: &str) -> Result<ScoreReport, AppError> {
    let report: ScoreReport = serde_json::from_str(strip_json_fences(text)).map_err(|e| {
        AppError::ModelResponseUnparseable {
            text: text.to_string(),
            reason: e.to_string(),
        }
    })?;
    if report.is_empty() {
        return Err(AppError::ModelResponseUnparseable {
            text: text.to_string(),
            reason: "no scoring fields".to_string(),
        });
    }
    Ok(report)
}

/// Merges the verdict into the robot's feedback document. Returns whether it flags a problem.
pub(crate) async fn store_score(
    store: &dyn DocumentStore,
    record: &TriviaRecord,
    score: &ScoreReport,
    dry_run: bool,
) -> Result<bool, AppError> {
    let problem = score.is_problem();
    if problem {
        warn!("Found problem with question {}", record.content_id);
    }

    let entry = FeedbackEntry::from_review(score.clone(), &record.question, Utc::now());
    if dry_run {
        info!("Dry run, not storing feedback for {}: {:?}", record.content_id, entry);
        return Ok(problem);
    }

    let entry = serde_json::to_value(&entry).map_err(anyhow::Error::from)?;
    let mut partial = Map::new();
    partial.insert(record.content_id.clone(), entry);
    store.merge(FEEDBACK_COLLECTION, REVIEWER_ID, &partial).await?;
    Ok(problem)
}
