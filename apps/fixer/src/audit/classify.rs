use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::audit::prompts::{SCORING_EXAMPLES, SCORING_INSTRUCTION};
use crate::audit::review::{
    parse_score, store_score, unparseable_if_empty, AuditSummary, ReviewOutcome, AUDIT_PARAMS,
};
use crate::errors::AppError;
use crate::llm_client::complete;
use crate::llm_client::prompts::build_prompt;
use crate::models::trivia::TriviaRecord;
use crate::state::AppState;
use crate::store::TRIVIA_COLLECTION;

/// Scores every unreviewed record with a single stateless call each.
///
/// Only feedback is written. Questions and review flags are left alone, so a
/// later audit still picks these records up.
pub async fn run_classify(state: &AppState, dry_run: bool) -> Result<AuditSummary, AppError> {
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

        match classify_record(state, &record, dry_run).await {
            Ok(outcome) => summary.record(outcome),
            Err(e) if e.is_record_scoped() => {
                error!("Classification of {} skipped: {}", record.content_id, e);
                summary.unparseable += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Classification complete: {} scanned, {} scored ({} problems), {} unparseable",
        summary.scanned, summary.scored, summary.problems, summary.unparseable
    );
    Ok(summary)
}

async fn classify_record(
    state: &AppState,
    record: &TriviaRecord,
    dry_run: bool,
) -> Result<ReviewOutcome, AppError> {
    let prompt = build_prompt(SCORING_INSTRUCTION, &SCORING_EXAMPLES, &record.question);
    let text = complete(state.llm.as_ref(), &state.config.retry, &prompt, AUDIT_PARAMS)
        .await
        .map_err(unparseable_if_empty)?;
    debug!("Classification of {}: {}", record.content_id, text);

    let score = parse_score(&text)?;
    let problem = store_score(state.store.as_ref(), record, &score, dry_run).await?;
    Ok(ReviewOutcome::Scored { problem })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::audit::prompts::REVIEWER_ID;
    use crate::config::Config;
    use crate::llm_client::testing::ScriptedModel;
    use crate::store::{content_id, fields, DocumentStore, MemoryStore, FEEDBACK_COLLECTION};
    use serde_json::json;

    async fn seed(store: &MemoryStore, question: &str) -> String {
        let key = content_id(question);
        let doc = json!({
            "category_id": "SCIENCE",
            "lang": "en",
            "question": question,
            "answers": ["Oxygen", "Helium"],
            "correct_answer": "Oxygen",
            "content_id": key,
            "random_1": 1, "random_2": 2, "random_3": 3,
            "proofed": false,
        });
        store.create(TRIVIA_COLLECTION, &key, &fields(doc)).await.unwrap();
        key
    }

    #[tokio::test]
    async fn test_classify_writes_feedback_only() {
        let store = Arc::new(MemoryStore::new());
        let key = seed(&store, "The Oxygen atom has eight protons").await;
        let model = Arc::new(ScriptedModel::new(vec![Ok(
            r#"{"humor": "low", "age_level": "teen", "accuracy": "false"}"#.to_string(),
        )]));
        let state = AppState {
            store: store.clone(),
            llm: model.clone(),
            config: Config::default(),
        };

        let summary = run_classify(&state, false).await.unwrap();
        assert_eq!(summary.scored, 1);
        assert_eq!(summary.problems, 1);
        // no leakage rewrite in this mode
        assert_eq!(summary.rewritten, 0);

        let request = &model.requests()[0];
        assert!(request.system.is_none());
        assert_eq!(request.messages.len(), 1);
        assert!(request.messages[0].content.contains("EXAMPLES:"));
        assert!(request.messages[0]
            .content
            .ends_with("INPUT:\nThe Oxygen atom has eight protons"));

        let doc = store.get(TRIVIA_COLLECTION, &key).await.unwrap().unwrap();
        assert_eq!(doc.data["proofed"], false);
        assert!(doc.data.get("to_review").is_none());
        assert_eq!(doc.data["question"], "The Oxygen atom has eight protons");

        let feedback = store.get(FEEDBACK_COLLECTION, REVIEWER_ID).await.unwrap().unwrap();
        assert_eq!(feedback.data[&key]["accuracy"], "false");
    }

    #[tokio::test]
    async fn test_empty_reply_is_record_scoped() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "Which gas do plants release?").await;
        seed(&store, "Which gas do we exhale?").await;
        let model = Arc::new(ScriptedModel::new(vec![
            Ok("   ".to_string()),
            Ok(r#"{"humor": "low"}"#.to_string()),
        ]));
        let state = AppState {
            store: store.clone(),
            llm: model,
            config: Config::default(),
        };

        let summary = run_classify(&state, false).await.unwrap();
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.unparseable, 1);
        assert_eq!(summary.scored, 1);
    }
}
