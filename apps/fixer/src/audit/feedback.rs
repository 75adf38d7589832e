use futures::StreamExt;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::feedback::FeedbackEntry;
use crate::store::{DocumentStore, FEEDBACK_COLLECTION, TRIVIA_COLLECTION};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackSummary {
    pub reviewers: usize,
    pub entries: usize,
    /// Content ids of entries classified as problems, in scan order.
    pub escalated: Vec<String>,
    pub undecodable: usize,
}

/// Read-only pass over every reviewer's feedback. Problems are escalated by
/// logging the referenced trivia record at warn level.
pub async fn aggregate_feedback(store: &dyn DocumentStore) -> Result<FeedbackSummary, AppError> {
    let mut summary = FeedbackSummary::default();
    let mut docs = store.stream_all(FEEDBACK_COLLECTION);

    while let Some(doc) = docs.next().await {
        let doc = doc?;
        summary.reviewers += 1;
        let Some(entries) = doc.data.as_object() else {
            continue;
        };
        info!("Feedback from {} ({} entries)", doc.key, entries.len());

        for (content_id, raw) in entries {
            summary.entries += 1;
            let entry: FeedbackEntry = match serde_json::from_value(raw.clone()) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Unreadable feedback {}/{}: {}", doc.key, content_id, e);
                    summary.undecodable += 1;
                    continue;
                }
            };

            if !entry.is_problem() {
                info!("{} {}: {:?}", entry.label(), content_id, entry.score);
                continue;
            }

            match store.get(TRIVIA_COLLECTION, content_id).await? {
                Some(trivia) => warn!(
                    "Problem reported by {} for {}: {:?} trivia: {}",
                    doc.key, content_id, entry.score.problem, trivia.data
                ),
                None => warn!(
                    "Problem reported by {} for {} but the trivia record is missing",
                    doc.key, content_id
                ),
            }
            summary.escalated.push(content_id.clone());
        }
    }

    info!(
        "Feedback scan: {} reviewers, {} entries, {} escalated, {} unreadable",
        summary.reviewers,
        summary.entries,
        summary.escalated.len(),
        summary.undecodable
    );
    Ok(summary)
}
