use std::path::Path;

use anyhow::Context;
use rand::Rng;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::ingest::normalize::tie_breakers;
use crate::store::{DocumentStore, BANTER_COLLECTION};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BanterSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Imports a JSON array of free-form banter objects (e.g. trash talk or
/// congratulations) into the `banter` collection. Each object is tagged with
/// `type` and the usual tie-breakers and stored under a generated key.
pub async fn import_banter<R: Rng>(
    store: &dyn DocumentStore,
    input: &Path,
    banter_type: &str,
    dry_run: bool,
    rng: &mut R,
) -> Result<BanterSummary, AppError> {
    let text = tokio::fs::read_to_string(input).await?;
    let items: Vec<Value> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array", input.display()))?;

    let mut summary = BanterSummary::default();
    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(mut fields) = item else {
            warn!("Skipping banter item {}: not a JSON object", index);
            summary.skipped += 1;
            continue;
        };

        let [random_1, random_2, random_3] = tie_breakers(rng);
        fields.insert("random_1".into(), random_1.into());
        fields.insert("random_2".into(), random_2.into());
        fields.insert("random_3".into(), random_3.into());
        fields.insert("type".into(), banter_type.into());

        if dry_run {
            let doc = Value::Object(fields);
            info!("Dry run, not storing banter: {}", doc);
        } else {
            let key = store.add(BANTER_COLLECTION, &fields).await?;
            info!("Stored {} banter {}", banter_type, key);
        }
        summary.imported += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use futures::TryStreamExt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[tokio::test]
    async fn test_import_tags_and_randomizes_each_object() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("trash.json");
        std::fs::write(
            &input,
            r#"[{"text":"Is that all you got?"}, 7, {"text":"Too slow!"}]"#,
        )
        .unwrap();
        let store = MemoryStore::new();
        let mut rng = StdRng::seed_from_u64(3);

        let summary = import_banter(&store, &input, "trash", false, &mut rng)
            .await
            .unwrap();
        assert_eq!(summary, BanterSummary { imported: 2, skipped: 1 });

        let docs: Vec<_> = store.stream_all(BANTER_COLLECTION).try_collect().await.unwrap();
        assert_eq!(docs.len(), 2);
        for doc in docs {
            assert_eq!(doc.data["type"], "trash");
            assert!(doc.data["random_1"].is_u64());
            assert!(doc.data["random_3"].is_u64());
        }
    }

    #[tokio::test]
    async fn test_dry_run_and_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("congrats.json");
        std::fs::write(&input, r#"[{"text":"Nice one!"}]"#).unwrap();
        let store = MemoryStore::new();
        let mut rng = StdRng::seed_from_u64(3);

        let summary = import_banter(&store, &input, "congrats", true, &mut rng)
            .await
            .unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(store.count(BANTER_COLLECTION), 0);

        std::fs::write(&input, "not json").unwrap();
        let err = import_banter(&store, &input, "congrats", false, &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
