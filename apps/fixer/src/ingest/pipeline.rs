//! Ingestion: corrects raw trivia lines with the model and stores them.
//!
//! Flow per window: read lines → build prompt → session send → append raw
//! response to `.out` → repair-parse each line → normalize → upsert by content id.
//!
//! Batches run strictly in sequence. Line and record failures go to the
//! `.problems` file and never abort the batch. A model or store failure aborts
//! the run; the error log names the `--skip` offset to resume from.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::ingest::batch_reader::BatchReader;
use crate::ingest::normalize::normalize;
use crate::ingest::prompts::{INGEST_EXAMPLES, INGEST_INSTRUCTIONS, INGEST_SYSTEM};
use crate::ingest::repair::{parse_response, LineOutcome};
use crate::ingest::sink::{sink_path, LineSink};
use crate::llm_client::prompts::build_prompt;
use crate::llm_client::{ChatSession, GenerationParams, LlmError};
use crate::state::AppState;
use crate::store::{upsert_if_absent, DocumentStore, UpsertOutcome};

pub const INGEST_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.2,
    max_output_tokens: 2500,
};

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub input: PathBuf,
    /// Data lines (after the header) to skip before the first window.
    pub skip: usize,
    /// Stop after the window that brings the line count to at least this; 0 = no limit.
    pub limit: usize,
    /// Process and log, but never write to the store.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub batches: usize,
    pub lines_read: usize,
    /// Records that survived repair and normalization.
    pub records: usize,
    pub stored: usize,
    pub duplicates: usize,
    pub problems: usize,
    /// `--skip` value that resumes after the last completed batch.
    pub next_offset: usize,
}

#[derive(Debug, Default)]
struct BatchCounts {
    records: usize,
    stored: usize,
    duplicates: usize,
    problems: usize,
}

pub async fn run_ingest(
    state: &AppState,
    options: &IngestOptions,
) -> Result<IngestSummary, AppError> {
    let config = &state.config;
    let mut reader =
        BatchReader::open(&options.input, config.batch_size, options.skip).await?;
    let mut out_sink =
        LineSink::open_append(sink_path(&config.output_dir, &options.input, "out")).await?;
    let mut problem_sink =
        LineSink::open_append(sink_path(&config.output_dir, &options.input, "problems")).await?;
    info!(
        "Ingesting {} (skip {}, limit {}, dry run {}); responses → {}, problems → {}",
        options.input.display(),
        options.skip,
        options.limit,
        options.dry_run,
        out_sink.path().display(),
        problem_sink.path().display()
    );

    let mut session = ChatSession::start(
        state.llm.as_ref(),
        config.retry,
        INGEST_SYSTEM,
        &INGEST_EXAMPLES,
    );
    let mut rng = StdRng::from_entropy();
    let mut summary = IngestSummary {
        next_offset: reader.offset(),
        ..IngestSummary::default()
    };

    loop {
        let start_offset = reader.offset();
        let window = reader.next_window().await.map_err(|e| {
            error!(
                "Reading the batch at offset {} failed: {}. Resume with --skip {}",
                start_offset, e, start_offset
            );
            e
        })?;
        if window.is_empty() {
            break;
        }
        info!("Processing a batch starting at offset {}...", start_offset);

        let window_text = window.concat();
        debug!("Submitting to model: input {}", window_text);
        let prompt = build_prompt(INGEST_INSTRUCTIONS, &INGEST_EXAMPLES, &window_text);

        let counts = match session.send(&prompt, INGEST_PARAMS).await {
            Ok(response) => {
                debug!("Response from model: {}", response);
                out_sink.append(&response).await?;
                process_response(
                    state.store.as_ref(),
                    &response,
                    &mut problem_sink,
                    &mut rng,
                    options.dry_run,
                )
                .await
                .map_err(|e| {
                    error!(
                        "Batch at offset {} aborted: {}. Resume with --skip {}",
                        start_offset, e, start_offset
                    );
                    e
                })?
            }
            Err(LlmError::EmptyContent) => {
                warn!(
                    "Model returned no content for the batch at offset {}; routing its lines to {}",
                    start_offset,
                    problem_sink.path().display()
                );
                for line in &window {
                    problem_sink.append(line.trim_end()).await?;
                }
                BatchCounts {
                    problems: window.len(),
                    ..BatchCounts::default()
                }
            }
            Err(e) => {
                error!(
                    "Model call for the batch at offset {} failed: {}. Resume with --skip {}",
                    start_offset, e, start_offset
                );
                return Err(e.into());
            }
        };

        summary.batches += 1;
        summary.lines_read += window.len();
        summary.records += counts.records;
        summary.stored += counts.stored;
        summary.duplicates += counts.duplicates;
        summary.problems += counts.problems;
        summary.next_offset = reader.offset();
        info!(
            "Batch done: {} records, {} stored, {} duplicates, {} problems; resume offset {}",
            counts.records, counts.stored, counts.duplicates, counts.problems, summary.next_offset
        );

        if options.limit > 0 && summary.lines_read >= options.limit {
            info!("Bailing after {} lines", summary.lines_read);
            break;
        }
    }

    Ok(summary)
}

/// Repairs, normalizes and stores every line of one model response.
async fn process_response<R: Rng>(
    store: &dyn DocumentStore,
    response: &str,
    problems: &mut LineSink,
    rng: &mut R,
    dry_run: bool,
) -> Result<BatchCounts, AppError> {
    let mut counts = BatchCounts::default();

    for outcome in parse_response(response) {
        let (raw, value) = match outcome {
            LineOutcome::Record { raw, value } => (raw, value),
            LineOutcome::Malformed { raw, reason } => {
                error!("Could not parse line '{}': {}", raw, reason);
                problems.append(&raw).await?;
                counts.problems += 1;
                continue;
            }
        };

        let record = match normalize(value, rng) {
            Ok(record) => record,
            Err(e) => {
                error!("{}", e.into_app_error(&raw));
                problems.append(&raw).await?;
                counts.problems += 1;
                continue;
            }
        };
        counts.records += 1;

        if dry_run {
            info!(
                "Dry run, not storing {}: '{}'",
                record.content_id, record.question
            );
            continue;
        }

        match upsert_if_absent(store, &record).await? {
            UpsertOutcome::Inserted => counts.stored += 1,
            UpsertOutcome::Duplicate => counts.duplicates += 1,
        }
    }

    Ok(counts)
}
