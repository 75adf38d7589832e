mod audit;
mod config;
mod db;
mod errors;
mod ingest;
mod llm_client;
mod models;
mod state;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::audit::classify::run_classify;
use crate::audit::feedback::aggregate_feedback;
use crate::audit::review::run_audit;
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::ingest::banter::import_banter;
use crate::ingest::pipeline::{run_ingest, IngestOptions};
use crate::llm_client::LlmClient;
use crate::state::AppState;
use crate::store::{DocumentStore, MemoryStore, PgDocumentStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Correct and store trivia from a line-delimited file.
    Ingest,
    /// Score unreviewed trivia without touching the records.
    Classify,
    /// Review unproofed trivia, then report escalated feedback.
    Audit,
    /// Import a JSON array of banter objects.
    Banter,
}

#[derive(Debug, Parser)]
#[command(name = "trivia-fixer", version, about = "Trivia correction and ingestion pipeline")]
struct Cli {
    /// Input file (line-delimited trivia for ingest, JSON array for banter)
    #[arg(long)]
    filename: Option<PathBuf>,

    /// Process and log, but do not write to the store
    #[arg(long, alias = "dry-run")]
    nodb: bool,

    /// Stop after roughly this many input lines; 0 for no limit
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Data lines to skip before the first batch, for resuming
    #[arg(long, default_value_t = 0)]
    skip: usize,

    #[arg(long, value_enum, default_value = "ingest")]
    mode: Mode,

    /// Banter `type` tag, e.g. trash or congrats
    #[arg(long, default_value = "trash")]
    banter_type: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting trivia-fixer v{} ({:?})", env!("CARGO_PKG_VERSION"), cli.mode);

    let store = build_store(&config, cli.nodb).await?;

    match cli.mode {
        Mode::Banter => {
            let input = required_input(&cli)?;
            let mut rng = StdRng::from_entropy();
            let summary =
                import_banter(store.as_ref(), &input, &cli.banter_type, cli.nodb, &mut rng)
                    .await?;
            info!(
                "Banter import: {} imported, {} skipped",
                summary.imported, summary.skipped
            );
        }
        Mode::Ingest => {
            let options = IngestOptions {
                input: required_input(&cli)?,
                skip: cli.skip,
                limit: cli.limit,
                dry_run: cli.nodb,
            };
            let state = model_state(store, config)?;
            let summary = run_ingest(&state, &options).await?;
            info!(
                "Ingest done: {} batches, {} records, {} stored, {} duplicates, {} problems; \
                 resume with --skip {}",
                summary.batches,
                summary.records,
                summary.stored,
                summary.duplicates,
                summary.problems,
                summary.next_offset
            );
        }
        Mode::Classify => {
            let state = model_state(store, config)?;
            run_classify(&state, cli.nodb).await?;
            aggregate_feedback(state.store.as_ref()).await?;
        }
        Mode::Audit => {
            let state = model_state(store, config)?;
            run_audit(&state, cli.nodb).await?;
            aggregate_feedback(state.store.as_ref()).await?;
        }
    }

    Ok(())
}

async fn build_store(config: &Config, dry_run: bool) -> Result<Arc<dyn DocumentStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            ensure_schema(&pool).await?;
            Ok(Arc::new(PgDocumentStore::new(pool)))
        }
        None if dry_run => {
            warn!("DATABASE_URL not set, using an in-memory store for this dry run");
            Ok(Arc::new(MemoryStore::new()))
        }
        None => bail!("Required environment variable 'DATABASE_URL' is not set"),
    }
}

/// Modes that talk to the model need an API key; banter import does not.
fn model_state(store: Arc<dyn DocumentStore>, config: Config) -> Result<AppState> {
    let llm = LlmClient::new(config.require_api_key()?)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    Ok(AppState {
        store,
        llm: Arc::new(llm),
        config,
    })
}

fn required_input(cli: &Cli) -> Result<PathBuf> {
    cli.filename
        .clone()
        .context("--filename is required for this mode")
}
