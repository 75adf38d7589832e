use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::RetryPolicy;

/// Application configuration loaded from environment variables.
/// Credentials are optional here and demanded by the modes that need them.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    /// Lines per model call.
    pub batch_size: usize,
    /// Where `<input>.out` and `<input>.problems` are appended.
    pub output_dir: PathBuf,
    pub retry: RetryPolicy,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            anthropic_api_key: None,
            batch_size: 10,
            output_dir: PathBuf::from("."),
            retry: RetryPolicy::default(),
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            batch_size: parse_env("BATCH_SIZE", defaults.batch_size)?,
            output_dir: optional_env("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            retry: RetryPolicy {
                max_attempts: parse_env("LLM_MAX_ATTEMPTS", defaults.retry.max_attempts)?,
                base_delay: Duration::from_millis(parse_env(
                    "LLM_BACKOFF_BASE_MS",
                    defaults.retry.base_delay.as_millis() as u64,
                )?),
                max_delay: Duration::from_millis(parse_env(
                    "LLM_BACKOFF_MAX_MS",
                    defaults.retry.max_delay.as_millis() as u64,
                )?),
            },
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }

    pub fn require_api_key(&self) -> Result<String> {
        self.anthropic_api_key
            .clone()
            .context("Required environment variable 'ANTHROPIC_API_KEY' is not set")
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
