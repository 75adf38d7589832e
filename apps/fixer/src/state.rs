use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ChatModel;
use crate::store::DocumentStore;

/// Dependencies constructed once by `main` and handed to each run mode.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub llm: Arc<dyn ChatModel>,
    pub config: Config,
}
