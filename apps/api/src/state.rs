use std::sync::Arc;

use crate::config::Config;
use crate::interview::controller::TurnController;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<TurnController>,
    /// Same generator the interview pipeline uses. Screening calls it directly.
    pub generator: Arc<dyn TextGenerator>,
    pub config: Config,
}
