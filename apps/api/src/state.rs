use std::sync::Arc;

use crate::llm_gateway::LlmGateway;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Employee snapshot, loaded once at startup and never mutated afterwards.
    pub store: Arc<RecordStore>,
    /// Chat-completion backend, chosen once at startup from configuration.
    pub llm: Arc<dyn LlmGateway>,
}
