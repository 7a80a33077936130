use std::sync::Arc;

use crate::chat::ChatBackend;
use crate::config::Config;
use crate::documents::DocumentRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub documents: DocumentRegistry,
    /// Chat fan-out backend. `LlmClient` in production.
    pub chat: Arc<dyn ChatBackend>,
}
