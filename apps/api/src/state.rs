use std::sync::Arc;

use sqlx::PgPool;

use crate::analysis::orchestrator::ResumeRanker;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum
/// extractors. Per-request context, not a process-wide singleton: handlers
/// receive a clone and nothing here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Pluggable ranking backend. Production wires `LlmResumeRanker`;
    /// tests substitute a stub.
    pub ranker: Arc<dyn ResumeRanker>,
    pub config: Config,
}
