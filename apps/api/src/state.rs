use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::matching::scoring::MatchScorer;
use crate::notifications::Notifier;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Pluggable relevance scorer. Default: HeuristicScorer.
    pub scorer: Arc<dyn MatchScorer>,
    /// In-app store, plus mail when SMTP is configured.
    pub notifier: Arc<dyn Notifier>,
}
