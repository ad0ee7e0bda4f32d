use std::sync::Arc;

use crate::config::Config;
use crate::scoring::predictor::Predictor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Built once at startup; collaborators inside are read-only.
    pub predictor: Arc<Predictor>,
}
