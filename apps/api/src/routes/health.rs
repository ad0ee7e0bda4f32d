use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Reports whether each collaborator loaded. "degraded" means /predict will fail.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let embeddings_loaded = state.predictor.embeddings_loaded();
    let classifier_loaded = state.predictor.classifier_loaded();
    let status = if embeddings_loaded && classifier_loaded {
        "healthy"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "service": "predictor",
        "embedding_model": state.config.embedding_model,
        "embeddings_model_loaded": embeddings_loaded,
        "prediction_model_loaded": classifier_loaded
    }))
}
