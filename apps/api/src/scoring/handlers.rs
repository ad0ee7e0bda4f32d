//! Axum route handlers for the Prediction API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::errors::AppError;
use crate::models::application::ApplicationData;
use crate::models::prediction::PredictResponse;
use crate::state::AppState;

/// POST /predict
///
/// Scores one application against its job posting. Bodies that do not match the
/// `ApplicationData` schema are rejected before the pipeline runs.
pub async fn handle_predict(
    State(state): State<AppState>,
    payload: Result<Json<ApplicationData>, JsonRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let Json(application) = payload?;

    let result = state.predictor.predict(&application).await?;

    Ok(Json(PredictResponse {
        success: true,
        result,
    }))
}
