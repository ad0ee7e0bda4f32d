use serde::{Deserialize, Serialize};

/// Score returned for one application. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub application_id: String,
    pub score: u32, // 0 – 100
    pub probabilities: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub result: PredictionResult,
}
