//! Score fusion (an auxiliary classifier feature) and calibration of the
//! classifier output into a continuous 0–100 score.

use crate::scoring::features::FeatureRow;
use crate::scoring::ScoringError;

/// Score anchor per class index: class 0 -> 34, class 1 -> 67, class 2 -> 100.
pub const CLASS_ANCHORS: [f64; 3] = [34.0, 67.0, 100.0];

/// Applied to the fused score when the posting asks for more years than the candidate has.
pub const UNDER_EXPERIENCE_PENALTY: f64 = 0.85;

#[derive(Debug, Clone)]
pub struct FusionWeights {
    pub experience: f64,
    pub major: f64,
    pub certifications: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            experience: 0.5,
            major: 0.3,
            certifications: 0.2,
        }
    }
}

/// Fused score: 0.5*sim_xp_job + 0.3*sim_major_job + 0.2*sim_cert_job,
/// times 0.85 when JobYears > XpYears.
///
/// The classifier was trained on unclamped values, so negative similarities
/// pass straight through.
pub fn fuse(row: &FeatureRow) -> f64 {
    fuse_with(row, &FusionWeights::default())
}

pub fn fuse_with(row: &FeatureRow, weights: &FusionWeights) -> f64 {
    let penalty = if row.job_years > row.xp_years {
        UNDER_EXPERIENCE_PENALTY
    } else {
        1.0
    };

    let score = weights.experience * row.sim_xp_job
        + weights.major * row.sim_major_job
        + weights.certifications * row.sim_cert_job;

    score * penalty
}

/// Interpolates between the previous class anchor and the predicted class anchor
/// by the predicted class probability. Class 0 scales from zero.
pub fn calibrate(class: usize, probabilities: &[f64]) -> Result<f64, ScoringError> {
    let current = *CLASS_ANCHORS
        .get(class)
        .ok_or(ScoringError::UnknownClass(class))?;
    let p = *probabilities
        .get(class)
        .ok_or(ScoringError::MissingProbability {
            class,
            len: probabilities.len(),
        })?;

    if class == 0 {
        return Ok(current * p);
    }

    let previous = CLASS_ANCHORS[class - 1];
    Ok(previous + (current - previous) * p)
}

/// Rounds a calibrated value to the integer score returned to callers.
pub fn to_score(calibrated: f64) -> u32 {
    calibrated.round().clamp(0.0, 100.0) as u32
}
