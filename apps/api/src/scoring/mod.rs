// Fit prediction pipeline.
// Implements: text normalization, JD distilling, years extraction, feature building,
// score fusion and calibration. Embedding and classification go through the
// `Embedder` / `Classifier` traits only.

pub mod calibration;
pub mod distill;
pub mod duration;
pub mod features;
pub mod handlers;
pub mod normalize;
pub mod predictor;

use thiserror::Error;

use crate::classifier::ClassifierError;
use crate::embeddings::EmbeddingError;

/// Failures inside the pipeline once both collaborators are present.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("embedding failed for {block} text: {source}")]
    Embedding {
        block: &'static str,
        #[source]
        source: EmbeddingError,
    },

    #[error("classification failed: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("predicted class {0} has no score anchor")]
    UnknownClass(usize),

    #[error("no probability reported for class {class} ({len} probabilities)")]
    MissingProbability { class: usize, len: usize },
}
