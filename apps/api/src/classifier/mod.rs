//! Classifier — maps a feature row to class probabilities.
//!
//! `LogisticClassifier` evaluates a multinomial logistic-regression artifact
//! exported to JSON:
//!
//! ```json
//! {
//!   "classes": [0, 1, 2],
//!   "feature_names": ["XpYears", "JobYears", "..."],
//!   "coefficients": [[...], [...], [...]],
//!   "intercepts": [0.1, -0.2, 0.1]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::features::FeatureRow;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("cannot read classifier artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("classifier artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid classifier artifact: {0}")]
    InvalidArtifact(String),

    #[error("feature row has {found} columns, classifier expects {expected}")]
    ColumnCount { expected: usize, found: usize },

    #[error("feature column {position} is '{found}', classifier expects '{expected}'")]
    SchemaMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("classifier produced no probabilities")]
    EmptyProbabilities,
}

/// A trained classifier. Read-only after construction and shared across requests.
pub trait Classifier: Send + Sync {
    /// One probability per class, indexed by class.
    fn predict_proba(&self, row: &FeatureRow) -> Result<Vec<f64>, ClassifierError>;

    /// Most probable class; the first one wins ties.
    fn predict(&self, row: &FeatureRow) -> Result<usize, ClassifierError> {
        argmax(&self.predict_proba(row)?).ok_or(ClassifierError::EmptyProbabilities)
    }
}

fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticArtifact {
    pub classes: Vec<usize>,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

/// Multinomial logistic regression: softmax(W·x + b).
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    artifact: LogisticArtifact,
}

impl LogisticClassifier {
    /// Reads and validates the artifact at `path`.
    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ClassifierError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_artifact(serde_json::from_str(&raw)?)
    }

    pub fn from_artifact(artifact: LogisticArtifact) -> Result<Self, ClassifierError> {
        let n_classes = artifact.classes.len();
        let n_features = artifact.feature_names.len();

        if n_classes < 2 {
            return Err(ClassifierError::InvalidArtifact(format!(
                "expected at least 2 classes, found {n_classes}"
            )));
        }
        // Class labels double as probability indices downstream.
        if artifact.classes.iter().enumerate().any(|(i, &c)| i != c) {
            return Err(ClassifierError::InvalidArtifact(format!(
                "classes must be 0..{n_classes} in order, found {:?}",
                artifact.classes
            )));
        }
        if artifact.coefficients.len() != n_classes || artifact.intercepts.len() != n_classes {
            return Err(ClassifierError::InvalidArtifact(format!(
                "{n_classes} classes but {} coefficient rows and {} intercepts",
                artifact.coefficients.len(),
                artifact.intercepts.len()
            )));
        }
        if let Some(row) = artifact
            .coefficients
            .iter()
            .position(|r| r.len() != n_features)
        {
            return Err(ClassifierError::InvalidArtifact(format!(
                "coefficient row {row} has {} weights for {n_features} features",
                artifact.coefficients[row].len()
            )));
        }

        Ok(Self { artifact })
    }

    pub fn n_classes(&self) -> usize {
        self.artifact.classes.len()
    }

    pub fn n_features(&self) -> usize {
        self.artifact.feature_names.len()
    }

    fn check_columns(&self, columns: &[String]) -> Result<(), ClassifierError> {
        let expected = &self.artifact.feature_names;
        if columns.len() != expected.len() {
            return Err(ClassifierError::ColumnCount {
                expected: expected.len(),
                found: columns.len(),
            });
        }
        match expected.iter().zip(columns).position(|(e, f)| e != f) {
            Some(position) => Err(ClassifierError::SchemaMismatch {
                position,
                expected: expected[position].clone(),
                found: columns[position].clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Classifier for LogisticClassifier {
    fn predict_proba(&self, row: &FeatureRow) -> Result<Vec<f64>, ClassifierError> {
        self.check_columns(&row.column_names())?;
        let x = row.values();

        let logits: Vec<f64> = self
            .artifact
            .coefficients
            .iter()
            .zip(&self.artifact.intercepts)
            .map(|(w, b)| w.iter().zip(&x).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();

        Ok(softmax(&logits))
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn tiny_row() -> FeatureRow {
        FeatureRow {
            xp_years: 3.0,
            job_years: 2.0,
            sim_cert_job: 0.5,
            sim_major_job: 0.4,
            sim_xp_job: 0.9,
            score_combinado: 0.65,
            job_emb: vec![1.0],
            cert_emb: vec![0.0],
            major_emb: vec![0.5],
            xp_emb: vec![-0.5],
        }
    }

    /// Artifact whose only non-zero weight is on `sim_xp_job`.
    fn tiny_artifact() -> LogisticArtifact {
        let feature_names = tiny_row().column_names();
        let n = feature_names.len();
        let mut strong = vec![0.0; n];
        strong[4] = 10.0;
        LogisticArtifact {
            classes: vec![0, 1, 2],
            feature_names,
            coefficients: vec![vec![0.0; n], vec![0.0; n], strong],
            intercepts: vec![0.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_probabilities_sum_to_one_and_favor_weighted_class() {
        let clf = LogisticClassifier::from_artifact(tiny_artifact()).unwrap();
        let probs = clf.predict_proba(&tiny_row()).unwrap();

        assert_eq!(probs.len(), 3);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((probs[0] - probs[1]).abs() < 1e-12);
        assert_eq!(clf.predict(&tiny_row()).unwrap(), 2);
    }

    #[test]
    fn test_softmax_is_stable_for_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-12);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), Some(0));
        assert_eq!(argmax(&[0.1, 0.2, 0.7]), Some(2));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_column_count_mismatch() {
        let clf = LogisticClassifier::from_artifact(tiny_artifact()).unwrap();
        let mut row = tiny_row();
        row.xp_emb.push(0.1);
        assert!(matches!(
            clf.predict_proba(&row),
            Err(ClassifierError::ColumnCount {
                expected: 10,
                found: 11
            })
        ));
    }

    #[test]
    fn test_column_name_mismatch_reports_position() {
        let mut artifact = tiny_artifact();
        artifact.feature_names[6] = "cert__emb_0".to_string();
        let clf = LogisticClassifier::from_artifact(artifact).unwrap();
        match clf.predict_proba(&tiny_row()) {
            Err(ClassifierError::SchemaMismatch {
                position,
                expected,
                found,
            }) => {
                assert_eq!(position, 6);
                assert_eq!(expected, "cert__emb_0");
                assert_eq!(found, "job__emb_0");
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_misshapen_artifacts() {
        let mut artifact = tiny_artifact();
        artifact.intercepts.pop();
        assert!(matches!(
            LogisticClassifier::from_artifact(artifact),
            Err(ClassifierError::InvalidArtifact(_))
        ));

        let mut artifact = tiny_artifact();
        artifact.coefficients[1].pop();
        assert!(matches!(
            LogisticClassifier::from_artifact(artifact),
            Err(ClassifierError::InvalidArtifact(_))
        ));

        let mut artifact = tiny_artifact();
        artifact.classes = vec![1, 2, 3];
        assert!(matches!(
            LogisticClassifier::from_artifact(artifact),
            Err(ClassifierError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifier.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(serde_json::to_string(&tiny_artifact()).unwrap().as_bytes())
            .unwrap();

        let clf = LogisticClassifier::load(&path).unwrap();
        assert_eq!(clf.n_classes(), 3);
        assert_eq!(clf.n_features(), 10);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(
            LogisticClassifier::load(&path),
            Err(ClassifierError::Io { .. })
        ));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifier.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            LogisticClassifier::load(&path),
            Err(ClassifierError::Parse(_))
        ));
    }
}
