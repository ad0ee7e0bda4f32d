//! Predictor — the service object that owns the two collaborators and runs one
//! application through features, classification and calibration.
//!
//! Built once at startup and carried in `AppState` behind an `Arc`. Either
//! collaborator may be missing (failed to load); every prediction then fails
//! with `AppError::ModelUnavailable` until the process is restarted.

use std::sync::Arc;

use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::embeddings::Embedder;
use crate::errors::AppError;
use crate::models::application::ApplicationData;
use crate::models::prediction::PredictionResult;
use crate::scoring::calibration::{calibrate, to_score};
use crate::scoring::features::{embed_blocks, FeatureRow, TextBlocks};
use crate::scoring::ScoringError;

#[derive(Clone)]
pub struct Predictor {
    embedder: Option<Arc<dyn Embedder>>,
    classifier: Option<Arc<dyn Classifier>>,
}

impl Predictor {
    pub fn new(
        embedder: Option<Arc<dyn Embedder>>,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> Self {
        Self {
            embedder,
            classifier,
        }
    }

    pub fn embeddings_loaded(&self) -> bool {
        self.embedder.is_some()
    }

    pub fn classifier_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    /// Builds the classifier input row for `app`.
    /// Fails before any work if either collaborator is missing.
    pub async fn build_features(&self, app: &ApplicationData) -> Result<FeatureRow, AppError> {
        let (embedder, _) = self.collaborators()?;

        let blocks = TextBlocks::from_application(app);
        debug!(
            "Text blocks for {}: xp_years={} job_years={} job_text={:?}",
            app.application_id, blocks.years, blocks.job_years, blocks.job_text
        );

        let embeddings = embed_blocks(embedder, &blocks)
            .await
            .map_err(prediction_failed)?;
        FeatureRow::assemble(&blocks, embeddings).map_err(prediction_failed)
    }

    /// Scores one application.
    pub async fn predict(&self, app: &ApplicationData) -> Result<PredictionResult, AppError> {
        let (_, classifier) = self.collaborators()?;
        let row = self.build_features(app).await?;

        let (class, probabilities) = classify(classifier, &row).map_err(prediction_failed)?;
        let calibrated = calibrate(class, &probabilities).map_err(prediction_failed)?;
        let score = to_score(calibrated);

        debug!(
            "Class: {class}, Prob: {:.3}, Calibrated: {calibrated:.2}",
            probabilities[class]
        );
        info!("Scored application {}: {score}", app.application_id);

        Ok(PredictionResult {
            application_id: app.application_id.clone(),
            score,
            probabilities,
        })
    }

    fn collaborators(&self) -> Result<(&dyn Embedder, &dyn Classifier), AppError> {
        let classifier = self.classifier.as_deref().ok_or_else(|| {
            AppError::ModelUnavailable(
                "Prediction model is not loaded. Check that the classifier artifact exists and is readable."
                    .to_string(),
            )
        })?;
        let embedder = self.embedder.as_deref().ok_or_else(|| {
            AppError::ModelUnavailable("Embeddings model is not loaded.".to_string())
        })?;
        Ok((embedder, classifier))
    }
}

fn classify(
    classifier: &dyn Classifier,
    row: &FeatureRow,
) -> Result<(usize, Vec<f64>), ScoringError> {
    let probabilities = classifier.predict_proba(row)?;
    let class = classifier.predict(row)?;
    Ok((class, probabilities))
}

fn prediction_failed(e: ScoringError) -> AppError {
    AppError::Prediction(format!("Prediction failed: {e}"))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::classifier::ClassifierError;
    use crate::embeddings::EmbeddingError;
    use crate::models::application::{Education, Experience, JobPosting, Project};

    /// Deterministic embedder: letter frequencies over a-z.
    pub struct LetterCountEmbedder {
        pub calls: AtomicUsize,
    }

    impl LetterCountEmbedder {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for LetterCountEmbedder {
        async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut v = vec![0.0_f32; 26];
            for c in text.to_lowercase().chars().filter(|c| c.is_ascii_lowercase()) {
                v[(c as u8 - b'a') as usize] += 1.0;
            }
            Ok(v)
        }
    }

    pub struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn encode(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Api {
                status: 503,
                message: "model warming up".to_string(),
            })
        }
    }

    /// Returns fixed probabilities regardless of input.
    pub struct FixedClassifier(pub Vec<f64>);

    impl Classifier for FixedClassifier {
        fn predict_proba(&self, _row: &FeatureRow) -> Result<Vec<f64>, ClassifierError> {
            Ok(self.0.clone())
        }
    }

    /// Probabilities driven by the fused score, so different inputs score differently.
    struct FusedScoreClassifier;

    impl Classifier for FusedScoreClassifier {
        fn predict_proba(&self, row: &FeatureRow) -> Result<Vec<f64>, ClassifierError> {
            let s = row.score_combinado.clamp(0.0, 1.0);
            Ok(vec![(1.0 - s) / 2.0, (1.0 - s) / 2.0, s])
        }
    }

    pub fn make_application() -> ApplicationData {
        ApplicationData {
            application_id: "app-123".to_string(),
            skills: vec!["Rust".to_string(), "Kubernetes".to_string()],
            education: Education {
                highest_level: "Master's Degree".to_string(),
                field: Some("Ingeniería de Software".to_string()),
            },
            experience: Experience {
                total_years: "3-5 years".to_string(),
                current_position: Some("Ingeniero Backend".to_string()),
                achievements: Some(vec!["Migró pagos a Rust".to_string()]),
            },
            projects: vec![Project {
                name: "Pagos".to_string(),
                description: "Servicio de pagos".to_string(),
                technologies: vec!["Rust".to_string(), "Postgres".to_string()],
            }],
            job: JobPosting {
                requirements: "Requisitos: 3 años de experiencia con Rust. Conocimiento de Kubernetes."
                    .to_string(),
                responsibilities: "Funciones: diseñar servicios de pagos.".to_string(),
            },
        }
    }

    fn predictor_with(embedder: Arc<dyn Embedder>, classifier: Arc<dyn Classifier>) -> Predictor {
        Predictor::new(Some(embedder), Some(classifier))
    }

    #[tokio::test]
    async fn test_predict_calibrates_fixed_probabilities() {
        let predictor = predictor_with(
            Arc::new(LetterCountEmbedder::new()),
            Arc::new(FixedClassifier(vec![0.1, 0.7, 0.2])),
        );

        let result = predictor.predict(&make_application()).await.unwrap();
        assert_eq!(result.application_id, "app-123");
        // 34 + 33 * 0.7 = 57.1
        assert_eq!(result.score, 57);
        assert_eq!(result.probabilities, vec![0.1, 0.7, 0.2]);
    }

    #[tokio::test]
    async fn test_predict_class_zero() {
        let predictor = predictor_with(
            Arc::new(LetterCountEmbedder::new()),
            Arc::new(FixedClassifier(vec![0.9, 0.05, 0.05])),
        );
        let result = predictor.predict(&make_application()).await.unwrap();
        assert_eq!(result.score, 31);
    }

    #[tokio::test]
    async fn test_predict_is_deterministic() {
        let predictor = predictor_with(
            Arc::new(LetterCountEmbedder::new()),
            Arc::new(FusedScoreClassifier),
        );
        let app = make_application();

        let first = predictor.predict(&app).await.unwrap();
        let second = predictor.predict(&app).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_four_embedding_calls_per_prediction() {
        let embedder = Arc::new(LetterCountEmbedder::new());
        let predictor = predictor_with(embedder.clone(), Arc::new(FusedScoreClassifier));

        predictor.predict(&make_application()).await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_build_features_row_shape() {
        let predictor = predictor_with(
            Arc::new(LetterCountEmbedder::new()),
            Arc::new(FusedScoreClassifier),
        );
        let row = predictor.build_features(&make_application()).await.unwrap();

        assert_eq!(row.xp_years, 5.0);
        assert_eq!(row.job_years, 3.0);
        assert_eq!(row.values().len(), 6 + 4 * 26);
        assert!(row.sim_xp_job > 0.0 && row.sim_xp_job <= 1.0);
    }

    #[tokio::test]
    async fn test_missing_classifier_fails_fast() {
        let embedder = Arc::new(LetterCountEmbedder::new());
        let predictor = Predictor::new(Some(embedder.clone()), None);

        let err = predictor.predict(&make_application()).await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
        assert!(err.to_string().contains("Prediction model is not loaded"));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);

        assert!(matches!(
            predictor.build_features(&make_application()).await,
            Err(AppError::ModelUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_embedder_fails_fast() {
        let predictor = Predictor::new(None, Some(Arc::new(FusedScoreClassifier)));
        let err = predictor.predict(&make_application()).await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
        assert!(err.to_string().contains("Embeddings model is not loaded"));
    }

    #[tokio::test]
    async fn test_embedding_failure_is_wrapped_as_prediction_error() {
        let predictor = predictor_with(Arc::new(FailingEmbedder), Arc::new(FusedScoreClassifier));
        let err = predictor.predict(&make_application()).await.unwrap_err();
        match err {
            AppError::Prediction(msg) => {
                assert!(msg.starts_with("Prediction failed:"));
                assert!(msg.contains("model warming up"));
            }
            other => panic!("expected prediction error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_class_outside_anchor_table_is_prediction_error() {
        let predictor = predictor_with(
            Arc::new(LetterCountEmbedder::new()),
            Arc::new(FixedClassifier(vec![0.1, 0.1, 0.1, 0.7])),
        );
        assert!(matches!(
            predictor.predict(&make_application()).await,
            Err(AppError::Prediction(_))
        ));
    }

    #[test]
    fn test_loaded_flags() {
        let predictor = Predictor::new(None, Some(Arc::new(FusedScoreClassifier)));
        assert!(!predictor.embeddings_loaded());
        assert!(predictor.classifier_loaded());
    }
}
