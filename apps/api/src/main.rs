mod classifier;
mod config;
mod embeddings;
mod errors;
mod models;
mod routes;
mod scoring;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::classifier::{Classifier, ClassifierError, LogisticClassifier};
use crate::config::Config;
use crate::embeddings::{Embedder, EmbeddingError, HttpEmbedder};
use crate::routes::build_router;
use crate::scoring::predictor::Predictor;
use crate::state::AppState;

/// A collaborator that could not be loaded at startup. Logged, never fatal.
#[derive(Debug, Error)]
enum ModelLoadError {
    #[error("embeddings model failed to load: {0}")]
    Embeddings(#[from] EmbeddingError),

    #[error("prediction model failed to load: {0}")]
    Classifier(#[from] ClassifierError),
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting predictor v{}", env!("CARGO_PKG_VERSION"));

    // Both loads are best effort: a failure leaves the service up but degraded.
    let embedder = match load_embedder(&config).await {
        Ok(embedder) => Some(embedder),
        Err(e) => {
            error!("{e}");
            None
        }
    };
    let classifier = match load_classifier(&config) {
        Ok(classifier) => Some(classifier),
        Err(e) => {
            error!("{e}");
            None
        }
    };

    let predictor = Predictor::new(embedder, classifier);
    if !(predictor.embeddings_loaded() && predictor.classifier_loaded()) {
        error!("Running degraded: /predict will fail until restarted with working models");
    }

    let state = AppState {
        config: config.clone(),
        predictor: Arc::new(predictor),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn load_embedder(config: &Config) -> Result<Arc<dyn Embedder>, ModelLoadError> {
    let embedder = HttpEmbedder::connect(config).await?;
    info!(
        "Embeddings model loaded: {} ({} dims)",
        embedder.model(),
        embedder.dimension()
    );
    Ok(Arc::new(embedder))
}

fn load_classifier(config: &Config) -> Result<Arc<dyn Classifier>, ModelLoadError> {
    let classifier = LogisticClassifier::load(&config.classifier_path)?;
    info!(
        "Prediction model loaded from {}: {} classes, {} features",
        config.classifier_path.display(),
        classifier.n_classes(),
        classifier.n_features()
    );
    Ok(Arc::new(classifier))
}
