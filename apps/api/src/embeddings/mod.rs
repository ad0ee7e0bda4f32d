/// Embedding client — the single point of entry for sentence embeddings.
///
/// The scoring pipeline only sees the `Embedder` trait. `HttpEmbedder` talks to a
/// text-embeddings-inference style server (`POST {base}/embed`) hosting the
/// multilingual sentence model the classifier was trained against.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

/// Text sent once at startup to confirm the server answers.
const PROBE_TEXT: &str = "ping";

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("embedding server returned no vector")]
    EmptyEmbedding,

    #[error("EMBEDDING_URL is not set")]
    NotConfigured,
}

/// Turns a text into a fixed-length vector. Implementations must be safe to share
/// across concurrent requests.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedServerError {
    error: String,
}

/// Embedder backed by a remote inference server. One request per text, no retries.
#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimension: usize,
}

impl HttpEmbedder {
    /// Builds the client and embeds a probe text to learn the vector size.
    pub async fn connect(config: &Config) -> Result<Self, EmbeddingError> {
        let base = config
            .embedding_url
            .as_deref()
            .ok_or(EmbeddingError::NotConfigured)?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.embedding_timeout_secs))
            .build()?;

        let mut embedder = Self {
            client,
            endpoint: embed_endpoint(base),
            model: config.embedding_model.clone(),
            dimension: 0,
        };
        embedder.dimension = embedder.encode(PROBE_TEXT).await?.len();

        Ok(embedder)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { inputs: text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Try to parse error message
            let message = serde_json::from_str::<EmbedServerError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let vector = parse_embed_response(&body)?;
        debug!("Embedded {} chars into {} dims", text.len(), vector.len());
        Ok(vector)
    }
}

fn embed_endpoint(base: &str) -> String {
    format!("{}/embed", base.trim_end_matches('/'))
}

/// The server answers a single input with a batch of one: `[[f32, ...]]`.
fn parse_embed_response(body: &str) -> Result<Vec<f32>, EmbeddingError> {
    let batch: Vec<Vec<f32>> = serde_json::from_str(body)?;
    batch
        .into_iter()
        .next()
        .filter(|v| !v.is_empty())
        .ok_or(EmbeddingError::EmptyEmbedding)
}
