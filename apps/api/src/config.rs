use std::path::PathBuf;

use anyhow::{Context, Result};

/// Service configuration loaded from environment variables.
/// Nothing is required: a missing embedding URL leaves the service degraded.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub embedding_url: Option<String>,
    pub embedding_model: String,
    pub embedding_timeout_secs: u64,
    pub classifier_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            embedding_url: optional_env("EMBEDDING_URL"),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "intfloat/multilingual-e5-base".to_string()),
            embedding_timeout_secs: std::env::var("EMBEDDING_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse::<u64>()
                .context("EMBEDDING_TIMEOUT_SECS must be a whole number of seconds")?,
            classifier_path: std::env::var("CLASSIFIER_PATH")
                .unwrap_or_else(|_| "models/classifier.json".to_string())
                .into(),
        })
    }
}

/// Treats an empty value the same as an unset one.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
