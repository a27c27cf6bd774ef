use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    /// API key for the hosted batch endpoint (OPENAI_API_KEY).
    pub openai_api_key: String,
    /// Base URL for the hosted API (defaults to https://api.openai.com/v1).
    /// Points at any OpenAI-compatible server for testing.
    pub openai_base_url: String,
    /// Model requested in batch summarization jobs.
    pub batch_model: String,
    /// Directory containing downloaded ONNX classifier files
    pub model_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the API key, which is only
    /// required for the `batch submit` / `check` / `fetch` steps.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("PORTRAYAL_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::models::download::default_model_dir());

        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| crate::batch::client::DEFAULT_BASE_URL.to_string()),
            batch_model: env::var("PORTRAYAL_BATCH_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            model_dir,
        })
    }

    /// Check that the hosted API key is configured.
    /// Call this before any batch operation that talks to the API.
    pub fn require_openai(&self) -> Result<()> {
        if self.openai_api_key.is_empty() {
            anyhow::bail!(
                "OPENAI_API_KEY not set. Add it to your .env file.\n\
                 Only `batch prepare` and the local backends work without it."
            );
        }
        Ok(())
    }

    /// Validate that the classifier models needed by the sentiment stage
    /// are present, pointing at `download-model` when they are not.
    pub fn require_classifiers(&self) -> Result<()> {
        if !crate::models::download::classifier_files_present(&self.model_dir) {
            anyhow::bail!(
                "Classifier model files not found in {}\n\
                 Run `portrayal download-model` to download them.",
                self.model_dir.display()
            );
        }
        Ok(())
    }
}
