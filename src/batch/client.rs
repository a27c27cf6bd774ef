// Minimal client for the hosted batch API (OpenAI-compatible).
//
// Only the four operations the pipeline needs: upload a request file,
// create a batch, list batches, and download an output file's content.
// API docs: https://platform.openai.com/docs/api-reference/batch

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::multipart;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Completion window requested for every batch.
const COMPLETION_WINDOW: &str = "24h";

pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Upload a JSONL request file with purpose "batch".
    pub async fn upload_batch_file(&self, path: &Path) -> Result<FileObject> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("requests.jsonl")
            .to_string();

        let form = multipart::Form::new()
            .text("purpose", "batch")
            .part("file", multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(format!("{}/files", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Failed to upload batch input file")?;

        let file: FileObject = check_json(response).await?;
        debug!(file_id = %file.id, "Uploaded batch input file");
        Ok(file)
    }

    /// Create a batch over a previously uploaded input file.
    pub async fn create_batch(
        &self,
        input_file_id: &str,
        description: &str,
    ) -> Result<BatchObject> {
        let request = CreateBatchRequest {
            input_file_id: input_file_id.to_string(),
            endpoint: "/v1/chat/completions".to_string(),
            completion_window: COMPLETION_WINDOW.to_string(),
            metadata: BatchMetadata {
                description: description.to_string(),
            },
        };

        let response = self
            .client
            .post(format!("{}/batches", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to create batch")?;

        let batch: BatchObject = check_json(response).await?;
        debug!(batch_id = %batch.id, "Created batch");
        Ok(batch)
    }

    /// List batches on the account (first page, newest first — the study's
    /// request volume fits comfortably in one page).
    pub async fn list_batches(&self) -> Result<Vec<BatchObject>> {
        let response = self
            .client
            .get(format!("{}/batches?limit=100", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("Failed to list batches")?;

        let list: BatchList = check_json(response).await?;
        Ok(list.data)
    }

    /// Download the raw content of an output file.
    pub async fn file_content(&self, file_id: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/files/{}/content", self.base_url, file_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("Failed to fetch content of file {file_id}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API returned {} for file {}: {}", status, file_id, body);
        }
        response.text().await.context("Failed to read file content")
    }
}

async fn check_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("API returned {}: {}", status, body);
    }
    response.json().await.context("Failed to parse API response")
}

// --- API request/response types ---

#[derive(Serialize)]
struct CreateBatchRequest {
    input_file_id: String,
    endpoint: String,
    completion_window: String,
    metadata: BatchMetadata,
}

#[derive(Serialize)]
struct BatchMetadata {
    description: String,
}

#[derive(Debug, Deserialize)]
pub struct FileObject {
    pub id: String,
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchObject {
    pub id: String,
    pub status: String,
    pub input_file_id: String,
    pub output_file_id: Option<String>,
    pub error_file_id: Option<String>,
    pub created_at: Option<i64>,
}

impl BatchObject {
    /// One-line description for terminal listings.
    pub fn describe(&self) -> String {
        let created = self
            .created_at
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        format!("{}  {:<12} created {}", self.id, self.status, created)
    }
}

#[derive(Deserialize)]
struct BatchList {
    data: Vec<BatchObject>,
}
