// Hosted batch summarization workflow.
//
// Five idempotent steps, each resumable from the filesystem:
// prepare (build request JSONL) → submit (upload + create batches) →
// check (wait for completion, record output file ids) → fetch (download
// responses) → extract (reassemble SummaryPair files).

pub mod client;
pub mod extract;
pub mod requests;

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use crate::portraits::store;
use self::client::OpenAiClient;

/// File recording the output file ids once every batch has completed.
const COMPLETED_IDS_FILE: &str = "completed_ids.json";

/// Upload every request file and create a batch for each, then list the
/// account's batches so the submission can be eyeballed.
pub async fn submit(client: &OpenAiClient, requests_dir: &Path) -> Result<()> {
    let request_files = store::files_with_extension(requests_dir, "jsonl")?;
    if request_files.is_empty() {
        anyhow::bail!(
            "No request files in {}. Run `portrayal batch prepare` first.",
            requests_dir.display()
        );
    }

    for in_file in &request_files {
        let stem = in_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let file = client.upload_batch_file(in_file).await?;
        client
            .create_batch(&file.id, "portrait summarization run")
            .await?;
        println!("Request made: {stem}    {}", file.id);
    }

    println!("\nAll batches on the account:");
    for batch in client.list_batches().await? {
        println!("  {}", batch.describe());
    }
    Ok(())
}

/// Count completed batches against submitted request files. When every
/// request has completed, write the output file ids to completed_ids.json;
/// otherwise print what is still pending.
pub async fn check(client: &OpenAiClient, requests_dir: &Path) -> Result<()> {
    let batches = client.list_batches().await?;

    let mut completed_ids: Vec<String> = Vec::new();
    for batch in &batches {
        if batch.status == "completed" {
            if let Some(id) = &batch.output_file_id {
                completed_ids.push(id.clone());
            }
        } else {
            println!("  {}", batch.describe());
        }
    }

    let n_requests = store::files_with_extension(requests_dir, "jsonl")?.len();
    let n_completed = completed_ids.len();
    println!("Number of requests made: {n_requests}");
    println!("Number of batches completed: {n_completed}");

    if n_requests > 0 && n_requests <= n_completed {
        let out_file = requests_dir.join(COMPLETED_IDS_FILE);
        store::write_json(&out_file, &completed_ids)?;
        println!("{}", "All batches completed.".bold());
        println!("File created: {}", out_file.display());
    } else {
        println!("Not all batches have completed yet. Run `portrayal batch check` again later.");
    }
    Ok(())
}

/// Download every completed output file into `responses_dir`.
/// Requires completed_ids.json, which `check` writes only when everything
/// has finished.
pub async fn fetch(
    client: &OpenAiClient,
    requests_dir: &Path,
    responses_dir: &Path,
) -> Result<()> {
    let ids_file = requests_dir.join(COMPLETED_IDS_FILE);
    let output_file_ids: Vec<String> = store::read_json(&ids_file).with_context(|| {
        format!(
            "Failed to read {} — run `portrayal batch check` until all batches complete",
            ids_file.display()
        )
    })?;

    std::fs::create_dir_all(responses_dir)
        .with_context(|| format!("Failed to create directory {}", responses_dir.display()))?;

    for file_id in &output_file_ids {
        let out_file = responses_dir.join(format!("{file_id}.jsonl"));
        if out_file.is_file() {
            println!("File already exists: {}. Skipping.", out_file.display());
            continue;
        }
        let content = client.file_content(file_id).await?;
        std::fs::write(&out_file, content)
            .with_context(|| format!("Failed to write {}", out_file.display()))?;
        info!(file_id = %file_id, "Downloaded batch output");
        println!("File created: {}", out_file.display());
    }
    Ok(())
}
