// Model download helper for the ONNX classifiers.
//
// Downloads two sequence-classification models from HuggingFace:
// 1. distilbert multilingual sentiment (positive / neutral / negative)
// 2. regard v3 (positive / other / neutral / negative)
//
// Files are stored in a platform-appropriate directory
// (~/.local/share/portrayal/models/ on Linux) so they persist across runs.
// The generative summarization models are large and licensed; those are
// exported separately and passed in via --model-dir.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// HuggingFace repo for the sentiment classifier.
const SENTIMENT_HF_URL: &str =
    "https://huggingface.co/lxyuan/distilbert-base-multilingual-cased-sentiments-student/resolve/main";

/// HuggingFace repo for the regard classifier.
const REGARD_HF_URL: &str = "https://huggingface.co/sasha/regardv3/resolve/main";

const MODEL_FILE: &str = "onnx/model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Returns the default directory for storing model files.
/// Uses the platform data directory: ~/.local/share/portrayal/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("portrayal")
        .join("models")
}

/// Subdirectory within model_dir for the sentiment classifier.
pub fn sentiment_model_dir(base: &Path) -> PathBuf {
    base.join("sentiment")
}

/// Subdirectory within model_dir for the regard classifier.
pub fn regard_model_dir(base: &Path) -> PathBuf {
    base.join("regard")
}

fn files_present(dir: &Path) -> bool {
    dir.join("model.onnx").exists() && dir.join("tokenizer.json").exists()
}

/// Check whether both classifier models are fully downloaded.
pub fn classifier_files_present(base: &Path) -> bool {
    files_present(&sentiment_model_dir(base)) && files_present(&regard_model_dir(base))
}

/// Download both classifier models (model.onnx + tokenizer.json each).
///
/// Shows progress bars for large files. Skips files that already exist.
/// Creates directories as needed.
pub async fn download_models(base: &Path) -> Result<()> {
    download_one("Sentiment classifier", SENTIMENT_HF_URL, &sentiment_model_dir(base)).await?;
    download_one("Regard classifier", REGARD_HF_URL, &regard_model_dir(base)).await?;
    Ok(())
}

async fn download_one(label: &str, repo_url: &str, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    println!("\n{label}:");

    let tokenizer_path = dir.join("tokenizer.json");
    if tokenizer_path.exists() {
        info!("Tokenizer already exists, skipping");
        println!("  tokenizer.json (already exists)");
    } else {
        println!("  Downloading tokenizer.json...");
        download_file(&format!("{repo_url}/{TOKENIZER_FILE}"), &tokenizer_path, false).await?;
    }

    let model_path = dir.join("model.onnx");
    if model_path.exists() {
        info!("Model already exists, skipping");
        println!("  model.onnx (already exists)");
    } else {
        println!("  Downloading model.onnx...");
        download_file(&format!("{repo_url}/{MODEL_FILE}"), &model_path, true).await?;
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let total_size = response.content_length();

    let pb = if show_progress {
        let pb = if let Some(size) = total_size {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        };
        Some(pb)
    } else {
        None
    };

    let bytes = response
        .bytes()
        .await
        .context("Failed to read response body")?;

    if let Some(ref pb) = pb {
        pb.set_position(bytes.len() as u64);
    }

    std::fs::write(dest, &bytes).with_context(|| format!("Failed to write {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_dir_is_under_portrayal() {
        let dir = default_model_dir();
        let path_str = dir.to_string_lossy();
        assert!(
            path_str.contains("portrayal") && path_str.contains("models"),
            "Expected path containing portrayal/models, got: {path_str}"
        );
    }

    #[test]
    fn classifier_dirs_are_subdirectories() {
        let base = PathBuf::from("/tmp/test-models");
        assert_eq!(sentiment_model_dir(&base), base.join("sentiment"));
        assert_eq!(regard_model_dir(&base), base.join("regard"));
    }

    #[test]
    fn classifier_files_absent_when_empty() {
        let dir = std::env::temp_dir().join("portrayal-test-nonexistent");
        assert!(!classifier_files_present(&dir));
    }

    #[test]
    fn classifier_files_present_when_all_exist() {
        let base = std::env::temp_dir().join("portrayal-classifier-test");
        for dir in [sentiment_model_dir(&base), regard_model_dir(&base)] {
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("model.onnx"), b"fake").unwrap();
            std::fs::write(dir.join("tokenizer.json"), b"fake").unwrap();
        }
        assert!(classifier_files_present(&base));
        std::fs::remove_dir_all(&base).unwrap();
    }
}
