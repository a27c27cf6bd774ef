// Local ONNX sequence classifier.
//
// Runs entirely on the local CPU — no API calls, no rate limits, no
// network dependency. The same code drives both evaluation models; only
// the label set differs (softmax over N classes).

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

/// Sequence classifier. Holds the model session and tokenizer behind
/// Arc<Mutex> so inference can be offloaded to spawn_blocking without
/// blocking the async runtime.
pub struct SequenceClassifier {
    // Arc+Mutex because:
    // 1. ort::Session::run takes &mut self, so we need interior mutability
    // 2. spawn_blocking requires 'static, so we need Arc for shared ownership
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    labels: Vec<String>,
    pad_id: i64,
}

impl SequenceClassifier {
    /// Load the model and tokenizer from the given directory.
    ///
    /// Expects `model.onnx` and `tokenizer.json` to exist in `model_dir`.
    /// `labels` must list the classes in the order the model emits logits.
    pub fn load(model_dir: &Path, labels: &[&str], pad_id: u32) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            anyhow::bail!(
                "Model file not found: {}\nRun `portrayal download-model` to download it.",
                model_path.display()
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Tokenizer file not found: {}\nRun `portrayal download-model` to download it.",
                tokenizer_path.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        debug!("Loaded classifier from {}", model_dir.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            pad_id: pad_id as i64,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// True batch inference: tokenize all texts, run one forward pass,
    /// softmax the logits, and return per-label probabilities in label order.
    ///
    /// The CPU-bound tokenization and inference are offloaded to
    /// spawn_blocking so they don't block the tokio async runtime.
    pub async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let n_labels = self.labels.len();
        let pad_id = self.pad_id;
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            // Tokenize all texts, finding the max sequence length for padding
            let encodings: Vec<_> = texts
                .iter()
                .map(|t| {
                    tokenizer
                        .encode(t.as_str(), true)
                        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
                })
                .collect::<Result<Vec<_>>>()?;

            let batch_size = encodings.len();
            let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

            // Build flat input tensors with right-padding to max_len.
            // Shape: [batch_size, max_len]
            let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
            let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

            for enc in &encodings {
                let ids = enc.get_ids();
                let mask = enc.get_attention_mask();
                let seq_len = ids.len();

                input_ids_flat.extend(ids.iter().map(|&id| id as i64));
                attention_mask_flat.extend(mask.iter().map(|&m| m as i64));

                let pad_len = max_len - seq_len;
                input_ids_flat.extend(std::iter::repeat_n(pad_id, pad_len));
                attention_mask_flat.extend(std::iter::repeat_n(0i64, pad_len));
            }

            let shape = [batch_size as i64, max_len as i64];

            let input_ids_tensor = Tensor::from_array((shape, input_ids_flat))
                .context("Failed to create input_ids tensor")?;
            let attention_mask_tensor = Tensor::from_array((shape, attention_mask_flat))
                .context("Failed to create attention_mask tensor")?;

            let logits_data = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids_tensor,
                        "attention_mask" => attention_mask_tensor
                    })
                    .context("ONNX inference failed")?;

                // Output shape: [batch_size, n_labels] — raw logits
                let (_out_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;

                data.to_vec()
            };

            let mut results = Vec::with_capacity(batch_size);
            for i in 0..batch_size {
                let row: Vec<f64> = logits_data[i * n_labels..(i + 1) * n_labels]
                    .iter()
                    .map(|&l| l as f64)
                    .collect();
                results.push(softmax(&row));
            }

            Ok(results)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

/// Numerically stable softmax: maps logits to probabilities summing to 1.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
