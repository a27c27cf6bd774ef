// Local causal LM generation via ONNX Runtime.
//
// Expects a decoder-only model exported without KV cache: inputs
// `input_ids` + `attention_mask`, output logits of shape
// [batch, seq_len, vocab]. Decoding re-runs the full sequence each step,
// which is slow but keeps the session interface identical across exports.
//
// Used by three stages: gender swap (greedy), summarization (sampled), and
// theme extraction (greedy with a hard token cap).

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::prompts::{summary_user_prompt, PromptStyle, SYSTEM_PROMPT};
use super::sampling;
use super::traits::{GenerationOptions, Summarizer};

/// Local causal LM. Holds the model session and tokenizer behind Arc<Mutex>
/// so inference can be offloaded to spawn_blocking without blocking the
/// async runtime (ort::Session::run takes &mut self).
#[derive(Clone)]
pub struct CausalGenerator {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    style: PromptStyle,
    /// Token ids that terminate a generation, resolved from the vocabulary.
    terminators: Vec<u32>,
}

impl CausalGenerator {
    /// Load the model and tokenizer from the given directory.
    ///
    /// Expects `model.onnx` and `tokenizer.json` to exist in `model_dir`.
    pub fn load(model_dir: &Path, style: PromptStyle) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            anyhow::bail!("Model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        // Unknown terminator strings are simply absent from this vocabulary
        let terminators: Vec<u32> = style
            .terminator_tokens()
            .iter()
            .filter_map(|t| tokenizer.token_to_id(t))
            .collect();
        if terminators.is_empty() {
            anyhow::bail!(
                "None of the terminator tokens for {:?} exist in this tokenizer — wrong prompt style?",
                style
            );
        }

        debug!(style = ?style, "Loaded causal LM from {}", model_dir.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            style,
            terminators,
        })
    }

    /// Number of tokens in the fully formatted prompt. With an empty document
    /// this measures the scaffolding overhead, which callers subtract when
    /// output length should track input length.
    pub fn count_tokens(&self, system: &str, user: &str) -> Result<usize> {
        let prompt = self.style.format(system, user);
        let enc = self
            .tokenizer
            .encode(prompt.as_str(), self.style.adds_special_tokens())
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;
        Ok(enc.get_ids().len())
    }

    /// Generate a completion for the given system/user pair.
    ///
    /// CPU-bound decoding runs on a blocking thread. Generation stops at a
    /// terminator token or after the resolved new-token budget.
    pub async fn generate(
        &self,
        system: &str,
        user: &str,
        opts: &GenerationOptions,
    ) -> Result<String> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let style = self.style;
        let terminators = self.terminators.clone();
        let prompt = style.format(system, user);
        let opts = opts.clone();

        tokio::task::spawn_blocking(move || {
            generate_sync(&session, &tokenizer, style, &terminators, &prompt, &opts)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

fn generate_sync(
    session: &Arc<Mutex<Session>>,
    tokenizer: &Arc<Tokenizer>,
    style: PromptStyle,
    terminators: &[u32],
    prompt: &str,
    opts: &GenerationOptions,
) -> Result<String> {
    let enc = tokenizer
        .encode(prompt, style.adds_special_tokens())
        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

    let mut ids: Vec<i64> = enc.get_ids().iter().map(|&id| id as i64).collect();
    let input_len = ids.len();

    // None means: as many new tokens as the document itself occupies
    let max_new_tokens = opts
        .max_new_tokens
        .unwrap_or_else(|| input_len.saturating_sub(opts.prompt_overhead))
        .max(1);

    let mut rng = rand::rng();
    let mut generated: Vec<u32> = Vec::new();

    for _ in 0..max_new_tokens {
        let seq_len = ids.len();
        let shape = [1i64, seq_len as i64];

        let input_ids_tensor = Tensor::from_array((shape, ids.clone()))
            .context("Failed to create input_ids tensor")?;
        let attention_mask_tensor = Tensor::from_array((shape, vec![1i64; seq_len]))
            .context("Failed to create attention_mask tensor")?;

        let last_logits: Vec<f32> = {
            let mut session = session
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => input_ids_tensor,
                    "attention_mask" => attention_mask_tensor
                })
                .context("ONNX inference failed")?;

            // Output shape: [1, seq_len, vocab] — take the final position
            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract logits tensor")?;

            let vocab = data.len() / seq_len;
            data[(seq_len - 1) * vocab..].to_vec()
        };

        let next = sampling::next_token(&last_logits, opts.temperature, opts.top_p, &mut rng) as u32;
        if terminators.contains(&next) {
            break;
        }
        generated.push(next);
        ids.push(next as i64);
    }

    let text = tokenizer
        .decode(&generated, true)
        .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;

    debug!(
        input_tokens = input_len,
        new_tokens = generated.len(),
        preview = %crate::output::truncate_chars(&text, 60),
        "Generated completion"
    );

    Ok(text)
}

/// Summarizer over a causal LM: wraps each document in the shared summary
/// prompt, and measures the prompt overhead once so unlimited runs track the
/// input length.
pub struct CausalSummarizer {
    generator: CausalGenerator,
    prompt_overhead: usize,
}

impl CausalSummarizer {
    pub fn new(generator: CausalGenerator) -> Result<Self> {
        let prompt_overhead = generator.count_tokens(SYSTEM_PROMPT, &summary_user_prompt(""))?;
        debug!(prompt_overhead, "Measured summary prompt overhead");
        Ok(Self {
            generator,
            prompt_overhead,
        })
    }
}

#[async_trait]
impl Summarizer for CausalSummarizer {
    async fn summarize(&self, text: &str, opts: &GenerationOptions) -> Result<String> {
        let mut opts = opts.clone();
        opts.prompt_overhead = self.prompt_overhead;
        self.generator
            .generate(SYSTEM_PROMPT, &summary_user_prompt(text), &opts)
            .await
    }
}
