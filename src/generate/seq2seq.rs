// Local encoder-decoder summarization via ONNX Runtime.
//
// Expects the standard two-file export: `encoder_model.onnx`
// (input_ids + attention_mask → last_hidden_state) and `decoder_model.onnx`
// (input_ids + encoder_attention_mask + encoder_hidden_states → logits),
// plus `tokenizer.json`. Decoding is greedy — sampling parameters do not
// change these models' output and exist only in the run's file name.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::sampling;
use super::traits::{GenerationOptions, Summarizer};

/// Upper bound on summary length when no explicit limit is given.
/// No portrait in the corpus summarizes longer than this.
const DEFAULT_MAX_SUMMARY_TOKENS: usize = 1000;

/// Floor on summary length: the decoder may not emit EOS before this many
/// tokens have been produced.
const DEFAULT_MIN_SUMMARY_TOKENS: usize = 21;

/// Model family, fixing the special-token conventions of the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seq2SeqFamily {
    /// BART-style: decoding starts from EOS (id 2), which is also the stop token.
    Bart,
    /// T5-style: decoding starts from PAD (id 0), stops at EOS (id 1), and the
    /// input is prefixed with the "summarize: " task marker.
    T5,
}

impl Seq2SeqFamily {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "bart" => Ok(Self::Bart),
            "t5" => Ok(Self::T5),
            other => anyhow::bail!("Unknown seq2seq family '{other}' (expected bart or t5)"),
        }
    }

    fn decoder_start_token_id(&self) -> u32 {
        match self {
            Self::Bart => 2,
            Self::T5 => 0,
        }
    }

    fn eos_token_id(&self) -> u32 {
        match self {
            Self::Bart => 2,
            Self::T5 => 1,
        }
    }

    fn input_prefix(&self) -> &'static str {
        match self {
            Self::Bart => "",
            Self::T5 => "summarize: ",
        }
    }
}

/// Encoder-decoder summarizer. Sessions sit behind Arc<Mutex> for the same
/// reasons as the causal backend: run() needs &mut, spawn_blocking needs
/// 'static, and the Summarizer trait needs Send + Sync.
pub struct Seq2SeqSummarizer {
    encoder: Arc<Mutex<Session>>,
    decoder: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    family: Seq2SeqFamily,
    min_length: usize,
}

impl Seq2SeqSummarizer {
    /// Load encoder, decoder, and tokenizer from the given directory.
    pub fn load(model_dir: &Path, family: Seq2SeqFamily) -> Result<Self> {
        let encoder_path = model_dir.join("encoder_model.onnx");
        let decoder_path = model_dir.join("decoder_model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        for path in [&encoder_path, &decoder_path, &tokenizer_path] {
            if !path.exists() {
                anyhow::bail!("Model file not found: {}", path.display());
            }
        }

        let encoder = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&encoder_path)
            .with_context(|| format!("Failed to load encoder from {}", encoder_path.display()))?;
        let decoder = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&decoder_path)
            .with_context(|| format!("Failed to load decoder from {}", decoder_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        debug!(family = ?family, "Loaded seq2seq model from {}", model_dir.display());

        Ok(Self {
            encoder: Arc::new(Mutex::new(encoder)),
            decoder: Arc::new(Mutex::new(decoder)),
            tokenizer: Arc::new(tokenizer),
            family,
            min_length: DEFAULT_MIN_SUMMARY_TOKENS,
        })
    }
}

#[async_trait]
impl Summarizer for Seq2SeqSummarizer {
    async fn summarize(&self, text: &str, opts: &GenerationOptions) -> Result<String> {
        let encoder = Arc::clone(&self.encoder);
        let decoder = Arc::clone(&self.decoder);
        let tokenizer = Arc::clone(&self.tokenizer);
        let family = self.family;
        let min_length = self.min_length;
        let input = format!("{}{}", family.input_prefix(), text);
        let max_length = opts.max_new_tokens.unwrap_or(DEFAULT_MAX_SUMMARY_TOKENS);

        tokio::task::spawn_blocking(move || {
            summarize_sync(
                &encoder, &decoder, &tokenizer, family, &input, max_length, min_length,
            )
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

fn summarize_sync(
    encoder: &Arc<Mutex<Session>>,
    decoder: &Arc<Mutex<Session>>,
    tokenizer: &Arc<Tokenizer>,
    family: Seq2SeqFamily,
    input: &str,
    max_length: usize,
    min_length: usize,
) -> Result<String> {
    let enc = tokenizer
        .encode(input, true)
        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

    let input_ids: Vec<i64> = enc.get_ids().iter().map(|&id| id as i64).collect();
    let src_len = input_ids.len();
    let shape = [1i64, src_len as i64];

    // Run the encoder once; its hidden states feed every decoder step
    let hidden_states: Vec<f32> = {
        let input_ids_tensor = Tensor::from_array((shape, input_ids))
            .context("Failed to create input_ids tensor")?;
        let attention_mask_tensor = Tensor::from_array((shape, vec![1i64; src_len]))
            .context("Failed to create attention_mask tensor")?;

        let mut encoder = encoder
            .lock()
            .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;
        let outputs = encoder
            .run(ort::inputs! {
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor
            })
            .context("Encoder inference failed")?;

        // Output shape: [1, src_len, hidden]
        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract encoder output tensor")?;
        data.to_vec()
    };
    let hidden_dim = hidden_states.len() / src_len;

    let eos = family.eos_token_id();
    let mut decoder_ids: Vec<i64> = vec![family.decoder_start_token_id() as i64];
    let mut generated: Vec<u32> = Vec::new();

    for _ in 0..max_length {
        let tgt_len = decoder_ids.len();

        let decoder_ids_tensor =
            Tensor::from_array(([1i64, tgt_len as i64], decoder_ids.clone()))
                .context("Failed to create decoder input_ids tensor")?;
        let encoder_mask_tensor = Tensor::from_array((shape, vec![1i64; src_len]))
            .context("Failed to create encoder_attention_mask tensor")?;
        let hidden_tensor = Tensor::from_array((
            [1i64, src_len as i64, hidden_dim as i64],
            hidden_states.clone(),
        ))
        .context("Failed to create encoder_hidden_states tensor")?;

        let mut last_logits: Vec<f32> = {
            let mut decoder = decoder
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;
            let outputs = decoder
                .run(ort::inputs! {
                    "input_ids" => decoder_ids_tensor,
                    "encoder_attention_mask" => encoder_mask_tensor,
                    "encoder_hidden_states" => hidden_tensor
                })
                .context("Decoder inference failed")?;

            // Output shape: [1, tgt_len, vocab] — take the final position
            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract decoder logits tensor")?;
            let vocab = data.len() / tgt_len;
            data[(tgt_len - 1) * vocab..].to_vec()
        };

        // Enforce the length floor by banning EOS until it is reached
        if generated.len() < min_length {
            last_logits[eos as usize] = f32::NEG_INFINITY;
        }

        let next = sampling::argmax(&last_logits) as u32;
        if next == eos {
            break;
        }
        generated.push(next);
        decoder_ids.push(next as i64);
    }

    let text = tokenizer
        .decode(&generated, true)
        .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;

    debug!(
        src_tokens = src_len,
        new_tokens = generated.len(),
        preview = %crate::output::truncate_chars(&text, 60),
        "Generated summary"
    );

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_parse_round_trips() {
        assert_eq!(Seq2SeqFamily::parse("bart").unwrap(), Seq2SeqFamily::Bart);
        assert_eq!(Seq2SeqFamily::parse("t5").unwrap(), Seq2SeqFamily::T5);
        assert!(Seq2SeqFamily::parse("pegasus").is_err());
    }

    #[test]
    fn bart_starts_and_stops_on_eos() {
        let f = Seq2SeqFamily::Bart;
        assert_eq!(f.decoder_start_token_id(), f.eos_token_id());
        assert_eq!(f.input_prefix(), "");
    }

    #[test]
    fn t5_uses_task_prefix() {
        let f = Seq2SeqFamily::T5;
        assert_eq!(f.input_prefix(), "summarize: ");
        assert_eq!(f.decoder_start_token_id(), 0);
        assert_eq!(f.eos_token_id(), 1);
    }
}
