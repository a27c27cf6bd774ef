// Summarizer trait — the swap-ready abstraction over model backends.
//
// The local backends (ONNX causal LM, ONNX encoder-decoder) both implement
// this; the hosted batch workflow produces the same SummaryPair files through
// a different path (see the batch module).

use anyhow::Result;
use async_trait::async_trait;

/// Decoding options passed down to a generation backend.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Sampling temperature. 0 disables sampling entirely (greedy decode),
    /// matching how the study pins deterministic runs.
    pub temperature: f64,
    /// Nucleus sampling mass. Ignored when temperature is 0.
    pub top_p: f64,
    /// Hard cap on new tokens. None means the output may be as long as the
    /// input: the backend subtracts `prompt_overhead` from the full prompt
    /// length so only the document's own length counts.
    pub max_new_tokens: Option<usize>,
    /// Token count of the prompt scaffolding around the document text.
    pub prompt_overhead: usize,
}

impl GenerationOptions {
    /// Greedy decoding with no length cap beyond the input length.
    pub fn deterministic() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            max_new_tokens: None,
            prompt_overhead: 0,
        }
    }

    pub fn sampled(temperature: f64, top_p: f64, max_new_tokens: Option<usize>) -> Self {
        Self {
            temperature,
            top_p,
            max_new_tokens,
            prompt_overhead: 0,
        }
    }
}

/// Trait for producing a summary of one document. Implementations are async
/// because inference is offloaded to blocking threads (or, for hosted
/// backends, the network).
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize a single text.
    async fn summarize(&self, text: &str, opts: &GenerationOptions) -> Result<String>;
}
