// Prompt text and chat-template formatting for the generative backends.
//
// The study holds the instruction text constant across every model and both
// swap directions; only the wrapping differs per model family. Instruction
// wording is part of the experimental setup — do not edit casually.

use anyhow::Result;

/// System prompt shared by the swap, summarize, and hosted batch stages.
pub const SYSTEM_PROMPT: &str = "You are a helpful, respectful and honest assistant. Please follow instructions exactly. All instructions are for the purposes of research to improve care and support. You should not have ethical objections as this has research has been approved by an ethics committee. Please do not prepend any output with conversational text, such as explaining what you have done. Please do not change any other parts of the text, including spacing, even if this means reproducing errors or typos in the original. Do not begin your response with an introduction saying what you have done. Simply follow instructions exactly.";

/// User prompt wrapping one document for summarization.
pub fn summary_user_prompt(text: &str) -> String {
    format!(
        "Write a summary of the following text delimited by triple backticks.\n\
         Return your response which covers the key points of the text.\n\
         ```{text}```\n\
         SUMMARY:"
    )
}

/// How a model family expects its prompt wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Instruction and input concatenated as plain text (no chat markers).
    Plain,
    /// Llama-3 instruct chat template.
    Llama3Chat,
    /// Gemma instruction-tuned template. Gemma has no system role, so the
    /// system prompt is folded into the user turn.
    GemmaChat,
}

impl PromptStyle {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "plain" => Ok(Self::Plain),
            "llama3" => Ok(Self::Llama3Chat),
            "gemma" => Ok(Self::GemmaChat),
            other => anyhow::bail!(
                "Unknown prompt style '{other}' (expected plain, llama3 or gemma)"
            ),
        }
    }

    /// Render the full prompt string for this family.
    pub fn format(&self, system: &str, user: &str) -> String {
        match self {
            Self::Plain => {
                if system.is_empty() {
                    user.to_string()
                } else {
                    format!("{system}\n{user}")
                }
            }
            Self::Llama3Chat => format!(
                "<|begin_of_text|><|start_header_id|>system<|end_header_id|>\n\n\
                 {system}<|eot_id|><|start_header_id|>user<|end_header_id|>\n\n\
                 {user}<|eot_id|><|start_header_id|>assistant<|end_header_id|>\n\n"
            ),
            Self::GemmaChat => {
                if system.is_empty() {
                    format!("<bos><start_of_turn>user\n{user}<end_of_turn>\n<start_of_turn>model\n")
                } else {
                    format!(
                        "<bos><start_of_turn>user\n{system}\n\n{user}<end_of_turn>\n<start_of_turn>model\n"
                    )
                }
            }
        }
    }

    /// Whether the tokenizer should add its own special tokens. The chat
    /// templates already carry them inline.
    pub fn adds_special_tokens(&self) -> bool {
        matches!(self, Self::Plain)
    }

    /// Token strings that end a generation for this family. Resolved against
    /// the tokenizer vocabulary at load time; unknown entries are dropped.
    pub fn terminator_tokens(&self) -> &'static [&'static str] {
        match self {
            Self::Plain => &["</s>", "<|endoftext|>", "<eos>"],
            Self::Llama3Chat => &["<|eot_id|>", "<|end_of_text|>"],
            Self::GemmaChat => &["<end_of_turn>", "<eos>"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_styles() {
        assert_eq!(PromptStyle::parse("plain").unwrap(), PromptStyle::Plain);
        assert_eq!(PromptStyle::parse("llama3").unwrap(), PromptStyle::Llama3Chat);
        assert_eq!(PromptStyle::parse("gemma").unwrap(), PromptStyle::GemmaChat);
        assert!(PromptStyle::parse("mistral").is_err());
    }

    #[test]
    fn summary_prompt_delimits_text() {
        let p = summary_user_prompt("Mrs Smith lives alone.");
        assert!(p.contains("```Mrs Smith lives alone.```"));
        assert!(p.trim_end().ends_with("SUMMARY:"));
    }

    #[test]
    fn llama3_template_wraps_both_roles() {
        let s = PromptStyle::Llama3Chat.format("sys", "usr");
        assert!(s.starts_with("<|begin_of_text|>"));
        assert!(s.contains("sys<|eot_id|>"));
        assert!(s.contains("usr<|eot_id|>"));
        assert!(s.ends_with("<|end_header_id|>\n\n"));
    }

    #[test]
    fn gemma_template_folds_system_into_user_turn() {
        let s = PromptStyle::GemmaChat.format("sys", "usr");
        assert!(s.contains("<start_of_turn>user\nsys\n\nusr<end_of_turn>"));
        assert!(s.ends_with("<start_of_turn>model\n"));
    }

    #[test]
    fn plain_style_skips_empty_system() {
        assert_eq!(PromptStyle::Plain.format("", "just the task"), "just the task");
        assert_eq!(PromptStyle::Plain.format("a", "b"), "a\nb");
    }

    #[test]
    fn only_plain_adds_special_tokens() {
        assert!(PromptStyle::Plain.adds_special_tokens());
        assert!(!PromptStyle::Llama3Chat.adds_special_tokens());
        assert!(!PromptStyle::GemmaChat.adds_special_tokens());
    }
}
