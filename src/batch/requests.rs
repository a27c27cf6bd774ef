// Batch request construction.
//
// Builds the JSONL request files sent to the hosted batch endpoint: one
// file per (portrait file x max-token variant x original/result side).
// Each line's custom_id encodes enough to reassemble summaries without any
// external bookkeeping: `{direction}-{DocumentID}-{gender}-{max_tokens}`.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::generate::prompts::{summary_user_prompt, SYSTEM_PROMPT};
use crate::portraits::store;
use crate::portraits::{SwapDirection, SwappedPortrait};

/// The output-length variants submitted for every portrait file.
pub const MAX_TOKENS_VARIANTS: [Option<u32>; 6] =
    [None, Some(300), Some(150), Some(100), Some(75), Some(50)];

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchRequestLine {
    pub custom_id: String,
    pub method: String,
    pub url: String,
    pub body: ChatBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatBody {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// The fields packed into a request's custom_id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomId {
    pub direction: SwapDirection,
    pub document_id: u64,
    /// Gender of the text that was summarized ("female" / "male").
    pub gender: String,
    /// "None" or a decimal token limit — kept as written for grouping keys.
    pub max_tokens: String,
}

impl CustomId {
    pub fn format(
        direction: SwapDirection,
        document_id: u64,
        gender: &str,
        max_tokens: Option<u32>,
    ) -> String {
        let max_tokens = match max_tokens {
            Some(n) => n.to_string(),
            None => "None".to_string(),
        };
        format!("{}-{}-{}-{}", direction.code(), document_id, gender, max_tokens)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 4 {
            anyhow::bail!("custom_id is not in the expected format: {s}");
        }
        Ok(Self {
            direction: SwapDirection::parse(parts[0])?,
            document_id: parts[1]
                .parse()
                .with_context(|| format!("Bad document id in custom_id: {s}"))?,
            gender: parts[2].to_string(),
            max_tokens: parts[3].to_string(),
        })
    }

    /// Whether this request summarized the original or the swapped text.
    /// The original side's gender matches the direction's original gender.
    pub fn is_original_side(&self) -> bool {
        self.gender == self.direction.original_gender()
    }
}

/// Build one request line for one document side.
pub fn build_request(
    model: &str,
    custom_id: String,
    text: &str,
    max_tokens: Option<u32>,
) -> BatchRequestLine {
    BatchRequestLine {
        custom_id,
        method: "POST".to_string(),
        url: "/v1/chat/completions".to_string(),
        body: ChatBody {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: summary_user_prompt(text),
                },
            ],
            max_tokens,
        },
    }
}

fn write_jsonl(lines: &[BatchRequestLine], out_file: &Path) -> Result<()> {
    if let Some(parent) = out_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut file = fs::File::create(out_file)
        .with_context(|| format!("Failed to create {}", out_file.display()))?;
    for line in lines {
        serde_json::to_writer(&mut file, line)?;
        file.write_all(b"\n")?;
    }
    Ok(())
}

/// Build the request JSONL files for every portrait file in `minimal_dir`
/// and every max-token variant.
pub fn write_request_files(minimal_dir: &Path, requests_dir: &Path, model: &str) -> Result<()> {
    for in_file in store::json_files(minimal_dir)? {
        let name = in_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let Some(direction) = SwapDirection::from_portrait_name(name) else {
            println!("Skipping unrecognized portraits file: {}", in_file.display());
            continue;
        };
        let stem = in_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let portraits: Vec<SwappedPortrait> = store::read_json(&in_file)?;

        for max_tokens in MAX_TOKENS_VARIANTS {
            let mut original_lines = Vec::with_capacity(portraits.len());
            let mut result_lines = Vec::with_capacity(portraits.len());

            for portrait in &portraits {
                original_lines.push(build_request(
                    model,
                    CustomId::format(
                        direction,
                        portrait.document_id,
                        direction.original_gender(),
                        max_tokens,
                    ),
                    &portrait.original,
                    max_tokens,
                ));
                result_lines.push(build_request(
                    model,
                    CustomId::format(
                        direction,
                        portrait.document_id,
                        direction.result_gender(),
                        max_tokens,
                    ),
                    &portrait.result,
                    max_tokens,
                ));
            }

            let suffix = match max_tokens {
                Some(n) => n.to_string(),
                None => "None".to_string(),
            };
            let originals_file = requests_dir.join(format!("{stem}_originals_{suffix}.jsonl"));
            let results_file = requests_dir.join(format!("{stem}_results_{suffix}.jsonl"));

            write_jsonl(&original_lines, &originals_file)?;
            println!("File created: {}", originals_file.display());
            write_jsonl(&result_lines, &results_file)?;
            println!("File created: {}", results_file.display());
        }

        info!(
            portraits = portraits.len(),
            variants = MAX_TOKENS_VARIANTS.len(),
            file = %in_file.display(),
            "Wrote batch request files"
        );
    }
    Ok(())
}
