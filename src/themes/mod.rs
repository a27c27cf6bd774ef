// Theme extraction: model-identified topics and the terms behind them.
//
// A generative model reads each document and answers a fixed JSON
// questionnaire about one theme (appearance, health, subjective language).
// Raw generations and parsed records are both kept — the raw file is the
// audit trail when parsing degrades.

pub mod parse;
pub mod prompts;
pub mod terms;

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{info, warn};

use crate::generate::causal::CausalGenerator;
use crate::generate::traits::GenerationOptions;
use crate::portraits::store;
use self::prompts::{topic_prompt, TopicType};

/// New-token cap for one questionnaire answer.
const MAX_ANSWER_TOKENS: usize = 400;

/// Run one topic's questionnaire over every document of every file in
/// `in_dir`, reading the text under `input_key` ("original",
/// "original_clean" or "result").
pub async fn extract(
    generator: &CausalGenerator,
    in_dir: &Path,
    out_dir: &Path,
    input_key: &str,
    topic: TopicType,
) -> Result<()> {
    let opts = GenerationOptions {
        max_new_tokens: Some(MAX_ANSWER_TOKENS),
        ..GenerationOptions::deterministic()
    };

    for in_file in store::json_files(in_dir)? {
        println!("Identifying topics in: {}", in_file.display());
        let stem = in_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        let out_file = out_dir.join(format!("{stem}_{}_{input_key}.json", topic.name()));
        let parsed_file = out_dir
            .join("parsed")
            .join(format!("{stem}_{}_{input_key}.json", topic.name()));

        if out_file.is_file() {
            println!("File already exists: {}. Skipping.", out_file.display());
            continue;
        }

        let items: Vec<Value> = store::read_json(&in_file)?;

        let pb = ProgressBar::new(items.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .expect("valid template")
                .progress_chars("=> "),
        );

        let mut raw_list: Vec<String> = Vec::with_capacity(items.len());
        let mut parsed_list: Vec<Value> = Vec::with_capacity(items.len());
        for (doc_num, item) in items.iter().enumerate() {
            let text = item
                .get(input_key)
                .and_then(|v| v.as_str())
                .with_context(|| {
                    format!("Missing '{input_key}' in {}", in_file.display())
                })?;

            let raw = generator
                .generate("", &topic_prompt(topic, text), &opts)
                .await?;

            match parse::parse_model_json(&raw, doc_num, topic.expected_keys()) {
                Ok(record) => parsed_list.push(record),
                Err(e) => {
                    warn!(doc_num, error = %e, "Could not parse theme extraction");
                    parsed_list.push(parse::error_record(doc_num));
                }
            }
            raw_list.push(raw);

            // Write on every iteration so we can keep an eye on long runs
            store::write_json(&out_file, &raw_list)?;
            store::write_json(&parsed_file, &parsed_list)?;
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            topic = topic.name(),
            documents = items.len(),
            file = %in_file.display(),
            "Extracted themes"
        );
    }
    Ok(())
}
