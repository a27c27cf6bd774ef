// Batch response extraction.
//
// Reads the downloaded response JSONL files, pairs the original/result
// sides of each (direction, max_tokens) run back together by custom_id,
// and writes standard SummaryPair files. The hosted endpoint applies its
// default sampling parameters; those defaults are recorded in the output
// file name like any other run.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::warn;

use crate::portraits::params::RunParams;
use crate::portraits::store;
use crate::portraits::SummaryPair;

use super::requests::CustomId;

/// Sampling parameters the hosted endpoint applies when none are sent.
const HOSTED_DEFAULT_TEMPERATURE: f64 = 0.7;
const HOSTED_DEFAULT_TOP_P: f64 = 0.9;

/// Model label used in output file names for hosted runs.
const HOSTED_MODEL_NAME: &str = "chatgpt";

/// Pull the completion text out of one response line.
fn response_text(line: &Value) -> Option<&str> {
    line.get("response")?
        .get("body")?
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

/// Parse one response file: the grouping key `{direction}_{max_tokens}_{side}`
/// plus the completions in file order.
///
/// Every line in a response file must carry the same (direction, gender,
/// max_tokens) — anything else means the API mixed runs into one file.
fn read_response_file(in_file: &Path) -> Result<(String, Vec<String>)> {
    let raw = fs::read_to_string(in_file)
        .with_context(|| format!("Failed to read {}", in_file.display()))?;

    let mut ids: Vec<CustomId> = Vec::new();
    let mut contents: Vec<String> = Vec::new();
    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("Bad JSON line in {}", in_file.display()))?;
        let custom_id = value
            .get("custom_id")
            .and_then(|v| v.as_str())
            .with_context(|| format!("Response line without custom_id in {}", in_file.display()))?;
        ids.push(CustomId::parse(custom_id)?);
        let text = response_text(&value)
            .with_context(|| format!("Response line without content in {}", in_file.display()))?;
        contents.push(text.to_string());
    }

    if ids.is_empty() {
        anyhow::bail!("Empty response file: {}", in_file.display());
    }

    let directions: BTreeSet<&str> = ids.iter().map(|id| id.direction.code()).collect();
    let genders: BTreeSet<&str> = ids.iter().map(|id| id.gender.as_str()).collect();
    let max_tokens: BTreeSet<&str> = ids.iter().map(|id| id.max_tokens.as_str()).collect();
    if directions.len() != 1 || genders.len() != 1 || max_tokens.len() != 1 {
        anyhow::bail!(
            "The API appears to have returned more than one run in {}",
            in_file.display()
        );
    }

    let side = if ids[0].is_original_side() {
        "original"
    } else {
        "result"
    };
    let key = format!("{}_{}_{}", ids[0].direction.code(), ids[0].max_tokens, side);
    Ok((key, contents))
}

/// Pair up all response files in `responses_dir` and write SummaryPair
/// files into `out_dir`. Files that cannot be parsed are reported and
/// skipped; a missing partner side is an error.
pub fn extract_responses(responses_dir: &Path, out_dir: &Path) -> Result<()> {
    let mut content_map: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for in_file in store::files_with_extension(responses_dir, "jsonl")? {
        println!("Reading: {}", in_file.display());
        match read_response_file(&in_file) {
            Ok((key, contents)) => {
                if content_map.contains_key(&key) {
                    anyhow::bail!(
                        "Parameters '{key}' appear in more than one response file. \
                         Check the files to avoid overwriting."
                    );
                }
                content_map.insert(key, contents);
            }
            Err(e) => {
                warn!(error = %e, file = %in_file.display(), "Skipping unparsable response file");
                println!("This file could not be parsed. It may have returned an error.");
            }
        }
    }

    // Pair original/result sides per (direction, max_tokens)
    let run_keys: BTreeSet<String> = content_map
        .keys()
        .map(|k| {
            k.trim_end_matches("_original")
                .trim_end_matches("_result")
                .to_string()
        })
        .collect();

    for run_key in run_keys {
        let originals = content_map
            .get(&format!("{run_key}_original"))
            .with_context(|| format!("No originals responses for run {run_key}"))?;
        let results = content_map
            .get(&format!("{run_key}_result"))
            .with_context(|| format!("No results responses for run {run_key}"))?;
        if originals.len() != results.len() {
            anyhow::bail!(
                "Mismatched response counts for run {run_key}: {} originals vs {} results",
                originals.len(),
                results.len()
            );
        }

        let (direction_code, max_tokens_str) = run_key
            .split_once('_')
            .with_context(|| format!("Bad run key: {run_key}"))?;
        let params = RunParams {
            direction: crate::portraits::SwapDirection::parse(direction_code)?,
            model: HOSTED_MODEL_NAME.to_string(),
            max_tokens: match max_tokens_str {
                "None" => None,
                digits => Some(digits.parse()?),
            },
            temperature: HOSTED_DEFAULT_TEMPERATURE,
            top_p: HOSTED_DEFAULT_TOP_P,
        };

        let summaries: Vec<SummaryPair> = originals
            .iter()
            .zip(results.iter())
            .map(|(o, r)| SummaryPair::new(o.clone(), r.clone()))
            .collect();

        let out_file = out_dir.join(params.file_name());
        store::write_json(&out_file, &summaries)?;
        println!(
            "File created: {}. Length: {}",
            out_file.display(),
            summaries.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_line(custom_id: &str, content: &str) -> String {
        format!(
            r#"{{"custom_id": "{custom_id}", "response": {{"body": {{"choices": [{{"message": {{"content": "{content}"}}}}]}}}}}}"#
        )
    }

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("portrayal-extract-{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn response_text_walks_the_body() {
        let value: Value =
            serde_json::from_str(&response_line("fm-1-female-None", "A summary.")).unwrap();
        assert_eq!(response_text(&value), Some("A summary."));
        assert_eq!(response_text(&Value::Null), None);
    }

    #[test]
    fn read_response_file_groups_by_side() {
        let dir = temp_dir("read");
        let path = dir.join("out.jsonl");
        let lines = [
            response_line("fm-1-female-100", "First."),
            response_line("fm-2-female-100", "Second."),
        ]
        .join("\n");
        fs::write(&path, lines).unwrap();

        let (key, contents) = read_response_file(&path).unwrap();
        assert_eq!(key, "fm_100_original");
        assert_eq!(contents, vec!["First.".to_string(), "Second.".to_string()]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn read_response_file_rejects_mixed_runs() {
        let dir = temp_dir("mixed");
        let path = dir.join("out.jsonl");
        let lines = [
            response_line("fm-1-female-100", "a"),
            response_line("fm-1-female-50", "b"),
        ]
        .join("\n");
        fs::write(&path, lines).unwrap();
        assert!(read_response_file(&path).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn extract_pairs_sides_into_summary_files() {
        let responses = temp_dir("pair-in");
        let out = temp_dir("pair-out");
        fs::write(
            responses.join("file-a.jsonl"),
            response_line("mf-1-male-50", "Original summary."),
        )
        .unwrap();
        fs::write(
            responses.join("file-b.jsonl"),
            response_line("mf-1-female-50", "Result summary."),
        )
        .unwrap();

        extract_responses(&responses, &out).unwrap();

        let pairs: Vec<SummaryPair> =
            store::read_json(&out.join("mf_chatgpt_50_temp_0.7_top-p_0.9.json")).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].original, "Original summary.");
        assert_eq!(pairs[0].result, "Result summary.");
        fs::remove_dir_all(&responses).unwrap();
        fs::remove_dir_all(&out).unwrap();
    }
}
