// Hallucination check: term counting in portrait and summary pairs.
//
// Given the theme term lists, counts how often each term appears on each
// side of every document. A swapped or summarized text that mentions a
// condition its counterpart does not is either a dropped detail or an
// invented one — both show up here as unequal counts.
//
// Terms are matched by prefix over a sliding token window so one entry can
// cover inflections: "incontinen" matches incontinent and incontinence,
// "pressure sore" includes "pressure sores". A false positive is
// theoretically possible but the term lists make it unlikely.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::output::csv_writer;
use crate::portraits::store;
use crate::portraits::SwapDirection;

/// Theme term lists, in the order their counts appear in the output.
pub const TERM_TYPES: [(&str, &str); 4] = [
    ("physical_health", "physical_health.txt"),
    ("physical_appearance", "physical_appearance.txt"),
    ("mental_health", "mental_health.txt"),
    ("subjective_language", "subjective_language.txt"),
];

/// Map punctuation to spaces and lowercase, so tokens split cleanly.
pub fn strip_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_punctuation() { ' ' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Count prefix matches of a (possibly multi-word) term in a token stream.
pub fn count_term(tokens: &[&str], term: &str) -> u32 {
    let term_len = term.split_whitespace().count().max(1);
    let mut count = 0;
    for i in 0..tokens.len() {
        let end = (i + term_len).min(tokens.len());
        let window = tokens[i..end].join(" ");
        if window.starts_with(term) {
            count += 1;
        }
    }
    count
}

/// Both text sides of one document, whatever shape the file has.
fn document_sides(item: &Value) -> Result<(String, String)> {
    let original = item
        .get("original_clean")
        .or_else(|| item.get("original"))
        .and_then(|v| v.as_str())
        .context("Document without an original text")?;
    let result = item
        .get("result")
        .and_then(|v| v.as_str())
        .context("Document without a result text")?;
    Ok((strip_punctuation(original), strip_punctuation(result)))
}

fn load_terms(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read terms file {}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Count every term of every theme in every document of one file.
pub fn count_file(in_file: &Path, out_file: &Path, terms_dir: &Path) -> Result<()> {
    let name = in_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let direction = SwapDirection::from_any_file_name(name)?;
    let original_gender = direction.original_gender();
    let result_gender = direction.result_gender();

    let items: Vec<Value> = store::read_json(in_file)?;
    let sides: Vec<(String, String)> = items
        .iter()
        .map(document_sides)
        .collect::<Result<Vec<_>>>()?;

    let mut writer = csv_writer(out_file)?;
    let original_col = format!("{original_gender}_count");
    let result_col = format!("{result_gender}_count");
    writer.write_record([
        "doc_num",
        "term",
        original_col.as_str(),
        result_col.as_str(),
        "counts_equal",
        "original_gender",
        "term_type",
    ])?;

    for (term_type, terms_file) in TERM_TYPES {
        let terms = load_terms(&terms_dir.join(terms_file))?;
        for term in &terms {
            for (doc_num, (original, result)) in sides.iter().enumerate() {
                let original_tokens: Vec<&str> = original.split_whitespace().collect();
                let result_tokens: Vec<&str> = result.split_whitespace().collect();
                let original_count = count_term(&original_tokens, term);
                let result_count = count_term(&result_tokens, term);
                writer.write_record([
                    doc_num.to_string(),
                    term.clone(),
                    original_count.to_string(),
                    result_count.to_string(),
                    (original_count == result_count).to_string(),
                    original_gender.to_string(),
                    term_type.to_string(),
                ])?;
            }
        }
    }
    writer.flush()?;
    println!("Created: {}", out_file.display());
    Ok(())
}

/// Count terms across every JSON file in a directory, skipping files whose
/// counts already exist.
pub fn run(in_dir: &Path, out_dir: &Path, terms_dir: &Path) -> Result<()> {
    for in_file in store::json_files(in_dir)? {
        let stem = in_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let out_file = out_dir.join(format!("{stem}_term_counts.csv"));
        if out_file.is_file() {
            println!("File already exists. Skipping: {}", out_file.display());
            continue;
        }
        info!(file = %in_file.display(), "Counting terms");
        count_file(&in_file, &out_file, terms_dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_becomes_spaces() {
        assert_eq!(
            strip_punctuation("Mrs. Smith's flat, 2nd floor!"),
            "mrs  smith s flat  2nd floor "
        );
    }

    #[test]
    fn single_word_term_counts_every_occurrence() {
        let text = strip_punctuation("She wanders. Wandering daily, she wanders again.");
        let tokens: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(count_term(&tokens, "wander"), 3);
    }

    #[test]
    fn prefix_matches_inflections() {
        let tokens = ["she", "is", "incontinent", "incontinence", "noted"];
        assert_eq!(count_term(&tokens, "incontinen"), 2);
    }

    #[test]
    fn multi_word_term_matches_across_tokens() {
        let tokens = ["grade", "2", "pressure", "sores", "present"];
        assert_eq!(count_term(&tokens, "pressure sore"), 1);
        assert_eq!(count_term(&tokens, "pressure ulcer"), 0);
    }

    #[test]
    fn window_shorter_than_term_never_matches() {
        let tokens = ["pressure"];
        assert_eq!(count_term(&tokens, "pressure sore"), 0);
    }

    #[test]
    fn genders_resolved_from_both_name_shapes() {
        assert_eq!(
            SwapDirection::from_any_file_name("male_to_female_clean.json").unwrap(),
            SwapDirection::MaleToFemale
        );
        assert_eq!(
            SwapDirection::from_any_file_name("fm_llama3_None_temp_0.6_top-p_0.9_clean.json")
                .unwrap(),
            SwapDirection::FemaleToMale
        );
        assert!(SwapDirection::from_any_file_name("random.json").is_err());
    }

    #[test]
    fn document_sides_prefer_clean_original() {
        let item: Value = serde_json::json!({
            "original": "Raw!",
            "original_clean": "Clean.",
            "result": "Result."
        });
        let (original, result) = document_sides(&item).unwrap();
        assert_eq!(original, "clean ");
        assert_eq!(result, "result ");
    }
}
