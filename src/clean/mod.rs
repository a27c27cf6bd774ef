// Cleaning for generated text.
//
// Models leave different artifacts: end-of-turn markers, stray backticks,
// "Here is a summary" preambles, runs of newlines. Each model gets its own
// chain of fixes; the original portraits get the light chain (nothing is
// deleted from source data). Cleaned files also carry their sentence
// splits for the sentence-level evaluation stages.

pub mod sentences;

use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::portraits::params::RunParams;
use crate::portraits::store;
use crate::portraits::{SummaryPair, SwapDirection, SwappedPortrait};
use self::sentences::split_sentences;

/// End-of-turn marker per model family.
fn eos_token(model: &str) -> Option<&'static str> {
    match model {
        "llama3" => Some("<|eot_id|>"),
        "gemma" => Some("<eos>"),
        _ => None,
    }
}

/// Remove the end-of-turn marker and any backticks that have crept in.
pub fn replace_eos_token(pairs: &mut [SummaryPair], eos: &str) {
    for pair in pairs {
        pair.original = pair.original.replace(eos, "").replace('`', "");
        pair.result = pair.result.replace(eos, "").replace('`', "");
    }
}

/// Drop a leading "Here is a summary of the text" style line. The
/// original/result sides don't always both include it, and it would skew
/// the sentence-level sentiment comparison. Only Llama 3 does this.
pub fn remove_summary_prefixes(pairs: &mut [SummaryPair]) {
    fn strip(text: &str) -> String {
        let mut lines = text.split('\n');
        match lines.next() {
            Some(first) if first.to_lowercase().contains("summar") => {
                lines.collect::<Vec<_>>().join("\n").trim().to_string()
            }
            _ => text.to_string(),
        }
    }
    for pair in pairs {
        pair.original = strip(&pair.original);
        pair.result = strip(&pair.result);
    }
}

/// Collapse every run of whitespace to a single space and trim. Repeated
/// newlines otherwise confuse the sentence splitter.
pub fn squish(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn squish_spaces(pairs: &mut [SummaryPair]) {
    for pair in pairs {
        pair.original = squish(&pair.original);
        pair.result = squish(&pair.result);
    }
}

/// Occasionally a summary comes back completely blank (or as bare
/// newlines, which squishing reduces to nothing). Those documents cannot
/// be compared, so the whole pair goes.
pub fn delete_blank_pairs(pairs: &mut Vec<SummaryPair>) {
    let before = pairs.len();
    pairs.retain(|p| !p.original.is_empty() && !p.result.is_empty());
    if pairs.len() < before {
        println!("There are blank summaries in this file.");
        warn!(removed = before - pairs.len(), "Deleted blank summary pairs");
    }
}

/// Attach sentence splits for the sentence-level evaluation stages.
pub fn add_sentences(pairs: &mut [SummaryPair]) {
    for pair in pairs {
        pair.original_sentences = Some(split_sentences(&pair.original));
        pair.result_sentences = Some(split_sentences(&pair.result));
    }
}

/// Clean one summary file with its model's chain.
pub fn clean_summary_file(in_file: &Path, out_dir: &Path, params: &RunParams) -> Result<()> {
    let mut pairs: Vec<SummaryPair> = store::read_json(in_file)?;
    println!(
        "Cleaning file with functions associated with: {}",
        params.model
    );

    if let Some(eos) = eos_token(&params.model) {
        replace_eos_token(&mut pairs, eos);
    }
    if params.model == "llama3" {
        remove_summary_prefixes(&mut pairs);
    }
    squish_spaces(&mut pairs);
    add_sentences(&mut pairs);
    delete_blank_pairs(&mut pairs);

    let out_file = out_dir.join(params.clean_file_name());
    store::write_json(&out_file, &pairs)?;
    println!("Saved: {}", out_file.display());
    Ok(())
}

/// Clean one swapped-portraits file: squish into `original_clean` and
/// `result`, attach sentences. Source documents are never deleted.
pub fn clean_originals_file(in_file: &Path, out_dir: &Path) -> Result<()> {
    let mut portraits: Vec<SwappedPortrait> = store::read_json(in_file)?;
    println!("Cleaning file with functions associated with: originals");

    for portrait in &mut portraits {
        let original_clean = squish(&portrait.original);
        portrait.result = squish(&portrait.result);
        portrait.original_sentences = Some(split_sentences(&original_clean));
        portrait.result_sentences = Some(split_sentences(&portrait.result));
        portrait.original_clean = Some(original_clean);
    }

    let stem = in_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let out_file = out_dir.join(format!("{stem}_clean.json"));
    store::write_json(&out_file, &portraits)?;
    println!("Saved: {}", out_file.display());
    Ok(())
}

/// Clean every JSON file in a directory, dispatching on the file name.
pub fn run(in_dir: &Path, out_dir: &Path) -> Result<()> {
    for in_file in store::json_files(in_dir)? {
        println!("Cleaning: {}", in_file.display());
        let name = in_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        if let Ok(params) = RunParams::from_path(&in_file) {
            clean_summary_file(&in_file, out_dir, &params)?;
        } else if SwapDirection::from_portrait_name(name).is_some() {
            clean_originals_file(&in_file, out_dir)?;
        } else {
            info!(file = %in_file.display(), "Skipping file with unrecognized name");
            println!("Skipping file with unrecognized name: {name}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(original: &str, result: &str) -> SummaryPair {
        SummaryPair::new(original.to_string(), result.to_string())
    }

    #[test]
    fn eos_and_backticks_removed_from_both_sides() {
        let mut pairs = vec![pair("A summary.<|eot_id|>", "```B summary.```<|eot_id|>")];
        replace_eos_token(&mut pairs, "<|eot_id|>");
        assert_eq!(pairs[0].original, "A summary.");
        assert_eq!(pairs[0].result, "B summary.");
    }

    #[test]
    fn summary_prefix_line_dropped_only_when_present() {
        let mut pairs = vec![pair(
            "Here is a summary of the text:\nMr Smith lives alone.",
            "Mr Smith lives alone.",
        )];
        remove_summary_prefixes(&mut pairs);
        assert_eq!(pairs[0].original, "Mr Smith lives alone.");
        assert_eq!(pairs[0].result, "Mr Smith lives alone.");
    }

    #[test]
    fn squish_collapses_whitespace_runs() {
        assert_eq!(squish("a\n\n\nb   c\t d"), "a b c d");
        assert_eq!(squish("\n \n"), "");
    }

    #[test]
    fn blank_pairs_removed_with_both_sides() {
        let mut pairs = vec![pair("kept", "kept"), pair("", "present"), pair("present", "")];
        delete_blank_pairs(&mut pairs);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].original, "kept");
    }

    #[test]
    fn sentences_attached_to_both_sides() {
        let mut pairs = vec![pair("One. Two.", "Three.")];
        add_sentences(&mut pairs);
        assert_eq!(
            pairs[0].original_sentences.as_deref().unwrap(),
            ["One.", "Two."]
        );
        assert_eq!(pairs[0].result_sentences.as_deref().unwrap(), ["Three."]);
    }

    #[test]
    fn originals_cleaning_preserves_raw_text() {
        let dir = std::env::temp_dir().join("portrayal-clean-originals");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let portraits = vec![SwappedPortrait::new(
            1,
            "Raw  text.\n\nSecond sentence.".into(),
            "Swapped  text.".into(),
        )];
        let in_file = dir.join("female_to_male.json");
        store::write_json(&in_file, &portraits).unwrap();

        clean_originals_file(&in_file, &dir).unwrap();

        let cleaned: Vec<SwappedPortrait> =
            store::read_json(&dir.join("female_to_male_clean.json")).unwrap();
        assert_eq!(cleaned[0].original, "Raw  text.\n\nSecond sentence.");
        assert_eq!(
            cleaned[0].original_clean.as_deref(),
            Some("Raw text. Second sentence.")
        );
        assert_eq!(cleaned[0].result, "Swapped text.");
        assert_eq!(
            cleaned[0].original_sentences.as_deref().unwrap().len(),
            2
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
