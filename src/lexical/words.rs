// Bag-of-words comparison between original and gender-swapped text.
//
// Counts normalized words per document on both sides and joins them into
// long-format rows keyed by (doc_num, word), with female and male counts
// side by side. Words that are already unequal in the source portraits
// (woman/man, she/he, names) say nothing about summarization bias, so the
// originals pass records them in an exclusion list that the summaries
// pass filters against.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::output::csv_writer;
use crate::portraits::params::RunParams;
use crate::portraits::store;
use crate::portraits::{SummaryPair, SwapDirection};

use super::lemma::Normalizer;

/// One (document, word) observation with counts from both genders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordRow {
    pub doc_num: usize,
    pub word: String,
    pub word_count_female: u32,
    pub word_count_male: u32,
}

fn count_tokens(tokens: &[String]) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for token in tokens {
        *counts.entry(token.clone()).or_insert(0) += 1;
    }
    counts
}

/// Join both sides of every document into long-format rows. A word present
/// on only one side still gets a row, with zero on the other side.
pub fn word_rows(
    originals: &[Vec<String>],
    results: &[Vec<String>],
    direction: SwapDirection,
) -> Vec<WordRow> {
    let mut rows = Vec::new();
    for (doc_num, (original, result)) in originals.iter().zip(results.iter()).enumerate() {
        let original_counts = count_tokens(original);
        let result_counts = count_tokens(result);

        let words: BTreeSet<&String> = original_counts.keys().chain(result_counts.keys()).collect();
        for word in words {
            let original_count = original_counts.get(word).copied().unwrap_or(0);
            let result_count = result_counts.get(word).copied().unwrap_or(0);
            let (word_count_female, word_count_male) = match direction {
                SwapDirection::FemaleToMale => (original_count, result_count),
                SwapDirection::MaleToFemale => (result_count, original_count),
            };
            rows.push(WordRow {
                doc_num,
                word: word.clone(),
                word_count_female,
                word_count_male,
            });
        }
    }
    rows
}

/// Words whose counts differ anywhere between the two genders.
pub fn unequal_words(rows: &[WordRow]) -> Vec<String> {
    let mut words: BTreeSet<String> = BTreeSet::new();
    for row in rows {
        if row.word_count_female != row.word_count_male {
            words.insert(row.word.clone());
        }
    }
    words.into_iter().collect()
}

fn write_rows(rows: &[WordRow], out_file: &Path) -> Result<()> {
    let mut writer = csv_writer(out_file)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn exclusions_file(out_dir: &Path, direction: SwapDirection) -> std::path::PathBuf {
    out_dir
        .join("txt")
        .join(format!("{}_words_to_exclude.txt", direction.portrait_stem()))
}

/// Count words in the original portraits for both directions, writing the
/// per-direction CSV and the words-to-exclude list the summaries pass needs.
pub fn run_originals(portraits_dir: &Path, out_dir: &Path) -> Result<()> {
    let normalizer = Normalizer::new();

    for direction in [SwapDirection::MaleToFemale, SwapDirection::FemaleToMale] {
        let portraits = store::load_swapped_portraits(portraits_dir, direction)?;
        let originals: Vec<Vec<String>> = portraits
            .iter()
            .map(|p| normalizer.tokens(p.original_text()))
            .collect();
        let results: Vec<Vec<String>> = portraits
            .iter()
            .map(|p| normalizer.tokens(&p.result))
            .collect();

        let rows = word_rows(&originals, &results, direction);

        // Not fair or useful to count words in summaries that are already
        // unequal in the originals, e.g. woman
        let excluded = unequal_words(&rows);
        let exclude_file = exclusions_file(out_dir, direction);
        if let Some(parent) = exclude_file.parent() {
            fs::create_dir_all(parent)?;
        }
        println!("Creating words to exclude file: {}", exclude_file.display());
        fs::write(&exclude_file, excluded.join("\n") + "\n")
            .with_context(|| format!("Failed to write {}", exclude_file.display()))?;

        let out_file = out_dir
            .join("originals")
            .join(format!("{}_word_df.csv", direction.portrait_stem()));
        write_rows(&rows, &out_file)?;
        info!(
            direction = direction.code(),
            rows = rows.len(),
            excluded = excluded.len(),
            "Wrote originals word counts"
        );
        println!("File created: {}", out_file.display());
    }
    Ok(())
}

/// Count words in every cleaned summary file, filtering out the words the
/// originals pass flagged as unequal.
pub fn run_summaries(summaries_dir: &Path, out_dir: &Path) -> Result<()> {
    let normalizer = Normalizer::new();

    for in_file in store::json_files(summaries_dir)? {
        let Ok(params) = RunParams::from_path(&in_file) else {
            println!("Skipping file with unrecognized name: {}", in_file.display());
            continue;
        };
        println!("Generating: {}", in_file.display());

        let exclude_file = exclusions_file(out_dir, params.direction);
        let excluded: BTreeSet<String> = fs::read_to_string(&exclude_file)
            .with_context(|| {
                format!(
                    "Failed to read {} — run `portrayal words --originals` first",
                    exclude_file.display()
                )
            })?
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        let summaries: Vec<SummaryPair> = store::read_json(&in_file)?;
        let originals: Vec<Vec<String>> = summaries
            .iter()
            .map(|s| normalizer.tokens(&s.original))
            .collect();
        let results: Vec<Vec<String>> = summaries
            .iter()
            .map(|s| normalizer.tokens(&s.result))
            .collect();

        let rows: Vec<WordRow> = word_rows(&originals, &results, params.direction)
            .into_iter()
            .filter(|row| !excluded.contains(&row.word))
            .collect();

        let stem = in_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let out_file = out_dir
            .join("summaries")
            .join(format!("{stem}_word_df.csv"));
        write_rows(&rows, &out_file)?;
        println!("File created: {}", out_file.display());
    }
    Ok(())
}
