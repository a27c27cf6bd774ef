// Term collection across parsed theme extractions.
//
// Pools the detail strings that multiple models extracted for one theme,
// writing a deduplicated term list (txt, later fed to the hallucination
// check) and a per-term frequency count (how many parsed files mention
// the term).

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::portraits::store;

/// Detail key → topic-type file-name fragment to collect it from.
pub const KEY_TO_TOPIC: [(&str, &str); 4] = [
    ("mental_health_details", "health"),
    ("physical_health_details", "health"),
    ("subjective_language_info", "subjective_language"),
    ("appearance_info", "physical_appearance"),
];

/// Unique detail strings under `key` in one parsed file. Error records and
/// "Missing" fills simply contribute nothing.
fn unique_terms(in_file: &Path, key: &str) -> Result<BTreeSet<String>> {
    let items: Vec<Value> = store::read_json(in_file)?;
    let mut terms = BTreeSet::new();
    for item in items {
        if let Some(Value::Array(values)) = item.get(key) {
            for value in values {
                if let Some(s) = value.as_str() {
                    terms.insert(s.to_string());
                }
            }
        }
    }
    Ok(terms)
}

/// Collect one key's terms across every matching parsed file.
pub fn write_unique_terms(
    parsed_dirs: &[PathBuf],
    key: &str,
    topic: &str,
    out_dir: &Path,
) -> Result<()> {
    let mut per_file_sets: Vec<BTreeSet<String>> = Vec::new();
    println!("Reading in files:");
    for dir in parsed_dirs {
        if !dir.is_dir() {
            println!("No parsed output in {}. Skipping.", dir.display());
            continue;
        }
        for in_file in store::json_files(dir)? {
            let name = in_file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if !name.contains(topic) {
                continue;
            }
            println!("{}", in_file.display());
            per_file_sets.push(unique_terms(&in_file, key)?);
        }
    }

    // A term's count is the number of files whose extractions mention it
    let mut counts: HashMap<String, u64> = HashMap::new();
    for set in &per_file_sets {
        for term in set {
            *counts.entry(term.clone()).or_insert(0) += 1;
        }
    }
    let all_terms: BTreeSet<String> = counts.keys().cloned().collect();

    let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create directory {}", out_dir.display()))?;

    let list_file = out_dir.join(format!("{key}_full.txt"));
    let lines: Vec<&str> = all_terms.iter().map(String::as_str).collect();
    std::fs::write(&list_file, lines.join("\n") + "\n")
        .with_context(|| format!("Failed to write {}", list_file.display()))?;

    let count_file = out_dir.join(format!("{key}_count.json"));
    store::write_json(&count_file, &ranked)?;

    info!(key, terms = all_terms.len(), "Collected theme terms");
    println!(
        "File created: {}. Length: {}",
        list_file.display(),
        all_terms.len()
    );
    Ok(())
}

/// Collect every detail key's terms from the named models' parsed output.
pub fn run(themes_root: &Path, models: &[String], out_dir: &Path) -> Result<()> {
    let parsed_dirs: Vec<PathBuf> = models
        .iter()
        .map(|m| themes_root.join(format!("output_{m}")).join("parsed"))
        .collect();

    for (key, topic) in KEY_TO_TOPIC {
        write_unique_terms(&parsed_dirs, key, topic, out_dir)?;
    }
    Ok(())
}
