// JSON file I/O for portraits and summaries.
//
// Stages are idempotent: writers create parent directories, readers glob a
// directory, and expensive outputs are skipped when the file already exists.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use super::{Portrait, SwapDirection, SwappedPortrait};

/// Read and deserialize a whole JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Serialize to JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let raw = serde_json::to_string(value)?;
    fs::write(path, raw).with_context(|| format!("Failed to write {}", path.display()))
}

/// All `.json` files directly inside a directory, sorted by name so runs
/// are deterministic.
pub fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    files_with_extension(dir, "json")
}

pub fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory {}", dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().map(|e| e == ext).unwrap_or(false))
        .collect();
    files.sort();
    Ok(files)
}

/// Load the source portraits for one gender: `{gender}_portraits.json`.
pub fn load_source_portraits(in_dir: &Path, original_gender: &str) -> Result<Vec<Portrait>> {
    let in_file = in_dir.join(format!("{original_gender}_portraits.json"));
    read_json(&in_file)
}

/// Load the cleaned gender-swapped portraits for one direction:
/// `{original}_to_{result}_clean.json`.
pub fn load_swapped_portraits(
    portraits_dir: &Path,
    direction: SwapDirection,
) -> Result<Vec<SwappedPortrait>> {
    let in_file = portraits_dir.join(format!("{}_clean.json", direction.portrait_stem()));
    read_json(&in_file)
}

/// Document IDs flagged for removal, keyed by swap-direction stem
/// ("male_to_female" / "female_to_male").
#[derive(Debug, serde::Deserialize)]
pub struct DocsToRemove {
    pub male_to_female: Vec<u64>,
    pub female_to_male: Vec<u64>,
}

/// Drop documents whose word counts were flagged as incomparable, writing
/// filtered copies into a `minimal/` subdirectory. Done before summarization:
/// there is no point summarizing documents we cannot compare.
pub fn remove_docs(portraits_dir: &Path, exclusions_file: &Path) -> Result<()> {
    let exclusions: DocsToRemove = read_json(exclusions_file)?;

    for (direction, excluded) in [
        (SwapDirection::MaleToFemale, &exclusions.male_to_female),
        (SwapDirection::FemaleToMale, &exclusions.female_to_male),
    ] {
        let portraits = load_swapped_portraits(portraits_dir, direction)?;
        let before = portraits.len();
        let minimal: Vec<SwappedPortrait> = portraits
            .into_iter()
            .filter(|p| !excluded.contains(&p.document_id))
            .collect();

        let out_file = portraits_dir
            .join("minimal")
            .join(format!("{}_clean.json", direction.portrait_stem()));
        write_json(&out_file, &minimal)?;
        info!(
            direction = direction.code(),
            kept = minimal.len(),
            removed = before - minimal.len(),
            "Wrote minimal portraits"
        );
        println!(
            "Minimal portraits written: {} ({} of {} kept)",
            out_file.display(),
            minimal.len(),
            before
        );
    }
    Ok(())
}

/// Delete generated files with the given extension from a directory and its
/// subdirectories. Used by `reset`: every other stage refuses to overwrite,
/// so a from-scratch re-run starts here.
pub fn delete_generated(dir: &Path, ext: &str) -> Result<usize> {
    if !dir.is_dir() {
        println!(
            "Cannot delete files from: {}. It does not exist or is not a directory.",
            dir.display()
        );
        return Ok(0);
    }

    let mut deleted = 0;
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(&current)
            .with_context(|| format!("Failed to list directory {}", current.display()))?
        {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().map(|e| e == ext).unwrap_or(false) {
                println!("Deleting file: {}", path.display());
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to delete {}", path.display()))?;
                deleted += 1;
            }
        }
    }
    Ok(deleted)
}
