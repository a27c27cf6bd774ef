// Pipeline status display — shows which stage outputs exist under a root.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::portraits::store;

/// The conventional stage directories, in pipeline order.
const STAGES: &[(&str, &str, &str)] = &[
    ("Swapped portraits", "gender_swapped_portraits", "json"),
    ("Cleaned portraits", "gender_swapped_portraits/clean", "json"),
    ("Minimal portraits", "gender_swapped_portraits/clean/minimal", "json"),
    ("Raw summaries", "summaries/raw", "json"),
    ("Cleaned summaries", "summaries/clean", "json"),
    ("Batch requests", "batch/requests", "jsonl"),
    ("Batch responses", "batch/responses", "jsonl"),
    ("Word counts (originals)", "word_counts/originals", "csv"),
    ("Word counts (summaries)", "word_counts/summaries", "csv"),
    ("Regard scores", "sentiment_output/regard", "csv"),
    ("Regard means", "sentiment_output/regard/mean", "csv"),
    ("Sentiment scores", "sentiment_output/sentiment", "csv"),
    ("Sentiment means", "sentiment_output/sentiment/mean", "csv"),
    ("Theme terms", "themes/themes_output", "txt"),
    ("Term counts", "term_counts", "csv"),
];

/// Display how far the pipeline has progressed under `root`.
pub fn show(root: &Path) -> Result<()> {
    println!("Pipeline outputs under {}:\n", root.display());

    for &(label, subdir, ext) in STAGES {
        let dir = root.join(subdir);
        if !dir.is_dir() {
            println!("  {:<26} {}", label, "missing".dimmed());
            continue;
        }
        let count = store::files_with_extension(&dir, ext)?.len();
        if count == 0 {
            println!("  {:<26} {}", label, "empty".yellow());
        } else {
            println!(
                "  {:<26} {}",
                label,
                format!("{count} file(s)").green()
            );
        }
    }

    println!(
        "\n{}",
        "Stages never overwrite their outputs; use `portrayal reset` before a from-scratch re-run."
            .dimmed()
    );
    Ok(())
}
