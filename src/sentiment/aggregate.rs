// Per-document mean aggregation of sentence scores.
//
// Sentences cannot be compared like-for-like between the male and female
// sides — the two summaries rarely split the same way — so each document
// is reduced to the mean of its sentence scores per column. Mean is not
// the only defensible choice (min/max might expose more variation) but it
// is the one the comparison downstream consumes.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::output::csv_writer;
use crate::portraits::store;

/// Aggregate one CSV: group rows by doc_num and mean every numeric column.
/// Non-numeric columns (sentence text, predicted label) are dropped.
pub fn mean_file(in_file: &Path, out_file: &Path) -> Result<()> {
    let mut reader = csv::Reader::from_path(in_file)
        .with_context(|| format!("Failed to read {}", in_file.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("CSV without headers")?
        .iter()
        .map(str::to_string)
        .collect();

    let doc_idx = headers
        .iter()
        .position(|h| h == "doc_num")
        .with_context(|| format!("No doc_num column in {}", in_file.display()))?;

    let records: Vec<csv::StringRecord> = reader
        .records()
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Bad CSV row in {}", in_file.display()))?;

    // A column is numeric when every value in it parses as f64
    let numeric_cols: Vec<usize> = (0..headers.len())
        .filter(|&i| i != doc_idx)
        .filter(|&i| {
            records
                .iter()
                .all(|r| r.get(i).map(|v| v.parse::<f64>().is_ok()).unwrap_or(false))
        })
        .collect();

    // doc_num → (per-column sums, row count), ordered by document
    let mut groups: BTreeMap<i64, (Vec<f64>, usize)> = BTreeMap::new();
    for record in &records {
        let doc: i64 = record
            .get(doc_idx)
            .and_then(|v| v.parse().ok())
            .with_context(|| format!("Bad doc_num in {}", in_file.display()))?;
        let entry = groups
            .entry(doc)
            .or_insert_with(|| (vec![0.0; numeric_cols.len()], 0));
        for (k, &col) in numeric_cols.iter().enumerate() {
            entry.0[k] += record
                .get(col)
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(0.0);
        }
        entry.1 += 1;
    }

    let mut writer = csv_writer(out_file)?;
    let mut out_headers = vec!["doc_num".to_string()];
    out_headers.extend(numeric_cols.iter().map(|&i| headers[i].clone()));
    writer.write_record(&out_headers)?;

    for (doc, (sums, count)) in &groups {
        let mut row = vec![doc.to_string()];
        row.extend(sums.iter().map(|s| (s / *count as f64).to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Aggregate every per-sentence CSV under `{in_dir}/{metric}` into
/// `{in_dir}/{metric}/mean/`.
pub fn run(in_dir: &Path, metrics: &[&str]) -> Result<()> {
    for &metric in metrics {
        let metric_dir = in_dir.join(metric);
        if !metric_dir.is_dir() {
            println!("No {metric} scores found in {}. Skipping.", in_dir.display());
            continue;
        }
        for in_file in store::files_with_extension(&metric_dir, "csv")? {
            let name = in_file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let out_file = metric_dir.join("mean").join(name);
            mean_file(&in_file, &out_file)?;
            info!(metric, file = name, "Aggregated sentence scores");
            println!("File created: {}", out_file.display());
        }
    }
    Ok(())
}
