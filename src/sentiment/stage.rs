// Sentence scoring stage: one CSV per (file, gender side).
//
// Reads cleaned files (which carry sentence splits), scores every sentence
// with the metric's classifier, and writes one row per sentence with the
// document index attached. Output naming mirrors the input naming plus the
// gender of the side scored, so a file pair like
// `fm_gemma_None_temp_0.7_top-p_0.9_clean_{female,male}.csv` lines up
// across every metric.

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::info;

use crate::output::csv_writer;
use crate::portraits::store;
use crate::portraits::SwapDirection;

use super::classifier::SequenceClassifier;
use super::Metric;

/// Both models here are BERT-family exports with pad token id 0.
const PAD_TOKEN_ID: u32 = 0;

/// Pull one side's sentence lists out of a cleaned file.
fn sentence_lists(items: &[Value], key: &str, path: &Path) -> Result<Vec<Vec<String>>> {
    items
        .iter()
        .map(|item| {
            item.get(key)
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|s| s.as_str().map(str::to_string))
                        .collect::<Vec<String>>()
                })
                .with_context(|| {
                    format!(
                        "Missing '{key}' in {} — run `portrayal clean` first",
                        path.display()
                    )
                })
        })
        .collect()
}

fn index_of_max(row: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}

/// Score one side of one file and write its CSV.
async fn write_side_csv(
    metric: Metric,
    classifier: &SequenceClassifier,
    docs: &[Vec<String>],
    out_file: &Path,
) -> Result<()> {
    let labels = metric.labels();
    let mut writer = csv_writer(out_file)?;

    match metric {
        Metric::Regard => {
            writer.write_record(["positive", "other", "neutral", "negative", "doc_num"])?;
        }
        Metric::Sentiment => {
            writer.write_record([
                "text", "pred", "label", "positive", "neutral", "negative", "doc_num",
            ])?;
        }
    }

    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("=> "),
    );

    for (doc_num, sentences) in docs.iter().enumerate() {
        let scores = classifier.classify_batch(sentences).await?;
        for (sentence, probs) in sentences.iter().zip(scores.iter()) {
            match metric {
                Metric::Regard => {
                    // Output columns are fixed; map from the model's order
                    let by_label = |l: &str| {
                        labels
                            .iter()
                            .position(|&x| x == l)
                            .map(|i| probs[i])
                            .unwrap_or(0.0)
                    };
                    writer.write_record([
                        by_label("positive").to_string(),
                        by_label("other").to_string(),
                        by_label("neutral").to_string(),
                        by_label("negative").to_string(),
                        doc_num.to_string(),
                    ])?;
                }
                Metric::Sentiment => {
                    let pred = index_of_max(probs);
                    writer.write_record([
                        sentence.clone(),
                        pred.to_string(),
                        labels[pred].to_string(),
                        probs[0].to_string(),
                        probs[1].to_string(),
                        probs[2].to_string(),
                        doc_num.to_string(),
                    ])?;
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    writer.flush()?;
    println!("Created: {}", out_file.display());
    Ok(())
}

/// Score every cleaned file in `in_dir` with the given metric.
pub async fn run(metric: Metric, in_dir: &Path, out_dir: &Path, model_base: &Path) -> Result<()> {
    let classifier =
        SequenceClassifier::load(&metric.model_dir(model_base), metric.labels(), PAD_TOKEN_ID)?;

    for in_file in store::json_files(in_dir)? {
        println!("Reading in: {}", in_file.display());
        let name = in_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let direction = SwapDirection::from_any_file_name(name)?;
        let stem = in_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        let metric_dir = out_dir.join(metric.name());
        let out_file_original =
            metric_dir.join(format!("{stem}_{}.csv", direction.original_gender()));
        let out_file_result = metric_dir.join(format!("{stem}_{}.csv", direction.result_gender()));

        if out_file_original.is_file() && out_file_result.is_file() {
            println!(
                "{} already calculated for {name}. Skipping.",
                metric.name()
            );
            continue;
        }

        let items: Vec<Value> = store::read_json(&in_file)?;
        let original_docs = sentence_lists(&items, "original_sentences", &in_file)?;
        let result_docs = sentence_lists(&items, "result_sentences", &in_file)?;

        info!(
            metric = metric.name(),
            documents = items.len(),
            file = %in_file.display(),
            "Scoring sentences"
        );

        write_side_csv(metric, &classifier, &original_docs, &out_file_original).await?;
        write_side_csv(metric, &classifier, &result_docs, &out_file_result).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_of_max_basic() {
        assert_eq!(index_of_max(&[0.1, 0.7, 0.2]), 1);
        assert_eq!(index_of_max(&[0.9]), 0);
    }

    #[test]
    fn sentence_lists_extract_in_order() {
        let items: Vec<Value> = vec![
            serde_json::json!({"original_sentences": ["a.", "b."], "result_sentences": ["c."]}),
            serde_json::json!({"original_sentences": [], "result_sentences": ["d."]}),
        ];
        let path = Path::new("x.json");
        let original = sentence_lists(&items, "original_sentences", path).unwrap();
        assert_eq!(original, vec![vec!["a.".to_string(), "b.".to_string()], vec![]]);
        let result = sentence_lists(&items, "result_sentences", path).unwrap();
        assert_eq!(result[1], vec!["d.".to_string()]);
    }

    #[test]
    fn sentence_lists_error_when_not_cleaned() {
        let items: Vec<Value> = vec![serde_json::json!({"original": "raw"})];
        let err = sentence_lists(&items, "original_sentences", Path::new("x.json"));
        assert!(err.is_err());
    }
}
