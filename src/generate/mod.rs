// Summary generation stage.
//
// Drives a Summarizer backend over every portrait pair for one swap
// direction, writing one JSON file of SummaryPairs named from the run
// parameters. The file is rewritten after every document so long runs can
// be inspected while they happen, and a completed file is never
// regenerated.

pub mod causal;
pub mod prompts;
pub mod sampling;
pub mod seq2seq;
pub mod traits;

use std::path::Path;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::portraits::params::RunParams;
use crate::portraits::store;
use crate::portraits::SummaryPair;
use self::traits::{GenerationOptions, Summarizer};

/// Summarize both sides of every portrait pair and write the result file.
pub async fn run(
    summarizer: &dyn Summarizer,
    params: &RunParams,
    portraits_in_dir: &Path,
    out_dir: &Path,
    opts: &GenerationOptions,
) -> Result<()> {
    let out_file = out_dir.join(params.file_name());
    if out_file.is_file() {
        println!("File already exists: {}. Skipping.", out_file.display());
        return Ok(());
    }

    let portraits = store::load_swapped_portraits(portraits_in_dir, params.direction)?;
    info!(
        model = %params.model,
        direction = params.direction.code(),
        documents = portraits.len(),
        "Generating summaries"
    );

    if opts.temperature == 0.0 {
        println!("Temperature is zero. Decoding greedily.");
    }

    let pb = ProgressBar::new(portraits.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("=> "),
    );

    let mut summaries: Vec<SummaryPair> = Vec::with_capacity(portraits.len());
    for portrait in &portraits {
        let original_summary = summarizer.summarize(&portrait.original, opts).await?;
        let result_summary = summarizer.summarize(&portrait.result, opts).await?;
        summaries.push(SummaryPair::new(original_summary, result_summary));

        // Rewrite on every iteration so we can keep an eye on long runs
        store::write_json(&out_file, &summaries)?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!("Summaries generated. File created: {}", out_file.display());
    Ok(())
}
