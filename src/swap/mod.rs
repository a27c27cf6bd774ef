// Gender-swap stage.
//
// Rewrites each source portrait with a local causal LM so that all gendered
// language (names, pronouns, titles, kinship terms) refers to the other
// gender while everything else is reproduced verbatim. Decoding is greedy
// and the new-token budget tracks the input length, so the model cannot
// pad or editorialize.

use std::path::Path;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::generate::causal::CausalGenerator;
use crate::generate::prompts::SYSTEM_PROMPT;
use crate::generate::traits::GenerationOptions;
use crate::portraits::store;
use crate::portraits::{SwapDirection, SwappedPortrait};

/// Swap instruction for portraits whose subject is currently female.
const SWAP_FEMALE_TO_MALE: &str = "In the following text delimited by triple backticks, change every reference to the person described so that it refers to a man instead of a woman. Change names, pronouns, titles and words such as 'woman', 'wife', 'mother', 'daughter' and 'sister' to their male equivalents. Do not change anything else about the text.";

/// Swap instruction for portraits whose subject is currently male.
const SWAP_MALE_TO_FEMALE: &str = "In the following text delimited by triple backticks, change every reference to the person described so that it refers to a woman instead of a man. Change names, pronouns, titles and words such as 'man', 'husband', 'father', 'son' and 'brother' to their female equivalents. Do not change anything else about the text.";

fn swap_instruction(direction: SwapDirection) -> &'static str {
    match direction {
        SwapDirection::FemaleToMale => SWAP_FEMALE_TO_MALE,
        SwapDirection::MaleToFemale => SWAP_MALE_TO_FEMALE,
    }
}

fn swap_user_prompt(direction: SwapDirection, text: &str) -> String {
    format!("{}\n```{}```", swap_instruction(direction), text)
}

/// Strip the artifacts the model tends to echo around a swapped portrait.
pub fn clean_swap_output(raw: &str) -> String {
    raw.replace('`', "").replace("<|eot_id|>", "").trim().to_string()
}

/// Swap every portrait for one direction and write
/// `{original}_to_{result}.json` into `out_dir`.
pub async fn run(
    generator: &CausalGenerator,
    in_dir: &Path,
    out_dir: &Path,
    direction: SwapDirection,
) -> Result<()> {
    let out_file = out_dir.join(format!("{}.json", direction.portrait_stem()));
    if out_file.is_file() {
        println!("File already exists: {}. Skipping.", out_file.display());
        return Ok(());
    }

    let portraits = store::load_source_portraits(in_dir, direction.original_gender())?;
    info!(
        direction = direction.code(),
        documents = portraits.len(),
        "Swapping gendered language"
    );

    // Scaffolding token count with an empty document; subtracted per portrait
    // so the output budget equals the document's own length.
    let prompt_overhead =
        generator.count_tokens(SYSTEM_PROMPT, &swap_user_prompt(direction, ""))?;

    let pb = ProgressBar::new(portraits.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("=> "),
    );

    let mut output: Vec<SwappedPortrait> = Vec::with_capacity(portraits.len());
    for portrait in &portraits {
        let opts = GenerationOptions {
            prompt_overhead,
            ..GenerationOptions::deterministic()
        };
        let raw = generator
            .generate(SYSTEM_PROMPT, &swap_user_prompt(direction, &portrait.text), &opts)
            .await?;

        output.push(SwappedPortrait::new(
            portrait.document_id,
            portrait.text.clone(),
            clean_swap_output(&raw),
        ));
        store::write_json(&out_file, &output)?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!("Gender-swapped portraits created: {}", out_file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_backticks_and_markers() {
        let raw = "```Mr Smith lives alone.```<|eot_id|>\n";
        assert_eq!(clean_swap_output(raw), "Mr Smith lives alone.");
    }

    #[test]
    fn clean_preserves_inner_text() {
        assert_eq!(clean_swap_output("  already clean  "), "already clean");
    }

    #[test]
    fn instructions_differ_by_direction() {
        let fm = swap_user_prompt(SwapDirection::FemaleToMale, "x");
        let mf = swap_user_prompt(SwapDirection::MaleToFemale, "x");
        assert!(fm.contains("a man instead of a woman"));
        assert!(mf.contains("a woman instead of a man"));
        assert!(fm.ends_with("```x```"));
    }
}
