// Composition test: the non-model stages chained the way a real run chains
// them — raw swap output and raw summaries through clean, then the lexical
// evaluations reading clean's output directly.

use std::fs;
use std::path::PathBuf;

use portrayal::clean;
use portrayal::lexical::{terms, words};
use portrayal::portraits::store;
use portrayal::portraits::{SummaryPair, SwappedPortrait};

fn temp_root() -> PathBuf {
    let dir = std::env::temp_dir().join("portrayal-itest-composition");
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn clean_feeds_words_and_term_counts() {
    let root = temp_root();

    // --- Stage 1: raw swap output, as the swap stage writes it ---
    let swapped_dir = root.join("gender_swapped_portraits");
    fs::create_dir_all(&swapped_dir).unwrap();
    let portraits = vec![SwappedPortrait::new(
        1,
        "Mrs Smith is a 89 year old woman.\n\nShe has dementia and wanders at night.".into(),
        "Mr Smith is a 89 year old man.\n\nHe has dementia and wanders at night.".into(),
    )];
    store::write_json(&swapped_dir.join("female_to_male.json"), &portraits).unwrap();

    // --- Stage 2: raw summaries, as a generation backend writes them ---
    let raw_summaries = root.join("summaries/raw");
    fs::create_dir_all(&raw_summaries).unwrap();
    let summaries = vec![SummaryPair::new(
        "An elderly woman with dementia who wanders.<|eot_id|>".into(),
        "An elderly man with dementia who wanders.<|eot_id|>".into(),
    )];
    store::write_json(
        &raw_summaries.join("fm_llama3_None_temp_0.6_top-p_0.9.json"),
        &summaries,
    )
    .unwrap();

    // --- Clean both directories ---
    let portraits_clean = root.join("gender_swapped_portraits/clean");
    let summaries_clean = root.join("summaries/clean");
    clean::run(&swapped_dir, &portraits_clean).unwrap();
    clean::run(&raw_summaries, &summaries_clean).unwrap();

    // --- Bag of words over cleaned portraits, then cleaned summaries ---
    // run_originals needs both directions; mirror the single file
    let cleaned: Vec<SwappedPortrait> =
        store::read_json(&portraits_clean.join("female_to_male_clean.json")).unwrap();
    store::write_json(&portraits_clean.join("male_to_female_clean.json"), &cleaned).unwrap();

    let word_counts = root.join("word_counts");
    words::run_originals(&portraits_clean, &word_counts).unwrap();
    words::run_summaries(&summaries_clean, &word_counts).unwrap();

    // The gendered words were flagged in the originals and filtered from
    // the summary counts; the shared vocabulary survived
    let summary_csv = fs::read_to_string(
        word_counts.join("summaries/fm_llama3_None_temp_0.6_top-p_0.9_clean_word_df.csv"),
    )
    .unwrap();
    assert!(summary_csv.contains("dementia,1,1"));
    assert!(!summary_csv.contains("woman"));

    // --- Term counts over the cleaned portraits, with curated term lists ---
    let terms_dir = root.join("themes/themes_output");
    fs::create_dir_all(&terms_dir).unwrap();
    fs::write(terms_dir.join("physical_health.txt"), "\n").unwrap();
    fs::write(terms_dir.join("physical_appearance.txt"), "\n").unwrap();
    fs::write(terms_dir.join("mental_health.txt"), "dementia\nwander\n").unwrap();
    fs::write(terms_dir.join("subjective_language.txt"), "\n").unwrap();

    let term_counts = root.join("term_counts");
    terms::run(&portraits_clean, &term_counts, &terms_dir).unwrap();

    let csv = fs::read_to_string(
        term_counts.join("female_to_male_clean_term_counts.csv"),
    )
    .unwrap();
    assert!(csv.contains("0,dementia,1,1,true,female,mental_health"));
    assert!(csv.contains("0,wander,1,1,true,female,mental_health"));
}
