// Integration tests for the lexical stages: bag-of-words counting with the
// exclusion-list handshake, and term counting over mixed file shapes.

use std::fs;
use std::path::PathBuf;

use portrayal::lexical::{terms, words};
use portrayal::portraits::store;
use portrayal::portraits::{SummaryPair, SwappedPortrait};

fn temp_root(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("portrayal-itest-lexical-{name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn swapped(id: u64, original: &str, result: &str) -> SwappedPortrait {
    let mut p = SwappedPortrait::new(id, original.to_string(), result.to_string());
    p.original_clean = Some(original.to_string());
    p
}

// ============================================================
// Bag of words: originals pass writes the exclusion list,
// summaries pass honors it
// ============================================================

#[test]
fn originals_then_summaries_respect_exclusions() {
    let root = temp_root("exclusions");
    let portraits_dir = root.join("portraits");
    let summaries_dir = root.join("summaries");
    let out_dir = root.join("word_counts");
    fs::create_dir_all(&portraits_dir).unwrap();
    fs::create_dir_all(&summaries_dir).unwrap();

    // "grandmother"/"grandfather" differ between the sides; "dementia" matches
    let portraits = vec![swapped(
        1,
        "The grandmother has dementia.",
        "The grandfather has dementia.",
    )];
    store::write_json(&portraits_dir.join("female_to_male_clean.json"), &portraits).unwrap();
    store::write_json(&portraits_dir.join("male_to_female_clean.json"), &portraits).unwrap();

    words::run_originals(&portraits_dir, &out_dir).unwrap();

    let exclude = fs::read_to_string(
        out_dir.join("txt/female_to_male_words_to_exclude.txt"),
    )
    .unwrap();
    let excluded: Vec<&str> = exclude.lines().collect();
    assert!(excluded.contains(&"grandmother"));
    assert!(excluded.contains(&"grandfather"));
    assert!(!excluded.contains(&"dementia"));

    // Summaries mentioning the excluded words must not count them
    let summaries = vec![SummaryPair::new(
        "The grandmother has dementia.".into(),
        "The grandfather has dementia.".into(),
    )];
    store::write_json(
        &summaries_dir.join("fm_gemma_None_temp_0.7_top-p_0.9_clean.json"),
        &summaries,
    )
    .unwrap();

    words::run_summaries(&summaries_dir, &out_dir).unwrap();

    let csv = fs::read_to_string(
        out_dir.join("summaries/fm_gemma_None_temp_0.7_top-p_0.9_clean_word_df.csv"),
    )
    .unwrap();
    assert!(csv.contains("dementia"));
    assert!(!csv.contains("grandmother"));
    assert!(!csv.contains("grandfather"));
}

#[test]
fn originals_csv_has_long_format_columns() {
    let root = temp_root("columns");
    let portraits_dir = root.join("portraits");
    let out_dir = root.join("word_counts");
    fs::create_dir_all(&portraits_dir).unwrap();

    let portraits = vec![swapped(1, "She enjoys gardening.", "He enjoys gardening.")];
    store::write_json(&portraits_dir.join("female_to_male_clean.json"), &portraits).unwrap();
    store::write_json(&portraits_dir.join("male_to_female_clean.json"), &portraits).unwrap();

    words::run_originals(&portraits_dir, &out_dir).unwrap();

    let csv =
        fs::read_to_string(out_dir.join("originals/female_to_male_word_df.csv")).unwrap();
    let header = csv.lines().next().unwrap();
    assert_eq!(header, "doc_num,word,word_count_female,word_count_male");
    assert!(csv.contains("gardening,1,1"));
}

// ============================================================
// Term counting
// ============================================================

fn write_term_lists(terms_dir: &PathBuf) {
    fs::create_dir_all(terms_dir).unwrap();
    fs::write(terms_dir.join("physical_health.txt"), "pressure sore\nincontinen\n").unwrap();
    fs::write(terms_dir.join("physical_appearance.txt"), "dishevelled\n").unwrap();
    fs::write(terms_dir.join("mental_health.txt"), "dementia\n").unwrap();
    fs::write(terms_dir.join("subjective_language.txt"), "unwise\n").unwrap();
}

#[test]
fn term_counts_cover_all_types_and_skip_existing() {
    let root = temp_root("terms");
    let in_dir = root.join("clean");
    let out_dir = root.join("term_counts");
    let terms_dir = root.join("themes_output");
    fs::create_dir_all(&in_dir).unwrap();
    write_term_lists(&terms_dir);

    let portraits = vec![swapped(
        1,
        "She has dementia and a pressure sore. She is incontinent.",
        "He has dementia. He is incontinent, with incontinence pads.",
    )];
    store::write_json(&in_dir.join("male_to_female_clean.json"), &portraits).unwrap();

    terms::run(&in_dir, &out_dir, &terms_dir).unwrap();

    let out_file = out_dir.join("male_to_female_clean_term_counts.csv");
    let csv = fs::read_to_string(&out_file).unwrap();
    let header = csv.lines().next().unwrap();
    assert_eq!(
        header,
        "doc_num,term,male_count,female_count,counts_equal,original_gender,term_type"
    );
    // Prefix matching: one side has 1 "incontinen" match, the other 2
    assert!(csv.contains("0,incontinen,1,2,false,male,physical_health"));
    assert!(csv.contains("0,dementia,1,1,true,male,mental_health"));

    // Re-running must not rewrite the file
    let before = fs::metadata(&out_file).unwrap().modified().unwrap();
    terms::run(&in_dir, &out_dir, &terms_dir).unwrap();
    let after = fs::metadata(&out_file).unwrap().modified().unwrap();
    assert_eq!(before, after);
}

#[test]
fn term_counts_work_on_summary_files_too() {
    let root = temp_root("terms-summaries");
    let in_dir = root.join("clean");
    let out_dir = root.join("term_counts");
    let terms_dir = root.join("themes_output");
    fs::create_dir_all(&in_dir).unwrap();
    write_term_lists(&terms_dir);

    let summaries = vec![SummaryPair::new(
        "She appears dishevelled.".into(),
        "He makes unwise decisions.".into(),
    )];
    store::write_json(
        &in_dir.join("fm_bart_50_temp_1.0_top-p_1.0_clean.json"),
        &summaries,
    )
    .unwrap();

    terms::run(&in_dir, &out_dir, &terms_dir).unwrap();

    let csv = fs::read_to_string(
        out_dir.join("fm_bart_50_temp_1.0_top-p_1.0_clean_term_counts.csv"),
    )
    .unwrap();
    assert!(csv.contains("0,dishevelled,1,0,false,female,physical_appearance"));
    assert!(csv.contains("0,unwise,0,1,false,female,subjective_language"));
}
