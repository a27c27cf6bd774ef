// Integration tests for the batch workflow's file handling: request file
// generation and the request → response → summary-file round trip.

use std::fs;
use std::path::PathBuf;

use portrayal::batch::requests::{self, BatchRequestLine, CustomId, MAX_TOKENS_VARIANTS};
use portrayal::batch::extract;
use portrayal::portraits::store;
use portrayal::portraits::{SummaryPair, SwappedPortrait};

fn temp_root(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("portrayal-itest-batch-{name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn minimal_portraits(dir: &PathBuf) {
    let portraits = vec![
        SwappedPortrait::new(10, "She lives alone.".into(), "He lives alone.".into()),
        SwappedPortrait::new(11, "She has carers.".into(), "He has carers.".into()),
    ];
    store::write_json(&dir.join("female_to_male_clean.json"), &portraits).unwrap();
}

#[test]
fn prepare_writes_a_file_per_variant_and_side() {
    let root = temp_root("prepare");
    let minimal = root.join("minimal");
    let requests = root.join("requests");
    fs::create_dir_all(&minimal).unwrap();
    minimal_portraits(&minimal);

    requests::write_request_files(&minimal, &requests, "gpt-4o-mini").unwrap();

    let files = store::files_with_extension(&requests, "jsonl").unwrap();
    // 6 max-token variants x 2 sides
    assert_eq!(files.len(), MAX_TOKENS_VARIANTS.len() * 2);
    assert!(requests
        .join("female_to_male_clean_originals_None.jsonl")
        .exists());
    assert!(requests
        .join("female_to_male_clean_results_50.jsonl")
        .exists());
}

#[test]
fn request_lines_are_valid_and_custom_ids_unique() {
    let root = temp_root("lines");
    let minimal = root.join("minimal");
    let requests = root.join("requests");
    fs::create_dir_all(&minimal).unwrap();
    minimal_portraits(&minimal);

    requests::write_request_files(&minimal, &requests, "gpt-4o-mini").unwrap();

    let mut seen = std::collections::HashSet::new();
    for file in store::files_with_extension(&requests, "jsonl").unwrap() {
        for line in fs::read_to_string(&file).unwrap().lines() {
            let parsed: BatchRequestLine = serde_json::from_str(line).unwrap();
            assert_eq!(parsed.url, "/v1/chat/completions");
            assert_eq!(parsed.body.model, "gpt-4o-mini");
            // Every custom_id decodes and is globally unique
            let id = CustomId::parse(&parsed.custom_id).unwrap();
            assert!(seen.insert(parsed.custom_id.clone()), "duplicate {id:?}");
        }
    }
    // 2 portraits x 2 sides x 6 variants
    assert_eq!(seen.len(), 24);
}

#[test]
fn responses_round_trip_back_to_summary_pairs() {
    let root = temp_root("roundtrip");
    let responses = root.join("responses");
    let out = root.join("summaries");
    fs::create_dir_all(&responses).unwrap();

    let line = |custom_id: &str, content: &str| {
        format!(
            r#"{{"custom_id": "{custom_id}", "response": {{"body": {{"choices": [{{"message": {{"content": "{content}"}}}}]}}}}}}"#
        )
    };

    fs::write(
        responses.join("file-originals.jsonl"),
        [
            line("fm-10-female-300", "Original ten."),
            line("fm-11-female-300", "Original eleven."),
        ]
        .join("\n"),
    )
    .unwrap();
    fs::write(
        responses.join("file-results.jsonl"),
        [
            line("fm-10-male-300", "Result ten."),
            line("fm-11-male-300", "Result eleven."),
        ]
        .join("\n"),
    )
    .unwrap();

    extract::extract_responses(&responses, &out).unwrap();

    let pairs: Vec<SummaryPair> =
        store::read_json(&out.join("fm_chatgpt_300_temp_0.7_top-p_0.9.json")).unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].original, "Original ten.");
    assert_eq!(pairs[0].result, "Result ten.");
    assert_eq!(pairs[1].original, "Original eleven.");
    assert_eq!(pairs[1].result, "Result eleven.");
}

#[test]
fn unparsable_response_files_are_skipped_not_fatal() {
    let root = temp_root("badfile");
    let responses = root.join("responses");
    let out = root.join("summaries");
    fs::create_dir_all(&responses).unwrap();

    fs::write(responses.join("broken.jsonl"), "not json at all\n").unwrap();

    // Nothing to pair, but the run itself succeeds
    extract::extract_responses(&responses, &out).unwrap();
    assert!(store::files_with_extension(&out, "json")
        .map(|v| v.is_empty())
        .unwrap_or(true));
}
