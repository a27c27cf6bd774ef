// Lenient parsing of model-emitted JSON.
//
// The extraction models mostly return the requested object, but drift in
// predictable ways: surrounding chatter, repeated objects, renamed keys,
// missing keys. This recovers the first object span, normalizes the known
// key aliases, and fills anything missing with the string "Missing" so the
// downstream term collection never has to guess at shape.

use anyhow::{Context, Result};
use serde_json::{Map, Value};

/// Key aliases the models invent, mapped to the canonical names.
const KEY_ALIASES: [(&str, &str); 2] = [
    ("mental_health_info", "mental_health_details"),
    ("physical_health_info", "physical_health_details"),
];

/// Parse one raw generation into the canonical object, tagged with its
/// document index.
pub fn parse_model_json(raw: &str, doc_num: usize, expected_keys: &[&str]) -> Result<Value> {
    let flat = raw.replace('\n', "");
    let start = flat.find('{').context("No JSON object in model output")?;
    let end = flat[start..]
        .find('}')
        .map(|i| start + i)
        .context("Unterminated JSON object in model output")?;
    let json_str = &flat[start..=end];

    let mut obj: Map<String, Value> = serde_json::from_str(json_str)
        .context("Model output is not valid JSON")?;

    for (alias, canonical) in KEY_ALIASES {
        if let Some(value) = obj.remove(alias) {
            obj.entry(canonical.to_string()).or_insert(value);
        }
    }

    for key in expected_keys {
        if !obj.contains_key(*key) {
            obj.insert(key.to_string(), Value::String("Missing".to_string()));
        }
    }

    let mut tagged = Map::new();
    tagged.insert("doc_num".to_string(), Value::from(doc_num));
    tagged.extend(obj);
    Ok(Value::Object(tagged))
}

/// The record written when a generation cannot be parsed at all.
pub fn error_record(doc_num: usize) -> Value {
    serde_json::json!({ "doc_num": doc_num, "status": "error" })
}
