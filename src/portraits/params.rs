// Generation-run parameters encoded into output file names.
//
// Every summary file is named `{gender}_{model}_{max_tokens}_temp_{t}_top-p_{p}.json`
// (e.g. `fm_gemma_None_temp_0.7_top-p_0.9.json`); the clean stage appends a
// `_clean` suffix. Downstream stages recover the parameters by parsing the
// name rather than threading them through.

use std::path::Path;

use anyhow::{Context, Result};
use regex_lite::Regex;

use super::SwapDirection;

/// Parameters of one summary-generation run, recoverable from its file name.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParams {
    pub direction: SwapDirection,
    pub model: String,
    /// None means the output could be as long as the input.
    pub max_tokens: Option<u32>,
    pub temperature: f64,
    pub top_p: f64,
}

impl RunParams {
    /// File stem without extension, e.g. `fm_llama3_100_temp_0.6_top-p_0.9`.
    pub fn file_stem(&self) -> String {
        let max_tokens = match self.max_tokens {
            Some(n) => n.to_string(),
            None => "None".to_string(),
        };
        format!(
            "{}_{}_{}_temp_{}_top-p_{}",
            self.direction.code(),
            self.model,
            max_tokens,
            fmt_float(self.temperature),
            fmt_float(self.top_p),
        )
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.file_stem())
    }

    pub fn clean_file_name(&self) -> String {
        format!("{}_clean.json", self.file_stem())
    }

    /// Parse parameters back out of a raw or cleaned summary file name.
    pub fn from_file_name(name: &str) -> Result<Self> {
        // Lazy captures so a trailing `_clean` is not swallowed by top_p.
        let re = Regex::new(r"^(fm|mf)_(\w+?)_(\d+|None)_temp_(.+?)_top-p_(.+?)(?:_clean)?\.json$")
            .expect("valid run-params regex");
        let caps = re
            .captures(name)
            .with_context(|| format!("File name is not in the expected format: {name}"))?;

        let direction = SwapDirection::parse(&caps[1])?;
        let model = caps[2].to_string();
        let max_tokens = match &caps[3] {
            "None" => None,
            digits => Some(digits.parse::<u32>()?),
        };
        let temperature: f64 = caps[4]
            .parse()
            .with_context(|| format!("Bad temperature in file name: {name}"))?;
        let top_p: f64 = caps[5]
            .parse()
            .with_context(|| format!("Bad top-p in file name: {name}"))?;

        Ok(Self {
            direction,
            model,
            max_tokens,
            temperature,
            top_p,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Path has no usable file name: {}", path.display()))?;
        Self::from_file_name(name)
    }
}

/// Format a float the way the file-name convention expects: integral values
/// keep a trailing `.0` so `1.0` round-trips as "1.0", not "1".
fn fmt_float(v: f64) -> String {
    let s = v.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_formats_all_fields() {
        let params = RunParams {
            direction: SwapDirection::FemaleToMale,
            model: "llama3".into(),
            max_tokens: Some(100),
            temperature: 0.6,
            top_p: 0.9,
        };
        assert_eq!(params.file_stem(), "fm_llama3_100_temp_0.6_top-p_0.9");
        assert_eq!(params.file_name(), "fm_llama3_100_temp_0.6_top-p_0.9.json");
        assert_eq!(
            params.clean_file_name(),
            "fm_llama3_100_temp_0.6_top-p_0.9_clean.json"
        );
    }

    #[test]
    fn unlimited_tokens_format_as_none() {
        let params = RunParams {
            direction: SwapDirection::MaleToFemale,
            model: "gemma".into(),
            max_tokens: None,
            temperature: 0.7,
            top_p: 0.9,
        };
        assert_eq!(params.file_stem(), "mf_gemma_None_temp_0.7_top-p_0.9");
    }

    #[test]
    fn integral_floats_keep_decimal_point() {
        let params = RunParams {
            direction: SwapDirection::FemaleToMale,
            model: "bart".into(),
            max_tokens: Some(50),
            temperature: 1.0,
            top_p: 1.0,
        };
        assert_eq!(params.file_stem(), "fm_bart_50_temp_1.0_top-p_1.0");
    }

    #[test]
    fn parse_round_trips() {
        let params = RunParams {
            direction: SwapDirection::MaleToFemale,
            model: "chatgpt".into(),
            max_tokens: Some(300),
            temperature: 0.7,
            top_p: 0.9,
        };
        let parsed = RunParams::from_file_name(&params.file_name()).unwrap();
        assert_eq!(parsed, params);
        let parsed_clean = RunParams::from_file_name(&params.clean_file_name()).unwrap();
        assert_eq!(parsed_clean, params);
    }

    #[test]
    fn parse_handles_none_tokens() {
        let parsed = RunParams::from_file_name("fm_gemma_None_temp_0.7_top-p_0.9.json").unwrap();
        assert_eq!(parsed.max_tokens, None);
        assert_eq!(parsed.model, "gemma");
        assert_eq!(parsed.direction, SwapDirection::FemaleToMale);
    }

    #[test]
    fn parse_clean_suffix_not_swallowed_by_top_p() {
        let parsed =
            RunParams::from_file_name("mf_llama3_None_temp_0.6_top-p_0.9_clean.json").unwrap();
        assert!((parsed.top_p - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_rejects_originals_and_garbage() {
        assert!(RunParams::from_file_name("male_to_female_clean.json").is_err());
        assert!(RunParams::from_file_name("notes.txt").is_err());
        assert!(RunParams::from_file_name("xx_gemma_None_temp_0.7_top-p_0.9.json").is_err());
    }
}
