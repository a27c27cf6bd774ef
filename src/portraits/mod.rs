// Portrait data model and JSON file handling.
//
// Every pipeline stage reads one directory of JSON files and writes another.
// The shared shapes live here: source portraits, gender-swapped pairs, and
// generated summary pairs.

pub mod params;
pub mod store;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One care-assessment narrative as it arrives from the source data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portrait {
    #[serde(rename = "DocumentID")]
    pub document_id: u64,
    pub text: String,
}

/// A portrait paired with its gender-swapped counterpart.
///
/// `original_clean` only appears in the cleaned originals files; the raw
/// swap output carries just the two texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwappedPortrait {
    #[serde(rename = "DocumentID")]
    pub document_id: u64,
    pub original: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_clean: Option<String>,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_sentences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_sentences: Option<Vec<String>>,
}

impl SwappedPortrait {
    pub fn new(document_id: u64, original: String, result: String) -> Self {
        Self {
            document_id,
            original,
            original_clean: None,
            result,
            original_sentences: None,
            result_sentences: None,
        }
    }

    /// The original-side text to analyze: the cleaned variant when present.
    pub fn original_text(&self) -> &str {
        self.original_clean.as_deref().unwrap_or(&self.original)
    }
}

/// Summaries of the original and swapped texts for one document.
/// Sentence lists are added by the clean stage for sentence-level scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryPair {
    pub original: String,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_sentences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_sentences: Option<Vec<String>>,
}

impl SummaryPair {
    pub fn new(original: String, result: String) -> Self {
        Self {
            original,
            result,
            original_sentences: None,
            result_sentences: None,
        }
    }
}

/// Which way the gendered language was swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    /// fm — original texts describe women, swapped texts describe men
    FemaleToMale,
    /// mf — original texts describe men, swapped texts describe women
    MaleToFemale,
}

impl SwapDirection {
    /// Parse the two-letter code used in file names and CLI flags.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "fm" => Ok(Self::FemaleToMale),
            "mf" => Ok(Self::MaleToFemale),
            other => anyhow::bail!("The gender parameter must be 'fm' or 'mf', got '{other}'"),
        }
    }

    /// Parse from a gender word ("female" or "male" originals).
    pub fn from_original_gender(s: &str) -> Result<Self> {
        match s {
            "female" => Ok(Self::FemaleToMale),
            "male" => Ok(Self::MaleToFemale),
            other => anyhow::bail!("The original gender must be 'female' or 'male', got '{other}'"),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::FemaleToMale => "fm",
            Self::MaleToFemale => "mf",
        }
    }

    pub fn original_gender(&self) -> &'static str {
        match self {
            Self::FemaleToMale => "female",
            Self::MaleToFemale => "male",
        }
    }

    pub fn result_gender(&self) -> &'static str {
        match self {
            Self::FemaleToMale => "male",
            Self::MaleToFemale => "female",
        }
    }

    /// Stem of the swapped-portraits file, e.g. "female_to_male".
    pub fn portrait_stem(&self) -> String {
        format!("{}_to_{}", self.original_gender(), self.result_gender())
    }

    /// Recover the direction from a portraits file name
    /// ("female_to_male_clean.json" and friends).
    pub fn from_portrait_name(name: &str) -> Option<Self> {
        if name.starts_with("female_to_male") {
            Some(Self::FemaleToMale)
        } else if name.starts_with("male_to_female") {
            Some(Self::MaleToFemale)
        } else {
            None
        }
    }

    /// Recover the direction from any pipeline file name: portrait files
    /// carry a `{gender}_to_{gender}` stem, summary files carry RunParams.
    pub fn from_any_file_name(name: &str) -> Result<Self> {
        if let Some(direction) = Self::from_portrait_name(name) {
            return Ok(direction);
        }
        if let Ok(params) = params::RunParams::from_file_name(name) {
            return Ok(params.direction);
        }
        anyhow::bail!(
            "Expected file name to start with 'fm', 'mf', 'female_to_male' or 'male_to_female': {name}"
        )
    }
}
