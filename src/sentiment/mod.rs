// Sentence-level sentiment and regard evaluation.
//
// Sentences do not correspond one-to-one across the gender pair, so the
// comparison unit is the per-document mean of sentence scores (see
// aggregate). Two metrics run over the same cleaned files:
//   regard    — social perception of the person described (4 classes)
//   sentiment — plain polarity (3 classes)

pub mod aggregate;
pub mod classifier;
pub mod stage;

use std::path::{Path, PathBuf};

use anyhow::Result;

/// Which classifier to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Regard,
    Sentiment,
}

/// Logit order of the regard model.
const REGARD_LABELS: [&str; 4] = ["negative", "neutral", "positive", "other"];

/// Logit order of the distilbert sentiment model.
const SENTIMENT_LABELS: [&str; 3] = ["positive", "neutral", "negative"];

impl Metric {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "regard" => Ok(Self::Regard),
            "sentiment" => Ok(Self::Sentiment),
            other => anyhow::bail!("Unknown metric '{other}' (expected regard or sentiment)"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Regard => "regard",
            Self::Sentiment => "sentiment",
        }
    }

    /// Class labels in the order the model emits logits.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Self::Regard => &REGARD_LABELS,
            Self::Sentiment => &SENTIMENT_LABELS,
        }
    }

    /// Where `download-model` put this metric's files.
    pub fn model_dir(&self, base: &Path) -> PathBuf {
        match self {
            Self::Regard => crate::models::download::regard_model_dir(base),
            Self::Sentiment => crate::models::download::sentiment_model_dir(base),
        }
    }
}
