// Portrayal: gender-bias study pipeline for care-assessment portraits
//
// This is the library root. Each module corresponds to one stage of the
// pipeline: swap gendered language, summarize with several model backends,
// clean the generated text, then run lexical / sentiment / theme evaluations.

pub mod batch;
pub mod clean;
pub mod config;
pub mod generate;
pub mod lexical;
pub mod models;
pub mod output;
pub mod portraits;
pub mod sentiment;
pub mod status;
pub mod swap;
pub mod themes;
