use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use portrayal::config::Config;
use portrayal::generate::causal::{CausalGenerator, CausalSummarizer};
use portrayal::generate::prompts::PromptStyle;
use portrayal::generate::seq2seq::{Seq2SeqFamily, Seq2SeqSummarizer};
use portrayal::generate::traits::{GenerationOptions, Summarizer};
use portrayal::portraits::params::RunParams;
use portrayal::portraits::SwapDirection;
use portrayal::sentiment::Metric;
use portrayal::themes::prompts::TopicType;

/// Portrayal: gender-bias study pipeline for care-assessment portraits.
///
/// Swaps gendered language in portrait documents, summarizes both versions
/// with several model backends, cleans the generated text, and compares
/// how the male- and female-coded texts are treated lexically, in
/// sentiment, and thematically.
#[derive(Parser)]
#[command(name = "portrayal", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the ONNX classifier models used by the sentiment stage
    DownloadModel,

    /// Swap the gendered language in the source portraits
    Swap {
        /// Directory containing {gender}_portraits.json
        #[arg(long, default_value = "./raw_data")]
        in_dir: PathBuf,

        #[arg(long, default_value = "./gender_swapped_portraits")]
        out_dir: PathBuf,

        /// Gender of the source portraits ("female" or "male")
        #[arg(long)]
        original_gender: String,

        /// Directory with the causal LM export (model.onnx + tokenizer.json)
        #[arg(long)]
        model_dir: PathBuf,

        /// Prompt wrapping for the model family (plain, llama3, gemma)
        #[arg(long, default_value = "llama3")]
        prompt_style: String,
    },

    /// Drop documents flagged as incomparable before summarization
    RemoveDocs {
        #[arg(long, default_value = "./gender_swapped_portraits/clean")]
        portraits_dir: PathBuf,

        /// JSON file listing DocumentIDs to drop per direction
        #[arg(long)]
        exclusions: PathBuf,
    },

    /// Generate summaries with a local model backend
    Summarize {
        /// Backend kind: causal or seq2seq
        #[arg(long, default_value = "causal")]
        backend: String,

        /// Model label used in output file names (e.g. llama3, bart)
        #[arg(long)]
        model_name: String,

        /// Swap direction of the input portraits ("fm" or "mf")
        #[arg(long)]
        gender: String,

        #[arg(long)]
        temperature: f64,

        #[arg(long)]
        top_p: f64,

        /// Cap on new tokens; omit to track the input length
        #[arg(long)]
        output_token_limit: Option<u32>,

        #[arg(long, default_value = "./gender_swapped_portraits/clean")]
        portraits_in_dir: PathBuf,

        #[arg(long, default_value = "./summaries/raw")]
        out_dir: PathBuf,

        /// Directory with the model export
        #[arg(long)]
        model_dir: PathBuf,

        /// Prompt wrapping for causal backends (plain, llama3, gemma)
        #[arg(long, default_value = "llama3")]
        prompt_style: String,

        /// Special-token convention for seq2seq backends (bart, t5)
        #[arg(long, default_value = "bart")]
        family: String,
    },

    /// Hosted batch summarization workflow
    Batch {
        #[command(subcommand)]
        command: BatchCommands,
    },

    /// Clean generated summaries (and swapped portraits) for evaluation
    Clean {
        #[arg(long, default_value = "./summaries/raw")]
        in_dir: PathBuf,

        #[arg(long, default_value = "./summaries/clean")]
        out_dir: PathBuf,
    },

    /// Bag-of-words comparison between the gender pair
    Words {
        /// Count words in the original portraits (writes the exclusion list)
        #[arg(long)]
        originals: bool,

        /// Count words in the cleaned summaries
        #[arg(long)]
        summaries: bool,

        #[arg(long, default_value = "./gender_swapped_portraits/clean")]
        portraits_dir: PathBuf,

        #[arg(long, default_value = "./summaries/clean")]
        summaries_dir: PathBuf,

        #[arg(long, default_value = "./word_counts")]
        out_dir: PathBuf,
    },

    /// Sentence-level sentiment and regard scoring
    Sentiment {
        #[command(subcommand)]
        command: SentimentCommands,
    },

    /// Model-extracted themes and their term lists
    Themes {
        #[command(subcommand)]
        command: ThemesCommands,
    },

    /// Count theme terms in both sides of every document (hallucination check)
    CountTerms {
        #[arg(long, default_value = "./summaries/clean")]
        in_dir: PathBuf,

        #[arg(long, default_value = "./term_counts")]
        out_dir: PathBuf,

        /// Directory with the theme term lists (output of `themes terms`)
        #[arg(long, default_value = "./themes/themes_output")]
        terms_dir: PathBuf,
    },

    /// Show which stage outputs exist under a pipeline root
    Status {
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Delete generated outputs so the pipeline can re-run from scratch
    Reset {
        /// Directories to clear (recursive)
        #[arg(long = "dir", required = true)]
        dirs: Vec<PathBuf>,

        /// File extension to delete
        #[arg(long, default_value = "json")]
        ext: String,
    },
}

#[derive(Subcommand)]
enum BatchCommands {
    /// Build the request JSONL files from the minimal portraits
    Prepare {
        #[arg(long, default_value = "./gender_swapped_portraits/clean/minimal")]
        portraits_dir: PathBuf,

        #[arg(long, default_value = "./batch/requests")]
        requests_dir: PathBuf,
    },

    /// Upload the request files and create batches
    Submit {
        #[arg(long, default_value = "./batch/requests")]
        requests_dir: PathBuf,
    },

    /// Check batch completion; records output ids once all are done
    Check {
        #[arg(long, default_value = "./batch/requests")]
        requests_dir: PathBuf,
    },

    /// Download completed batch output files
    Fetch {
        #[arg(long, default_value = "./batch/requests")]
        requests_dir: PathBuf,

        #[arg(long, default_value = "./batch/responses")]
        responses_dir: PathBuf,
    },

    /// Reassemble downloaded responses into summary files
    Extract {
        #[arg(long, default_value = "./batch/responses")]
        responses_dir: PathBuf,

        #[arg(long, default_value = "./summaries/raw")]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum SentimentCommands {
    /// Score every sentence of every cleaned file
    Score {
        /// Which classifier to run (regard or sentiment)
        #[arg(long)]
        metric: String,

        #[arg(long, default_value = "./summaries/clean")]
        in_dir: PathBuf,

        #[arg(long, default_value = "./sentiment_output")]
        out_dir: PathBuf,
    },

    /// Aggregate sentence scores into per-document means
    Mean {
        #[arg(long, default_value = "./sentiment_output")]
        in_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum ThemesCommands {
    /// Ask a generative model the theme questionnaire for every document
    Extract {
        #[arg(long, default_value = "./gender_swapped_portraits/clean")]
        in_dir: PathBuf,

        /// Per-model output directory (e.g. ./themes/output_gemma)
        #[arg(long)]
        out_dir: PathBuf,

        /// Which text to analyze: original, original_clean or result
        #[arg(long)]
        input_key: String,

        /// Theme: physical_appearance, health or subjective_language
        #[arg(long)]
        topic_type: String,

        /// Directory with the causal LM export
        #[arg(long)]
        model_dir: PathBuf,

        #[arg(long, default_value = "plain")]
        prompt_style: String,
    },

    /// Pool extracted terms across models into lists and counts
    Terms {
        #[arg(long, default_value = "./themes")]
        themes_root: PathBuf,

        /// Models whose parsed output to pool (output_{model}/parsed)
        #[arg(long = "model", default_values_t = vec!["llama3".to_string(), "gemma".to_string()])]
        models: Vec<String>,

        #[arg(long, default_value = "./themes/themes_output")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("portrayal=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::DownloadModel => {
            let config = Config::load()?;
            println!("Downloading ONNX classifier models...");
            println!("  Destination: {}", config.model_dir.display());
            portrayal::models::download::download_models(&config.model_dir).await?;
            println!("\n{}", "Models downloaded successfully.".bold());
            println!("You can now run `portrayal sentiment score`.");
        }

        Commands::Swap {
            in_dir,
            out_dir,
            original_gender,
            model_dir,
            prompt_style,
        } => {
            let direction = SwapDirection::from_original_gender(&original_gender)?;
            println!(
                "Swapping gender:\n\n  in_dir: {}\n  out_dir: {}\n  original gender: {}\n",
                in_dir.display(),
                out_dir.display(),
                original_gender
            );
            let style = PromptStyle::parse(&prompt_style)?;
            let generator = CausalGenerator::load(&model_dir, style)?;
            portrayal::swap::run(&generator, &in_dir, &out_dir, direction).await?;
        }

        Commands::RemoveDocs {
            portraits_dir,
            exclusions,
        } => {
            portrayal::portraits::store::remove_docs(&portraits_dir, &exclusions)?;
        }

        Commands::Summarize {
            backend,
            model_name,
            gender,
            temperature,
            top_p,
            output_token_limit,
            portraits_in_dir,
            out_dir,
            model_dir,
            prompt_style,
            family,
        } => {
            println!(
                "Running model with the following configuration:\n\n  \
                 Model name: {model_name}\n  Gender: {gender}\n  Temperature: {temperature}\n  \
                 Top p: {top_p}\n  Output token limit: {output_token_limit:?}\n"
            );

            let params = RunParams {
                direction: SwapDirection::parse(&gender)?,
                model: model_name,
                max_tokens: output_token_limit,
                temperature,
                top_p,
            };
            let opts = GenerationOptions::sampled(
                temperature,
                top_p,
                output_token_limit.map(|n| n as usize),
            );

            let summarizer: Box<dyn Summarizer> = match backend.as_str() {
                "causal" => {
                    let style = PromptStyle::parse(&prompt_style)?;
                    let generator = CausalGenerator::load(&model_dir, style)?;
                    Box::new(CausalSummarizer::new(generator)?)
                }
                "seq2seq" => {
                    let family = Seq2SeqFamily::parse(&family)?;
                    Box::new(Seq2SeqSummarizer::load(&model_dir, family)?)
                }
                other => anyhow::bail!("Unknown backend '{other}' (expected causal or seq2seq)"),
            };

            portrayal::generate::run(
                summarizer.as_ref(),
                &params,
                &portraits_in_dir,
                &out_dir,
                &opts,
            )
            .await?;
        }

        Commands::Batch { command } => {
            let config = Config::load()?;
            match command {
                BatchCommands::Prepare {
                    portraits_dir,
                    requests_dir,
                } => {
                    portrayal::batch::requests::write_request_files(
                        &portraits_dir,
                        &requests_dir,
                        &config.batch_model,
                    )?;
                }
                BatchCommands::Submit { requests_dir } => {
                    config.require_openai()?;
                    let client = portrayal::batch::client::OpenAiClient::new(
                        &config.openai_base_url,
                        &config.openai_api_key,
                    )?;
                    portrayal::batch::submit(&client, &requests_dir).await?;
                }
                BatchCommands::Check { requests_dir } => {
                    config.require_openai()?;
                    let client = portrayal::batch::client::OpenAiClient::new(
                        &config.openai_base_url,
                        &config.openai_api_key,
                    )?;
                    portrayal::batch::check(&client, &requests_dir).await?;
                }
                BatchCommands::Fetch {
                    requests_dir,
                    responses_dir,
                } => {
                    config.require_openai()?;
                    let client = portrayal::batch::client::OpenAiClient::new(
                        &config.openai_base_url,
                        &config.openai_api_key,
                    )?;
                    portrayal::batch::fetch(&client, &requests_dir, &responses_dir).await?;
                }
                BatchCommands::Extract {
                    responses_dir,
                    out_dir,
                } => {
                    portrayal::batch::extract::extract_responses(&responses_dir, &out_dir)?;
                }
            }
        }

        Commands::Clean { in_dir, out_dir } => {
            println!(
                "Cleaning text:\n\n  in_dir: {}\n  out_dir: {}\n",
                in_dir.display(),
                out_dir.display()
            );
            portrayal::clean::run(&in_dir, &out_dir)?;
        }

        Commands::Words {
            originals,
            summaries,
            portraits_dir,
            summaries_dir,
            out_dir,
        } => {
            if originals {
                println!("Counting words in original texts...");
                portrayal::lexical::words::run_originals(&portraits_dir, &out_dir)?;
            } else if summaries {
                println!("Counting words in summaries...");
                portrayal::lexical::words::run_summaries(&summaries_dir, &out_dir)?;
            } else {
                anyhow::bail!("Please specify `portrayal words --originals` or `--summaries`.");
            }
            println!("Done.");
        }

        Commands::Sentiment { command } => match command {
            SentimentCommands::Score {
                metric,
                in_dir,
                out_dir,
            } => {
                let config = Config::load()?;
                config.require_classifiers()?;
                let metric = Metric::parse(&metric)?;
                println!(
                    "Evaluating {}:\n\n  in_dir: {}\n  out_dir: {}\n",
                    metric.name(),
                    in_dir.display(),
                    out_dir.display()
                );
                portrayal::sentiment::stage::run(metric, &in_dir, &out_dir, &config.model_dir)
                    .await?;
            }
            SentimentCommands::Mean { in_dir } => {
                portrayal::sentiment::aggregate::run(&in_dir, &["regard", "sentiment"])?;
            }
        },

        Commands::Themes { command } => match command {
            ThemesCommands::Extract {
                in_dir,
                out_dir,
                input_key,
                topic_type,
                model_dir,
                prompt_style,
            } => {
                println!(
                    "Extracting topics:\n\n  input_key: {input_key}\n  topic_type: {topic_type}\n  \
                     in_dir: {}\n  out_dir: {}\n",
                    in_dir.display(),
                    out_dir.display()
                );
                let topic = TopicType::parse(&topic_type)?;
                let style = PromptStyle::parse(&prompt_style)?;
                let generator = CausalGenerator::load(&model_dir, style)?;
                portrayal::themes::extract(&generator, &in_dir, &out_dir, &input_key, topic)
                    .await?;
            }
            ThemesCommands::Terms {
                themes_root,
                models,
                out_dir,
            } => {
                portrayal::themes::terms::run(&themes_root, &models, &out_dir)?;
            }
        },

        Commands::CountTerms {
            in_dir,
            out_dir,
            terms_dir,
        } => {
            println!(
                "Counting terms:\n\n  in_dir: {}\n  out_dir: {}\n",
                in_dir.display(),
                out_dir.display()
            );
            portrayal::lexical::terms::run(&in_dir, &out_dir, &terms_dir)?;
        }

        Commands::Status { root } => {
            portrayal::status::show(&root)?;
        }

        Commands::Reset { dirs, ext } => {
            let mut total = 0;
            for dir in &dirs {
                total += portrayal::portraits::store::delete_generated(dir, &ext)?;
            }
            info!(deleted = total, "Reset complete");
            println!("{}", format!("Deleted {total} file(s).").bold());
        }
    }

    Ok(())
}
