use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use moderator::classify::download;
use moderator::classify::inference::{HostedEntityRecognizer, HostedSentimentClassifier, InferenceClient};
use moderator::classify::onnx::{OnnxEntityRecognizer, OnnxSentimentClassifier};
use moderator::classify::traits::{EntityRecognizer, NoopRecognizer, SentimentClassifier};
use moderator::config::{ClassifierBackend, Config};
use moderator::moderator::Moderator;
use moderator::output::{terminal, truncate_chars};
use moderator::policy;

/// Moderator: guideline-driven message moderation.
///
/// Checks short messages against free-text moderation guidelines using
/// sentiment and named-entity signals.
#[derive(Parser)]
#[command(name = "moderator", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Moderate a single message
    Check {
        /// The message to check
        #[arg(long)]
        message: String,

        /// Guidelines file (defaults to MODERATOR_GUIDELINES_FILE or the built-in text)
        #[arg(long)]
        guidelines_file: Option<PathBuf>,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
    },

    /// Moderate every non-empty line of a file
    Batch {
        /// File with one message per line
        #[arg(long)]
        file: PathBuf,

        /// Guidelines file (defaults to MODERATOR_GUIDELINES_FILE or the built-in text)
        #[arg(long)]
        guidelines_file: Option<PathBuf>,

        /// Number of messages to moderate in parallel (default: 4)
        #[arg(long, default_value = "4")]
        concurrency: u32,
    },

    /// Show the policy a guidelines document parses to
    Policy {
        /// Guidelines file (defaults to MODERATOR_GUIDELINES_FILE or the built-in text)
        #[arg(long)]
        guidelines_file: Option<PathBuf>,
    },

    /// Download the ONNX sentiment and entity models
    DownloadModel,

    /// Serve the moderation form and JSON API
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (defaults to PORT or 5050)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (defaults to MODERATOR_BIND or 0.0.0.0)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("moderator=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            message,
            guidelines_file,
            json,
        } => {
            let config = Config::load()?;
            let guidelines = load_guidelines(&config, guidelines_file.as_deref())?;
            config.require_classifier()?;
            let moderator = create_moderator(&config)?;

            let outcome = moderator.moderate_verdict(&message, &guidelines).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                terminal::display_outcome(&outcome);
            }
        }

        Commands::Batch {
            file,
            guidelines_file,
            concurrency,
        } => {
            let config = Config::load()?;
            let guidelines = load_guidelines(&config, guidelines_file.as_deref())?;
            config.require_classifier()?;
            let moderator = create_moderator(&config)?;

            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let messages: Vec<&str> = raw.lines().filter(|l| !l.trim().is_empty()).collect();

            println!("Moderating {} messages...", messages.len());

            let results: Vec<_> = stream::iter(messages.iter().copied())
                .map(|message| {
                    let moderator = &moderator;
                    let guidelines = guidelines.as_str();
                    async move { (message, moderator.moderate_verdict(message, guidelines).await) }
                })
                .buffered(concurrency.max(1) as usize)
                .collect()
                .await;

            let mut blocked = 0;
            let mut failed = 0;
            for (message, result) in &results {
                match result {
                    Ok(outcome) => {
                        if outcome.verdict.is_blocked() {
                            blocked += 1;
                        }
                        terminal::display_outcome(outcome);
                    }
                    Err(e) => {
                        failed += 1;
                        warn!(error = %e, "Moderation failed");
                        println!(
                            "{} {}: {}",
                            "Failed:".yellow(),
                            truncate_chars(message, 60),
                            e
                        );
                    }
                }
            }

            terminal::display_batch_summary(results.len(), blocked, failed);
        }

        Commands::Policy { guidelines_file } => {
            let config = Config::load()?;
            let guidelines = load_guidelines(&config, guidelines_file.as_deref())?;
            terminal::display_policy(&policy::parse(&guidelines));
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading ONNX models...");
            println!("  Destination: {}", model_dir.display());

            download::download_models(model_dir).await?;

            println!("\n{}", "Models downloaded successfully.".bold());
            println!("You can now run `moderator check --message \"...\"` or `moderator serve`.");
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            let guidelines = config.default_guidelines()?;
            config.require_classifier()?;
            let moderator = create_moderator(&config)?;

            let port = port.unwrap_or(config.port);
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            moderator::web::run_server(moderator, guidelines, port, &bind).await?;
        }
    }

    Ok(())
}

/// Guidelines from an explicit file, else the configured default.
fn load_guidelines(config: &Config, path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read guidelines file {}", path.display())),
        None => config.default_guidelines(),
    }
}

/// Build the moderator for the configured backend.
fn create_moderator(config: &Config) -> Result<Moderator> {
    match config.classifier_backend {
        ClassifierBackend::Onnx => {
            info!("Using local ONNX classifiers");
            let sentiment: Arc<dyn SentimentClassifier> = Arc::new(OnnxSentimentClassifier::load(
                &download::sentiment_model_dir(&config.model_dir),
            )?);

            let ner_dir = download::ner_model_dir(&config.model_dir);
            let entities: Arc<dyn EntityRecognizer> = if download::model_files_present(&ner_dir) {
                Arc::new(OnnxEntityRecognizer::load(&ner_dir)?)
            } else {
                warn!(
                    "Entity model not found in {}; personal-name checks will fail",
                    ner_dir.display()
                );
                Arc::new(NoopRecognizer)
            };

            Ok(Moderator::new(sentiment, entities))
        }
        ClassifierBackend::Inference => {
            info!("Using hosted inference classifiers");
            let client = Arc::new(InferenceClient::new(
                &config.inference_url,
                config.hf_api_token.clone(),
                config.inference_rps,
            ));
            let sentiment: Arc<dyn SentimentClassifier> = Arc::new(HostedSentimentClassifier::new(
                Arc::clone(&client),
                config.sentiment_model.clone(),
            ));
            let entities: Arc<dyn EntityRecognizer> =
                Arc::new(HostedEntityRecognizer::new(client, config.ner_model.clone()));

            Ok(Moderator::new(sentiment, entities))
        }
    }
}
