// warden CLI: manual smoke testing for the detection cascade. Ambient
// tooling around the library, not a served frontend.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use warden::cache::memory::InMemoryResultCache;
#[cfg(feature = "sqlite")]
use warden::cache::sqlite::SqliteResultCache;
use warden::cache::ResultCache;
use warden::config::{DetectorConfig, DetectorConfigOverrides};
use warden::layers::judge::{HttpGenerativeProvider, JudgeAdjudicator};
use warden::layers::pattern::PatternScanner;
use warden::layers::similarity::{AttackCorpus, HttpEmbeddingProvider, SimilarityEngine};
use warden::{DetectOptions, Detector, Layer};

/// warden: real-time prompt-injection detection cascade.
#[derive(Parser)]
#[command(name = "warden", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single piece of text
    Detect {
        /// Text to classify
        text: String,

        /// Restrict to specific layers, e.g. --layers 1,2
        #[arg(long, value_delimiter = ',')]
        layers: Option<Vec<u8>>,

        /// Directory containing embeddings.json and metadata.json
        #[arg(long)]
        corpus_dir: Option<PathBuf>,

        /// Disable the result cache for this call
        #[arg(long)]
        no_cache: bool,
    },

    /// Show the resolved configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warden=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ShowConfig => {
            let config = DetectorConfig::load(DetectorConfigOverrides::default())?;
            println!("{config:#?}");
        }

        Commands::Detect {
            text,
            layers,
            corpus_dir,
            no_cache,
        } => {
            let config = DetectorConfig::load(DetectorConfigOverrides::default())?;
            let detector = build_detector(&config, corpus_dir.as_deref(), no_cache)?;

            let opts = match layers {
                Some(raw) => {
                    let parsed: Result<Vec<Layer>, _> =
                        raw.into_iter().map(Layer::try_from).collect();
                    DetectOptions::with_layers(parsed.map_err(anyhow::Error::from)?)
                }
                None => DetectOptions::default(),
            };

            info!(chars = text.chars().count(), "running detection cascade");
            let result = detector.detect(&text, opts).await?;

            if result.is_injection {
                println!("{}", "INJECTION DETECTED".red().bold());
            } else {
                println!("{}", "benign".green());
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn build_detector(
    config: &DetectorConfig,
    corpus_dir: Option<&std::path::Path>,
    no_cache: bool,
) -> Result<Detector> {
    let pattern = PatternScanner::new();

    let corpus = corpus_dir
        .map(AttackCorpus::load)
        .transpose()
        .unwrap_or(None);
    let embedding_provider: Box<dyn warden::layers::similarity::EmbeddingProvider> =
        Box::new(HttpEmbeddingProvider::new(
            config.openai_api_key.clone().unwrap_or_default(),
            config.embedding_model.clone(),
        ));
    let similarity = SimilarityEngine::new(
        corpus,
        embedding_provider,
        config.embedding_threshold,
        config.embedding_timeout,
    );

    let generative_provider: Box<dyn warden::layers::judge::GenerativeProvider> =
        Box::new(HttpGenerativeProvider::new(
            config.anthropic_api_key.clone().unwrap_or_default(),
            config.judge_model.clone(),
        ));
    let judge = JudgeAdjudicator::new(
        generative_provider,
        config.layer3_confidence_threshold,
        config.layer3_timeout,
    );

    let cache: Option<Box<dyn ResultCache>> = if no_cache {
        None
    } else {
        build_cache(config)
    };

    Ok(Detector::new(pattern, similarity, judge, cache, config.clone()))
}

fn build_cache(config: &DetectorConfig) -> Option<Box<dyn ResultCache>> {
    #[cfg(feature = "sqlite")]
    if let Some(path) = config.cache_db_path.as_deref() {
        return match SqliteResultCache::open(path) {
            Ok(cache) => Some(Box::new(cache)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to open cache database, falling back to in-memory");
                Some(Box::new(InMemoryResultCache::new()))
            }
        };
    }

    Some(Box::new(InMemoryResultCache::new()))
}

