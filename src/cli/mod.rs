//! CLI module - command definitions and handlers

mod category;
mod config_cmd;
mod index;
mod search;
mod status;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub use category::CategoryArgs;
pub use config_cmd::ConfigArgs;
pub use index::IndexArgs;
pub use search::SearchArgs;
pub use status::StatusArgs;

use crate::config::Config;
use crate::embedding::{EmbeddingMode, EmbeddingProvider};
use crate::index::IndexOptions;

/// docfuse - hybrid lexical + semantic document search
#[derive(Parser)]
#[command(name = "docfuse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build or incrementally update the document index
    Index(IndexArgs),

    /// Show index contents and staleness against the docs directory
    Status(StatusArgs),

    /// Search the index
    Search(SearchArgs),

    /// Find passages relevant to a category, graded by an LLM
    Category(CategoryArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Index(args) => index::run(args, self.quiet).await,
            Commands::Status(args) => status::run(args).await,
            Commands::Search(args) => search::run(args).await,
            Commands::Category(args) => category::run(args).await,
            Commands::Config(args) => config_cmd::run(args).await,
        }
    }
}

/// Embedding provider flags shared by the commands that embed text.
#[derive(Args, Clone)]
pub struct EmbeddingArgs {
    /// Embedding provider
    #[arg(long, value_parser = ["ollama", "openai", "simulated"])]
    pub embedding_provider: Option<String>,

    /// Embedding model name
    #[arg(long)]
    pub embedding_model: Option<String>,

    /// Ollama host for embeddings
    #[arg(long, env = "OLLAMA_HOST")]
    pub embedding_host: Option<String>,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub embedding_api_base: Option<String>,

    /// API key for the embedding service
    #[arg(long, env = "OPENAI_API_KEY")]
    pub embedding_api_key: Option<String>,
}

impl EmbeddingArgs {
    /// Resolve a provider: flags override config, config overrides defaults.
    pub fn provider(&self, config: &Config) -> anyhow::Result<EmbeddingProvider> {
        let provider = self
            .embedding_provider
            .clone()
            .unwrap_or_else(|| config.embedding.provider.clone());
        let model = self
            .embedding_model
            .clone()
            .unwrap_or_else(|| config.embedding.model.clone());

        let mode = match provider.as_str() {
            "ollama" => EmbeddingMode::Ollama {
                host: self
                    .embedding_host
                    .clone()
                    .or_else(|| config.embedding.host.clone()),
            },
            "openai" => EmbeddingMode::OpenAI {
                api_key: self
                    .embedding_api_key
                    .clone()
                    .or_else(|| config.embedding.api_key.clone()),
                base_url: self
                    .embedding_api_base
                    .clone()
                    .or_else(|| config.embedding.base_url.clone()),
            },
            "simulated" => EmbeddingMode::Simulated {
                dimensions: config.embedding.dimensions.unwrap_or(256),
            },
            _ => anyhow::bail!("Unknown embedding provider: {}", provider),
        };

        EmbeddingProvider::new(model, mode)
    }
}

pub(crate) fn resolve_docs_dir(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.unwrap_or_else(|| config.paths.docs_dir.clone())
}

pub(crate) fn resolve_index_dir(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.unwrap_or_else(|| config.paths.index_dir.clone())
}

pub(crate) fn resolve_index_options(
    config: &Config,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    structured: bool,
) -> IndexOptions {
    IndexOptions {
        chunk_size: chunk_size.unwrap_or(config.build.chunk_size),
        chunk_overlap: chunk_overlap.unwrap_or(config.build.chunk_overlap),
        structured: structured || config.build.structured,
    }
}
