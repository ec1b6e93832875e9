//! docfuse - hybrid lexical + semantic document search
//!
//! A single-binary CLI for chunking documents, building a hybrid BM25 +
//! embedding index, and searching it.

mod chunker;
mod cli;
mod config;
mod embedding;
mod http;
mod index;
mod llm;
mod loader;
mod rerank;
mod strategy;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "docfuse=debug,info"
    } else if cli.quiet {
        "docfuse=warn,error"
    } else {
        "docfuse=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    cli.run().await
}
