//! Category command - LLM-graded passage retrieval

use std::path::PathBuf;

use clap::Args;

use crate::config::Config;
use crate::index::{HybridIndex, IndexOptions};
use crate::llm::{AnthropicClient, DEFAULT_MODEL};
use crate::rerank::{Reranker, CANDIDATE_POOL};

use super::EmbeddingArgs;

#[derive(Args)]
pub struct CategoryArgs {
    /// Category to find passages for
    pub category: String,

    /// Anthropic model used for grading
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Minimum relevance grade (0-10) a passage must reach
    #[arg(long, default_value = "5")]
    pub threshold: u8,

    /// Anthropic API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Index directory
    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    #[command(flatten)]
    pub embedding: EmbeddingArgs,
}

pub async fn run(args: CategoryArgs) -> anyhow::Result<()> {
    let config = Config::load();
    let index_dir = super::resolve_index_dir(args.index_dir, &config);

    let index = HybridIndex::load(&index_dir, IndexOptions::default())?;
    if index.is_empty() {
        anyhow::bail!(
            "No index at {}. Run `docfuse index` first.",
            index_dir.display()
        );
    }

    let embedder = args.embedding.provider(&config)?;
    let candidates = index
        .search(&args.category, CANDIDATE_POOL, &embedder)
        .await?;

    if candidates.is_empty() {
        println!("No candidates found for '{}'", args.category);
        return Ok(());
    }

    println!(
        "Found {} candidates, grading with {}...",
        candidates.len(),
        args.model
    );

    let client = AnthropicClient::new(args.model, args.api_key, None)?;
    let relevant = Reranker::new(client)
        .with_threshold(args.threshold)
        .rerank(&args.category, candidates)
        .await?;

    if relevant.is_empty() {
        println!("No passages graded relevant for '{}'", args.category);
        return Ok(());
    }

    println!("\nRelevant passages for '{}':\n", args.category);
    for scored in &relevant {
        println!(
            "[{}/10] {} (chunk {})",
            scored.relevance, scored.hit.filename, scored.hit.chunk_idx
        );
        if !scored.rationale.is_empty() {
            println!("   {}", scored.rationale);
        }
        let display: String = scored.hit.text.chars().take(300).collect();
        println!("   {}\n", display);
    }

    Ok(())
}
