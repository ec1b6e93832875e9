//! Search command - query the index

use std::path::PathBuf;

use clap::Args;
use tracing::warn;

use crate::config::Config;
use crate::index::{HybridIndex, IndexOptions, SearchHit};
use crate::strategy::StrategyRegistry;

use super::EmbeddingArgs;

#[derive(Args)]
pub struct SearchArgs {
    /// Search query
    pub query: Option<String>,

    /// Number of results to return
    #[arg(long, default_value = "5")]
    pub top_k: usize,

    /// Search strategy
    #[arg(long, default_value = "hybrid")]
    pub strategy: String,

    /// List available strategies and exit
    #[arg(long)]
    pub list_strategies: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Document directory
    #[arg(long)]
    pub docs: Option<PathBuf>,

    /// Index directory
    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    #[command(flatten)]
    pub embedding: EmbeddingArgs,
}

pub async fn run(args: SearchArgs) -> anyhow::Result<()> {
    let registry = StrategyRegistry::with_builtins();

    if args.list_strategies {
        for (name, description) in registry.list() {
            println!("{:20} {}", name, description);
        }
        return Ok(());
    }

    let query = args
        .query
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("A search query is required"))?;

    let config = Config::load();
    let docs_dir = super::resolve_docs_dir(args.docs, &config);
    let index_dir = super::resolve_index_dir(args.index_dir, &config);

    let index = HybridIndex::load(&index_dir, IndexOptions::default())?;
    if index.is_empty() {
        anyhow::bail!(
            "No index at {}. Run `docfuse index` first.",
            index_dir.display()
        );
    }

    if docs_dir.is_dir() {
        if let Ok((true, diff)) = index.needs_reindex(&docs_dir) {
            warn!(
                "Index is stale ({} files differ), results may be outdated. Run `docfuse index`.",
                diff.total()
            );
        }
    }

    let embedder = args.embedding.provider(&config)?;
    let strategy = registry.get(&args.strategy)?;
    let hits = strategy.run(query, &index, &embedder, args.top_k).await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No results for '{}'", query);
        return Ok(());
    }

    println!("\nResults for '{}' (top {}):\n", query, hits.len());
    for (i, hit) in hits.iter().enumerate() {
        print_hit(i, hit);
    }

    Ok(())
}

fn print_hit(i: usize, hit: &SearchHit) {
    println!("{}. Score: {:.4}", i + 1, hit.score);
    println!("   Source: {} (chunk {})", hit.filename, hit.chunk_idx);
    if let Some(heading) = &hit.heading {
        println!("   Heading: {}", heading);
    }
    if !hit.section_path.is_empty() {
        println!("   Section: {}", hit.section_path.join(" > "));
    }

    let display: String = hit.text.chars().take(200).collect();
    if display.len() < hit.text.len() {
        println!("   {}...", display);
    } else {
        println!("   {}", display);
    }
    println!();
}
