//! Index command - build or incrementally update the index

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::Config;
use crate::index::HybridIndex;

use super::EmbeddingArgs;

#[derive(Args)]
pub struct IndexArgs {
    /// Document directory
    #[arg(long)]
    pub docs: Option<PathBuf>,

    /// Index directory
    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    /// Discard the existing index and rebuild from scratch
    #[arg(short, long)]
    pub force: bool,

    /// Structure-aware chunking: tag chunks with their markdown heading
    #[arg(long)]
    pub structured: bool,

    /// Chunk size in words
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Chunk overlap in words
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    #[command(flatten)]
    pub embedding: EmbeddingArgs,
}

pub async fn run(args: IndexArgs, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load();
    let docs_dir = super::resolve_docs_dir(args.docs, &config);
    let index_dir = super::resolve_index_dir(args.index_dir, &config);
    let options = super::resolve_index_options(
        &config,
        args.chunk_size,
        args.chunk_overlap,
        args.structured,
    );

    if !docs_dir.is_dir() {
        anyhow::bail!("Docs directory {} does not exist", docs_dir.display());
    }

    let embedder = args.embedding.provider(&config)?;

    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    };

    if args.force {
        spinner.set_message("Rebuilding index from scratch...");
        let mut index = HybridIndex::new(&index_dir, options);
        index.build(&docs_dir, &embedder).await?;
        spinner.finish_and_clear();
        report(&index, quiet);
        return Ok(());
    }

    let mut index = HybridIndex::load(&index_dir, options)?;

    if index.is_empty() && index.manifest().is_empty() {
        spinner.set_message("Building index...");
        index.build(&docs_dir, &embedder).await?;
    } else {
        let (stale, diff) = index.needs_reindex(&docs_dir)?;
        if !stale {
            spinner.finish_and_clear();
            if !quiet {
                println!("Index is up to date ({} chunks)", index.len());
            }
            return Ok(());
        }

        info!(
            "{} added, {} changed, {} removed",
            diff.added.len(),
            diff.changed.len(),
            diff.removed.len()
        );
        spinner.set_message(format!("Updating index ({} files changed)...", diff.total()));
        index.reindex(&docs_dir, &embedder).await?;
    }

    spinner.finish_and_clear();
    report(&index, quiet);
    Ok(())
}

fn report(index: &HybridIndex, quiet: bool) {
    if !quiet {
        println!(
            "Indexed {} chunks from {} documents",
            index.len(),
            index.manifest().len()
        );
    }
}
