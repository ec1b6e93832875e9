//! Status command - index contents and staleness

use std::path::PathBuf;

use clap::Args;

use crate::config::Config;
use crate::index::{HybridIndex, IndexOptions};

#[derive(Args)]
pub struct StatusArgs {
    /// Document directory
    #[arg(long)]
    pub docs: Option<PathBuf>,

    /// Index directory
    #[arg(long)]
    pub index_dir: Option<PathBuf>,
}

pub async fn run(args: StatusArgs) -> anyhow::Result<()> {
    let config = Config::load();
    let docs_dir = super::resolve_docs_dir(args.docs, &config);
    let index_dir = super::resolve_index_dir(args.index_dir, &config);

    let index = HybridIndex::load(&index_dir, IndexOptions::default())?;

    if index.manifest().is_empty() {
        println!("No index at {}. Run `docfuse index` to build one.", index_dir.display());
        return Ok(());
    }

    println!(
        "Index at {}: {} chunks from {} documents\n",
        index_dir.display(),
        index.len(),
        index.manifest().len()
    );

    for (filename, entry) in index.manifest() {
        println!(
            "  {:40} {:4} chunks  {}",
            filename,
            entry.chunk_end - entry.chunk_start,
            &entry.hash[..12.min(entry.hash.len())]
        );
    }

    if !docs_dir.is_dir() {
        println!("\nDocs directory {} not found, staleness unknown", docs_dir.display());
        return Ok(());
    }

    let (stale, diff) = index.needs_reindex(&docs_dir)?;
    if !stale {
        println!("\nIndex is up to date");
        return Ok(());
    }

    println!("\nIndex is stale, run `docfuse index` to update:");
    for name in &diff.added {
        println!("  added:   {}", name);
    }
    for name in &diff.changed {
        println!("  changed: {}", name);
    }
    for name in &diff.removed {
        println!("  removed: {}", name);
    }

    Ok(())
}
