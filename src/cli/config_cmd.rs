//! Config command - manage configuration

use clap::{Args, Subcommand};

use crate::config::Config;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Initialize config file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show config file path
    Path,
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let config = Config::load();
            let path = Config::config_path();

            if path.exists() {
                println!("Config file: {}", path.display());
            } else {
                println!("Config file: {} (not found, using defaults)", path.display());
            }
            println!();
            println!("[embedding]");
            println!("provider = \"{}\"", config.embedding.provider);
            println!("model = \"{}\"", config.embedding.model);
            if let Some(host) = &config.embedding.host {
                println!("host = \"{}\"", host);
            }
            if let Some(base_url) = &config.embedding.base_url {
                println!("base_url = \"{}\"", base_url);
            }
            if config.embedding.api_key.is_some() {
                println!("api_key = \"***\"");
            }
            if let Some(dimensions) = config.embedding.dimensions {
                println!("dimensions = {}", dimensions);
            }
            println!();
            println!("[build]");
            println!("chunk_size = {}", config.build.chunk_size);
            println!("chunk_overlap = {}", config.build.chunk_overlap);
            println!("structured = {}", config.build.structured);
            println!();
            println!("[paths]");
            println!("docs_dir = \"{}\"", config.paths.docs_dir.display());
            println!("index_dir = \"{}\"", config.paths.index_dir.display());
        }

        ConfigCommands::Init { force } => {
            let path = Config::config_path();

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            if path.exists() && force {
                std::fs::remove_file(&path)?;
            }

            Config::create_example_if_missing()?;
            println!("Created config file at {}", path.display());
            println!();
            println!("Edit the file to customize your embedding provider and paths.");
            println!();
            println!("Common configurations:");
            println!();
            println!("  # Ollama (local, recommended)");
            println!("  provider = \"ollama\"");
            println!("  model = \"nomic-embed-text\"  # or \"mxbai-embed-large\"");
            println!();
            println!("  # OpenAI");
            println!("  provider = \"openai\"");
            println!("  model = \"text-embedding-3-small\"");
            println!("  # api_key = \"sk-...\"  # or set OPENAI_API_KEY env var");
            println!();
            println!("  # Offline, deterministic (no model needed)");
            println!("  provider = \"simulated\"");
        }

        ConfigCommands::Path => {
            println!("{}", Config::config_path().display());
        }
    }

    Ok(())
}
