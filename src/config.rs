//! Configuration file support
//!
//! Config file location: ~/.config/docfuse/config.toml
//!
//! Example config:
//! ```toml
//! [embedding]
//! provider = "ollama"  # ollama, openai, simulated
//! model = "nomic-embed-text"
//! host = "http://localhost:11434"  # for ollama
//! # base_url = "http://localhost:1234"  # for openai-compatible servers
//! # api_key = "sk-..."  # for openai
//!
//! [build]
//! chunk_size = 400
//! chunk_overlap = 50
//! structured = false
//!
//! [paths]
//! docs_dir = "docs"
//! index_dir = ".docfuse"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider type: ollama, openai, simulated
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Host for Ollama (e.g., http://localhost:11434)
    pub host: Option<String>,

    /// Base URL for OpenAI-compatible APIs
    pub base_url: Option<String>,

    /// API key for OpenAI
    pub api_key: Option<String>,

    /// Vector width for the simulated provider
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            host: None,
            base_url: None,
            api_key: None,
            dimensions: None,
        }
    }
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    "nomic-embed-text".to_string()
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Chunk size in words
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Chunk overlap in words
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Structure-aware chunking (heading metadata on chunks)
    #[serde(default)]
    pub structured: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            structured: false,
        }
    }
}

fn default_chunk_size() -> usize {
    400
}

fn default_chunk_overlap() -> usize {
    50
}

/// Default locations for the docs directory and the index directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            index_dir: default_index_dir(),
        }
    }
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}

fn default_index_dir() -> PathBuf {
    PathBuf::from(".docfuse")
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docfuse")
            .join("config.toml")
    }

    /// Load config from file, returning defaults if not found
    pub fn load() -> Self {
        let path = Self::config_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config file: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Create example config file if it doesn't exist
    pub fn create_example_if_missing() -> anyhow::Result<bool> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(false);
        }

        let example = r#"# docfuse configuration
# Location: ~/.config/docfuse/config.toml

[embedding]
# Provider: ollama, openai, simulated
provider = "ollama"

# Model name (provider-specific)
# Ollama: nomic-embed-text, mxbai-embed-large
# OpenAI: text-embedding-3-small, text-embedding-3-large
model = "nomic-embed-text"

# Ollama host (default: http://localhost:11434)
# host = "http://localhost:11434"

# OpenAI-compatible base URL
# base_url = "http://localhost:1234"

# API key (or set OPENAI_API_KEY)
# api_key = "sk-..."

# Vector width for the simulated provider (default: 256)
# dimensions = 256

[build]
# Chunk size in words (default: 400)
chunk_size = 400

# Chunk overlap in words (default: 50)
chunk_overlap = 50

# Structure-aware chunking: tag chunks with their markdown heading
# structured = false

[paths]
# Directory of source documents
docs_dir = "docs"

# Directory holding index artifacts
index_dir = ".docfuse"
"#;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, example)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.embedding.provider, "ollama");
        assert_eq!(config.embedding.model, "nomic-embed-text");
        assert_eq!(config.build.chunk_size, 400);
        assert_eq!(config.build.chunk_overlap, 50);
        assert!(!config.build.structured);
        assert_eq!(config.paths.index_dir, PathBuf::from(".docfuse"));
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[embedding]
provider = "openai"
model = "text-embedding-3-small"
base_url = "http://localhost:1234"

[build]
chunk_size = 200
structured = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.embedding.provider, "openai");
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.build.chunk_size, 200);
        assert_eq!(config.build.chunk_overlap, 50);
        assert!(config.build.structured);
        assert_eq!(config.paths.docs_dir, PathBuf::from("docs"));
    }
}
