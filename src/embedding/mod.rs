//! Embedding module - compute embeddings from text

mod ollama;
mod openai;
mod simulated;

use tracing::info;

/// Embedding mode configuration
#[derive(Debug, Clone)]
pub enum EmbeddingMode {
    Ollama {
        host: Option<String>,
    },
    OpenAI {
        api_key: Option<String>,
        base_url: Option<String>,
    },
    /// Deterministic offline vectors, for tests and air-gapped use.
    Simulated {
        dimensions: usize,
    },
}

/// Unified embedding provider
pub struct EmbeddingProvider {
    model_name: String,
    dimensions: usize,
    inner: EmbeddingProviderInner,
}

enum EmbeddingProviderInner {
    Ollama(ollama::OllamaEmbedding),
    OpenAI(openai::OpenAIEmbedding),
    Simulated(simulated::SimulatedEmbedding),
}

impl EmbeddingProvider {
    /// Create a new embedding provider
    pub fn new(model_name: String, mode: EmbeddingMode) -> anyhow::Result<Self> {
        let (inner, dimensions) = match mode {
            EmbeddingMode::Ollama { host } => {
                let provider = ollama::OllamaEmbedding::new(model_name.clone(), host)?;
                let dims = provider.dimensions();
                (EmbeddingProviderInner::Ollama(provider), dims)
            }
            EmbeddingMode::OpenAI { api_key, base_url } => {
                let provider = openai::OpenAIEmbedding::new(model_name.clone(), api_key, base_url)?;
                let dims = provider.dimensions();
                (EmbeddingProviderInner::OpenAI(provider), dims)
            }
            EmbeddingMode::Simulated { dimensions } => {
                let provider = simulated::SimulatedEmbedding::new(dimensions)?;
                let dims = provider.dimensions();
                (EmbeddingProviderInner::Simulated(provider), dims)
            }
        };

        info!(
            "Initialized embedding provider: {} ({} dims)",
            model_name, dimensions
        );

        Ok(Self {
            model_name,
            dimensions,
            inner,
        })
    }

    /// Get embedding dimensions
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Get model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Compute embeddings for texts
    pub async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        match &self.inner {
            EmbeddingProviderInner::Ollama(p) => p.embed(texts).await,
            EmbeddingProviderInner::OpenAI(p) => p.embed(texts).await,
            EmbeddingProviderInner::Simulated(p) => Ok(p.embed(texts)),
        }
    }
}
