//! Ollama embedding provider

use std::env;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::http;

/// Ollama embedding provider
pub struct OllamaEmbedding {
    client: Client,
    host: String,
    model_name: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedding {
    pub fn new(model_name: String, host: Option<String>) -> anyhow::Result<Self> {
        let host = host
            .or_else(|| env::var("OLLAMA_HOST").ok())
            .unwrap_or_else(|| "http://localhost:11434".to_string());

        // Default dimensions for common embedding models
        let dimensions = match model_name.split(':').next().unwrap_or(&model_name) {
            "nomic-embed-text" => 768,
            "mxbai-embed-large" => 1024,
            "all-minilm" => 384,
            "bge-m3" => 1024,
            "snowflake-arctic-embed" => 1024,
            _ => 768,
        };

        info!(
            "Ollama embedding provider: {} @ {} ({} dims)",
            model_name, host, dimensions
        );

        Ok(Self {
            client: http::create_client(),
            host,
            model_name,
            dimensions,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Compute embeddings, batched at 32 inputs per request.
    pub async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let texts_vec: Vec<String> = texts.iter().map(|s| s.to_string()).collect();
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts_vec.chunks(32) {
            let request = EmbedRequest {
                model: self.model_name.clone(),
                input: batch.to_vec(),
            };

            let response = self
                .client
                .post(format!("{}/api/embed", self.host))
                .json(&request)
                .send()
                .await?;
            let response = http::check_response(response, "Ollama").await?;

            let embed_response: EmbedResponse = response.json().await?;
            all_embeddings.extend(embed_response.embeddings);
        }

        Ok(all_embeddings)
    }
}
