//! OpenAI-compatible embedding provider

use std::env;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::http;

/// OpenAI embedding provider. Also works against any server exposing the
/// `/v1/embeddings` shape via `base_url`.
pub struct OpenAIEmbedding {
    client: Client,
    base_url: String,
    api_key: String,
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
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAIEmbedding {
    pub fn new(
        model_name: String,
        api_key: Option<String>,
        base_url: Option<String>,
    ) -> anyhow::Result<Self> {
        let api_key = api_key
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

        let base_url = base_url
            .or_else(|| env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| "https://api.openai.com".to_string());

        let dimensions = match model_name.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536,
        };

        info!(
            "OpenAI embedding provider: {} ({} dims)",
            model_name, dimensions
        );

        Ok(Self {
            client: http::create_client(),
            base_url,
            api_key,
            model_name,
            dimensions,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Compute embeddings, batched at 100 inputs per request. Results are
    /// reordered by the response `index` field before being returned.
    pub async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let texts_vec: Vec<String> = texts.iter().map(|s| s.to_string()).collect();
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts_vec.chunks(100) {
            let request = EmbedRequest {
                model: self.model_name.clone(),
                input: batch.to_vec(),
            };

            let response = self
                .client
                .post(format!("{}/v1/embeddings", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await?;
            let response = http::check_response(response, "OpenAI").await?;

            let mut embed_response: EmbedResponse = response.json().await?;
            embed_response.data.sort_by_key(|d| d.index);
            all_embeddings.extend(embed_response.data.into_iter().map(|d| d.embedding));
        }

        Ok(all_embeddings)
    }
}
