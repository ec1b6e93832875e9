//! HTTP utilities for API providers

use std::time::Duration;

use reqwest::{Client, Response};

/// Create a reqwest client with connection pooling and sensible defaults.
pub fn create_client() -> Client {
    Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to create HTTP client")
}

/// Check response status, pulling the error message out of common API
/// error body shapes when the call failed.
pub async fn check_response(response: Response, service_name: &str) -> anyhow::Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let error_detail = if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
        json.get("error")
            .and_then(|e| e.get("message").and_then(|m| m.as_str()))
            .or_else(|| json.get("message").and_then(|m| m.as_str()))
            .or_else(|| json.get("detail").and_then(|d| d.as_str()))
            .map(|s| s.to_string())
            .unwrap_or(body)
    } else {
        body
    };

    anyhow::bail!("{} API error {}: {}", service_name, status, error_detail)
}
