//! Optional enrichment of product records by an external text-generation service.
//!
//! The Collector only sees the [`Enricher`] trait; [`OllamaEnricher`] talks to
//! an Ollama-compatible HTTP endpoint.

use crate::config::EnrichmentConfig;
use crate::error::EnrichmentError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A bounded-time text generator
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Name of the model producing the text, recorded alongside it
    fn model(&self) -> &str;

    /// Upper bound the caller enforces on a single `generate` call
    fn timeout(&self) -> Duration;

    /// Generate text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String, EnrichmentError>;
}

/// Run `generate` under the enricher's timeout
pub async fn generate_bounded<E: Enricher + ?Sized>(
    enricher: &E,
    prompt: &str,
) -> Result<String, EnrichmentError> {
    let limit = enricher.timeout();
    match tokio::time::timeout(limit, enricher.generate(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(EnrichmentError::Timeout(limit)),
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

/// Enricher backed by an Ollama `/api/generate` endpoint
pub struct OllamaEnricher {
    config: EnrichmentConfig,
    client: Client,
}

impl OllamaEnricher {
    pub fn new(config: EnrichmentConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    /// List models installed on the service
    pub async fn list_models(&self) -> Result<Vec<String>, EnrichmentError> {
        let resp = self.client.get(self.endpoint("/api/tags")).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(EnrichmentError::Status { status, body });
        }

        let tags: TagsResponse = resp.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl Enricher for OllamaEnricher {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    async fn generate(&self, prompt: &str) -> Result<String, EnrichmentError> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
            },
        };

        let resp = self
            .client
            .post(self.endpoint("/api/generate"))
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(EnrichmentError::Status { status, body });
        }

        let generated: GenerateResponse = resp.json().await?;
        let text = generated.response.trim();
        if text.is_empty() {
            return Err(EnrichmentError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}
