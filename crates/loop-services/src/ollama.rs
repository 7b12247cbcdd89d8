//! Local Ollama model used as the shape planner.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use loop_core::planner::build_prompt;
use loop_core::{RouteError, ShapePlanner};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

#[derive(Clone)]
pub struct OllamaPlanner {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaPlanner {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    async fn generate(&self, request: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt: build_prompt(request),
            stream: false,
            format: "json",
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to reach planner model")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Planner model returned {}: {}", status, text);
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .context("Failed to decode planner response")?;
        Ok(reply.response)
    }
}

#[async_trait]
impl ShapePlanner for OllamaPlanner {
    async fn suggest(&self, request: &str) -> Result<String, RouteError> {
        tracing::debug!("Asking {} for shape parameters", self.model);
        self.generate(request)
            .await
            .map_err(|err| RouteError::NetworkFailure(format!("{err:#}")))
    }
}
