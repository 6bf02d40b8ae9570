// GenerativeProvider — swappable backend for Layer 3's single adjudication
// call (SPEC_FULL §4.3). Same reqwest + serde shape as the embedding
// provider and the teacher's PerspectiveScorer.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Default provider: an Anthropic-Messages-API-compatible endpoint.
pub struct HttpGenerativeProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl HttpGenerativeProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url: "https://api.anthropic.com/v1".to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url,
        }
    }
}

#[async_trait]
impl GenerativeProvider for HttpGenerativeProvider {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/messages", self.base_url);

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: 512,
            system: system.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .context("failed to call generative provider")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("generative provider returned {status}: {body}");
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .context("failed to parse generative provider response")?;

        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .context("generative provider returned no text content")
    }
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}
