// OpenAI-compatible chat completions client.
//
// Works against any endpoint that speaks the `/chat/completions` shape
// (OpenAI itself by default, OpenRouter via `OPENAI_BASE_URL`).

use crate::core::ai::{AiConfig, AiMessage, AiProvider, AiProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Timeout for one completion request.
pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(COMPLETION_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Pulls the reply text out of a completion response body.
fn extract_content(body: &serde_json::Value) -> Result<String, AiProviderError> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| AiProviderError::InvalidResponse("missing choices[0].message.content".to_string()))
}

fn map_request_error(err: reqwest::Error) -> AiProviderError {
    if err.is_timeout() {
        AiProviderError::Timeout
    } else {
        AiProviderError::Network(err.to_string())
    }
}

#[async_trait]
impl AiProvider for OpenAiClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<String, AiProviderError> {
        let mut payload = json!({
            "model": config.model,
            "messages": messages,
            "temperature": config.temperature,
        });
        if let Some(max_tokens) = config.max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiProviderError::Http { status, body });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AiProviderError::Timeout
            } else {
                AiProviderError::InvalidResponse(e.to_string())
            }
        })?;

        extract_content(&body)
    }
}
