use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::ai_backend::checked_body;
use crate::config::AiSettings;
use crate::constants::{ANTHROPIC_VERSION, VISION_MAX_TOKENS};
use crate::error::{PipelineError, Result};

/// Messages API client. Anthropic has no JSON response mode, so prompts carry
/// the JSON instructions themselves.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: Value,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

impl AnthropicClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, settings: &AiSettings) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: settings.anthropic_base_url.trim_end_matches('/').to_string(),
            model: settings.anthropic_model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }

    pub async fn complete_text(&self, prompt: &str) -> Result<String> {
        self.send(self.max_tokens, Value::String(prompt.to_string()))
            .await
    }

    pub async fn complete_vision(&self, prompt: &str, image_png: &[u8]) -> Result<String> {
        let content = json!([
            {
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": "image/png",
                    "data": BASE64.encode(image_png),
                }
            },
            { "type": "text", "text": prompt }
        ]);
        self.send(VISION_MAX_TOKENS, content).await
    }

    async fn send(&self, max_tokens: u32, content: Value) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            temperature: self.temperature,
            messages: vec![Message { role: "user", content }],
        };

        debug!(model = %self.model, "Sending messages request");
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;
        let body = checked_body(response).await?;

        let parsed: MessagesResponse = serde_json::from_str(&body)?;
        parsed
            .content
            .into_iter()
            .find_map(|block| (block.block_type == "text").then_some(block.text).flatten())
            .ok_or_else(|| PipelineError::Parsing("No text content in response".to_string()))
    }
}
