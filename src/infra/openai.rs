use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::ai_backend::checked_body;
use crate::config::AiSettings;
use crate::constants::{OPENAI_IMAGE_SIZE, VISION_MAX_TOKENS};
use crate::error::{PipelineError, Result};

/// Chat-completions, vision and image-generation calls against an
/// OpenAI-compatible endpoint. One HTTP request per call; retrying is the
/// caller's business.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    vision_model: String,
    image_model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

fn json_object_format() -> Value {
    json!({ "type": "json_object" })
}

impl OpenAiClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, settings: &AiSettings) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: settings.openai_base_url.trim_end_matches('/').to_string(),
            model: settings.openai_model.clone(),
            vision_model: settings.openai_vision_model.clone(),
            image_model: settings.openai_image_model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }

    pub async fn complete_text(&self, prompt: &str, json_mode: bool) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: Value::String(prompt.to_string()),
            }],
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
            response_format: json_mode.then(json_object_format),
        };
        self.chat(&request).await
    }

    pub async fn complete_vision(&self, prompt: &str, image_png: &[u8]) -> Result<String> {
        let data_url = format!("data:image/png;base64,{}", BASE64.encode(image_png));
        let request = ChatRequest {
            model: &self.vision_model,
            messages: vec![ChatMessage {
                role: "user",
                content: json!([
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": data_url, "detail": "low" } }
                ]),
            }],
            max_tokens: VISION_MAX_TOKENS,
            temperature: None,
            response_format: Some(json_object_format()),
        };
        self.chat(&request).await
    }

    /// Generate a portrait image; the result is a `data:` URL.
    pub async fn generate_image(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.image_model,
            "prompt": prompt,
            "n": 1,
            "size": OPENAI_IMAGE_SIZE,
            "quality": "standard",
            "response_format": "b64_json",
        });

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let body = checked_body(response).await?;

        let parsed: ImageResponse = serde_json::from_str(&body)?;
        let datum = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Parsing("No image in response".to_string()))?;

        match (datum.b64_json, datum.url) {
            (Some(b64), _) => Ok(format!("data:image/png;base64,{}", b64)),
            (None, Some(url)) => Ok(url),
            (None, None) => Err(PipelineError::Parsing("No image data in response".to_string())),
        }
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> Result<String> {
        debug!(model = request.model, "Sending chat completion request");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        let body = checked_body(response).await?;

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| PipelineError::Parsing("No content in response".to_string()))
    }
}
