use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

use super::anthropic::AnthropicClient;
use super::openai::OpenAiClient;
use crate::app::ports::AiGatewayPort;
use crate::config::{AiSettings, ProviderKind};
use crate::constants::HTTP_TIMEOUT_SECS;
use crate::error::{PipelineError, Result};
use crate::retry::{self, RetryConfig};

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Body of a successful response, or the classified failure for any other
/// status. Both providers wrap errors as `{"error": {"message": ...}}`.
pub(crate) async fn checked_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());
    let body = response.text().await?;

    if status.is_success() {
        return Ok(body);
    }

    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    Err(PipelineError::from_status(status.as_u16(), &message, retry_after))
}

pub enum AiBackend {
    OpenAi(OpenAiClient),
    Anthropic(AnthropicClient),
}

impl AiBackend {
    fn name(&self) -> &'static str {
        match self {
            AiBackend::OpenAi(_) => "openai",
            AiBackend::Anthropic(_) => "anthropic",
        }
    }
}

/// Retry policy per call type.
#[derive(Debug, Clone)]
pub struct RetryBudgets {
    pub text: RetryConfig,
    pub vision: RetryConfig,
    pub image: RetryConfig,
}

impl Default for RetryBudgets {
    fn default() -> Self {
        Self {
            text: RetryConfig::with_context("ai_text").max_retries(3),
            vision: RetryConfig::with_context("ai_vision")
                .max_retries(2)
                .initial_delay(Duration::from_millis(1000)),
            image: RetryConfig::with_context("ai_image")
                .max_retries(2)
                .initial_delay(Duration::from_millis(2000)),
        }
    }
}

impl RetryBudgets {
    /// Same policy everywhere; handy for tests.
    pub fn uniform(config: RetryConfig) -> Self {
        Self {
            text: config.clone(),
            vision: config.clone(),
            image: config,
        }
    }
}

/// The configured AI backend behind the retry executor.
pub struct AiClient {
    backend: AiBackend,
    budgets: RetryBudgets,
}

impl AiClient {
    pub fn new(backend: AiBackend) -> Self {
        Self {
            backend,
            budgets: RetryBudgets::default(),
        }
    }

    pub fn with_budgets(mut self, budgets: RetryBudgets) -> Self {
        self.budgets = budgets;
        self
    }

    /// Build the client for the configured provider. `None` when no credential
    /// is configured, in which case callers use the offline generators.
    pub fn from_config(settings: &AiSettings) -> Result<Option<Self>> {
        let kind = settings.provider_kind()?;
        let Some(api_key) = settings.api_key() else {
            info!(provider = %settings.provider, "No AI credential configured, using offline generators");
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let backend = match kind {
            ProviderKind::OpenAi => AiBackend::OpenAi(OpenAiClient::new(http, api_key, settings)),
            ProviderKind::Anthropic => {
                AiBackend::Anthropic(AnthropicClient::new(http, api_key, settings))
            }
        };
        info!(provider = backend.name(), "AI backend configured");
        Ok(Some(Self::new(backend)))
    }
}

#[async_trait]
impl AiGatewayPort for AiClient {
    #[instrument(skip(self, prompt), fields(backend = self.backend.name(), prompt_len = prompt.len()))]
    async fn complete_text(&self, prompt: &str, json_mode: bool) -> Result<String> {
        let backend = &self.backend;
        retry::execute(&self.budgets.text, || async move {
            match backend {
                AiBackend::OpenAi(client) => client.complete_text(prompt, json_mode).await,
                AiBackend::Anthropic(client) => client.complete_text(prompt).await,
            }
        })
        .await
    }

    #[instrument(skip(self, prompt, image_png), fields(backend = self.backend.name(), image_bytes = image_png.len()))]
    async fn complete_vision(&self, prompt: &str, image_png: &[u8]) -> Result<String> {
        let backend = &self.backend;
        retry::execute(&self.budgets.vision, || async move {
            match backend {
                AiBackend::OpenAi(client) => client.complete_vision(prompt, image_png).await,
                AiBackend::Anthropic(client) => client.complete_vision(prompt, image_png).await,
            }
        })
        .await
    }

    #[instrument(skip(self, prompt), fields(backend = self.backend.name()))]
    async fn generate_image(&self, prompt: &str) -> Result<String> {
        let backend = &self.backend;
        retry::execute(&self.budgets.image, || async move {
            match backend {
                AiBackend::OpenAi(client) => client.generate_image(prompt).await,
                AiBackend::Anthropic(_) => Err(PipelineError::Unsupported("image generation")),
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PROVIDER_ANTHROPIC;

    #[test]
    fn no_credential_means_no_client() {
        let settings = AiSettings::default();
        assert!(AiClient::from_config(&settings).unwrap().is_none());

        let blank = AiSettings {
            openai_api_key: Some("   ".to_string()),
            ..AiSettings::default()
        };
        assert!(AiClient::from_config(&blank).unwrap().is_none());
    }

    #[test]
    fn credential_selects_provider() {
        let settings = AiSettings {
            provider: PROVIDER_ANTHROPIC.to_string(),
            anthropic_api_key: Some("sk-ant-test".to_string()),
            ..AiSettings::default()
        };
        let client = AiClient::from_config(&settings).unwrap().unwrap();
        assert_eq!(client.backend.name(), "anthropic");
    }

    #[test]
    fn unknown_provider_is_a_config_error() {
        let settings = AiSettings {
            provider: "mistral".to_string(),
            openai_api_key: Some("sk-test".to_string()),
            ..AiSettings::default()
        };
        assert!(AiClient::from_config(&settings).is_err());
    }

    #[test]
    fn budgets_match_call_types() {
        let budgets = RetryBudgets::default();
        assert_eq!(budgets.text.max_retries, 3);
        assert_eq!(budgets.vision.max_retries, 2);
        assert_eq!(budgets.image.initial_delay, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn anthropic_has_no_image_generation() {
        let settings = AiSettings {
            provider: PROVIDER_ANTHROPIC.to_string(),
            anthropic_api_key: Some("sk-ant-test".to_string()),
            ..AiSettings::default()
        };
        let client = AiClient::from_config(&settings).unwrap().unwrap();
        let err = client.generate_image("poster").await.unwrap_err();
        assert!(matches!(err, PipelineError::Unsupported(_)));
    }
}
