use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use crate::constants::{
    ANTHROPIC_BASE_URL, ANTHROPIC_DEFAULT_MODEL, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
    NAVIGATION_TIMEOUT_SECS, OPENAI_BASE_URL, OPENAI_DEFAULT_IMAGE_MODEL, OPENAI_DEFAULT_MODEL,
    OPENAI_DEFAULT_VISION_MODEL, PROVIDER_ANTHROPIC, PROVIDER_OPENAI, VIEWPORT_HEIGHT,
    VIEWPORT_WIDTH,
};
use crate::error::{PipelineError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ai: AiSettings,
    pub browser: BrowserSettings,
    /// Prometheus listener address; metrics are not exported when unset.
    pub metrics_addr: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_vision_model: String,
    pub openai_image_model: String,
    pub openai_base_url: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub anthropic_base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: PROVIDER_OPENAI.to_string(),
            openai_api_key: None,
            openai_model: OPENAI_DEFAULT_MODEL.to_string(),
            openai_vision_model: OPENAI_DEFAULT_VISION_MODEL.to_string(),
            openai_image_model: OPENAI_DEFAULT_IMAGE_MODEL.to_string(),
            openai_base_url: OPENAI_BASE_URL.to_string(),
            anthropic_api_key: None,
            anthropic_model: ANTHROPIC_DEFAULT_MODEL.to_string(),
            anthropic_base_url: ANTHROPIC_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl AiSettings {
    pub fn provider_kind(&self) -> Result<ProviderKind> {
        match self.provider.trim().to_ascii_lowercase().as_str() {
            PROVIDER_OPENAI => Ok(ProviderKind::OpenAi),
            PROVIDER_ANTHROPIC => Ok(ProviderKind::Anthropic),
            other => Err(PipelineError::Config(format!(
                "Unknown AI provider '{}', expected '{}' or '{}'",
                other, PROVIDER_OPENAI, PROVIDER_ANTHROPIC
            ))),
        }
    }

    /// Credential for the selected provider. Empty strings count as absent.
    pub fn api_key(&self) -> Option<&str> {
        let key = match self.provider_kind().ok()? {
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
            ProviderKind::Anthropic => self.anthropic_api_key.as_deref(),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Browser executable; auto-detected when unset.
    pub chrome_path: Option<String>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_path: None,
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            navigation_timeout_secs: NAVIGATION_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory when present, then
    /// apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                PipelineError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_overrides(|name| env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ai = &mut self.ai;
        if let Some(v) = lookup("AI_PROVIDER") {
            ai.provider = v;
        }
        if let Some(v) = lookup("OPENAI_API_KEY") {
            ai.openai_api_key = Some(v);
        }
        if let Some(v) = lookup("OPENAI_MODEL") {
            ai.openai_model = v;
        }
        if let Some(v) = lookup("OPENAI_VISION_MODEL") {
            ai.openai_vision_model = v;
        }
        if let Some(v) = lookup("OPENAI_IMAGE_MODEL") {
            ai.openai_image_model = v;
        }
        if let Some(v) = lookup("OPENAI_BASE_URL") {
            ai.openai_base_url = v;
        }
        if let Some(v) = lookup("ANTHROPIC_API_KEY") {
            ai.anthropic_api_key = Some(v);
        }
        if let Some(v) = lookup("ANTHROPIC_MODEL") {
            ai.anthropic_model = v;
        }
        if let Some(v) = lookup("AI_MAX_TOKENS") {
            ai.max_tokens = v
                .parse()
                .map_err(|_| PipelineError::Config(format!("AI_MAX_TOKENS is not a number: {}", v)))?;
        }
        if let Some(v) = lookup("AI_TEMPERATURE") {
            ai.temperature = v
                .parse()
                .map_err(|_| PipelineError::Config(format!("AI_TEMPERATURE is not a number: {}", v)))?;
        }
        if let Some(v) = lookup("CHROME_PATH") {
            self.browser.chrome_path = Some(v);
        }
        if let Some(v) = lookup("METRICS_ADDR") {
            self.metrics_addr = Some(v);
        }

        self.ai.provider_kind()?;
        Ok(())
    }
}
