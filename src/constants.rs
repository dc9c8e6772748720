/// Provider names accepted in configuration
pub const PROVIDER_OPENAI: &str = "openai";
pub const PROVIDER_ANTHROPIC: &str = "anthropic";

// OpenAI endpoints and defaults
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4-turbo";
pub const OPENAI_DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const OPENAI_DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const OPENAI_IMAGE_SIZE: &str = "1024x1792";

// Anthropic endpoints and defaults
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-opus-20240229";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const VISION_MAX_TOKENS: u32 = 2000;
pub const HTTP_TIMEOUT_SECS: u64 = 120;

// Page capture
pub const VIEWPORT_WIDTH: u32 = 1280;
pub const VIEWPORT_HEIGHT: u32 = 800;
pub const NAVIGATION_TIMEOUT_SECS: u64 = 30;
pub const SETTLE_DELAY_MS: u64 = 1000;
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default number of templates requested per event
pub const DEFAULT_TEMPLATE_COUNT: usize = 3;

// Palette fallbacks shared by the mock generator and the placeholder image
pub const DEFAULT_PRIMARY_COLOR: &str = "#6C5CE7";
pub const DEFAULT_SECONDARY_COLOR: &str = "#A29BFE";

pub const PLACEHOLDER_IMAGE_BASE: &str = "https://placehold.co/1080x1350";

/// Copy used on every generated attendance badge
pub const ATTENDING_TEXT: &str = "I'm Attending!";
