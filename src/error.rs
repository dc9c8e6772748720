use thiserror::Error;

/// Coarse classification of a pipeline failure.
///
/// Call sites match on this to decide between retrying, falling back to a
/// degraded strategy, and propagating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    RateLimit,
    ServiceUnavailable,
    TransientNetwork,
    Parsing,
    Capture,
    Unsupported,
    ExtractionFailed,
    TemplateGenerationFailed,
}

impl ErrorKind {
    /// Failures an operator has to act on. These are never worked around by a
    /// per-call fallback.
    pub fn is_operator_actionable(self) -> bool {
        matches!(
            self,
            ErrorKind::Configuration | ErrorKind::RateLimit | ErrorKind::ServiceUnavailable
        )
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    // The HTTP status leads each backend message: the retry executor reads the
    // first three-digit number of the display text.
    #[error("HTTP 401: AI backend rejected the configured credential")]
    Configuration(String),

    #[error("HTTP 429: AI backend rate limit exceeded")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("HTTP {status}: AI service unavailable: {message}")]
    ServiceUnavailable { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("Failed to parse AI response: {0}")]
    Parsing(String),

    #[error("Page capture failed: {0}")]
    Capture(String),

    #[error("Operation not supported by this AI backend: {0}")]
    Unsupported(&'static str),

    #[error("Could not extract event details from the provided URL")]
    ExtractionFailed,

    #[error("Could not generate poster templates")]
    TemplateGenerationFailed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Configuration(_) | PipelineError::Config(_) => ErrorKind::Configuration,
            PipelineError::Toml(_) => ErrorKind::Configuration,
            PipelineError::RateLimited { .. } => ErrorKind::RateLimit,
            PipelineError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            PipelineError::Network(_) => ErrorKind::TransientNetwork,
            PipelineError::Parsing(_) => ErrorKind::Parsing,
            PipelineError::Capture(_) | PipelineError::Io(_) => ErrorKind::Capture,
            PipelineError::Unsupported(_) => ErrorKind::Unsupported,
            PipelineError::ExtractionFailed => ErrorKind::ExtractionFailed,
            PipelineError::TemplateGenerationFailed => ErrorKind::TemplateGenerationFailed,
        }
    }

    /// Classify a non-success HTTP response from an AI backend.
    pub fn from_status(status: u16, body: &str, retry_after_secs: Option<u64>) -> Self {
        match status {
            401 => PipelineError::Configuration(truncate(body, 200)),
            429 => PipelineError::RateLimited { retry_after_secs },
            _ => PipelineError::ServiceUnavailable {
                status,
                message: truncate(body, 200),
            },
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PipelineError::Parsing(err.to_string())
        } else if err.is_timeout() {
            PipelineError::Network(format!("request timed out: {err}"))
        } else {
            PipelineError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Parsing(err.to_string())
    }
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(PipelineError::from_status(401, "bad key", None).kind(), ErrorKind::Configuration);
        assert_eq!(PipelineError::from_status(429, "", Some(3)).kind(), ErrorKind::RateLimit);
        assert_eq!(PipelineError::from_status(503, "down", None).kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(PipelineError::from_status(400, "bad request", None).kind(), ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn status_leads_the_message() {
        let err = PipelineError::from_status(502, "upstream 404 page", None);
        assert!(err.to_string().starts_with("HTTP 502"));
    }

    #[test]
    fn parsing_is_not_operator_actionable() {
        assert!(!ErrorKind::Parsing.is_operator_actionable());
        assert!(!ErrorKind::TransientNetwork.is_operator_actionable());
        assert!(ErrorKind::RateLimit.is_operator_actionable());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 5), "héllo...");
        assert_eq!(truncate("short", 10), "short");
    }
}
