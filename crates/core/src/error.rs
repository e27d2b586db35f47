//! Error types for the DialogBridge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`WebhookError`] is the
//! taxonomy the webhook boundary converts into the fallback reply.

use thiserror::Error;

// --- Bounded context errors ---

/// Failures of the completion capability.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider returned no content")]
    EmptyCompletion,
}

/// Everything that can go wrong while fulfilling one webhook call.
///
/// None of these ever reach the caller: the gateway turns each of them into
/// the fallback reply with a success status.
#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    /// The completion call failed or produced nothing usable.
    #[error("Completion failed: {0}")]
    Capability(#[from] ProviderError),

    /// The inbound payload is missing fields or is not valid JSON.
    #[error("Malformed webhook payload: {0}")]
    MalformedInput(String),

    /// Anything else, including a panic inside the handler.
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl WebhookError {
    /// Stable label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Capability(_) => "capability",
            Self::MalformedInput(_) => "malformed_input",
            Self::Unexpected(_) => "unexpected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn provider_error_lifts_into_capability() {
        let err: WebhookError = ProviderError::EmptyCompletion.into();
        assert_eq!(err.kind(), "capability");
        assert!(err.to_string().contains("no content"));
    }

    #[test]
    fn webhook_error_kinds_are_distinct() {
        let kinds = [
            WebhookError::Capability(ProviderError::Network("down".into())).kind(),
            WebhookError::MalformedInput("missing queryResult".into()).kind(),
            WebhookError::Unexpected("boom".into()).kind(),
        ];
        assert_eq!(kinds, ["capability", "malformed_input", "unexpected"]);
    }
}
