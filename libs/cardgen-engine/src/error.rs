//! Typed error taxonomy for backend API calls.
//!
//! Every non-2xx response maps into exactly one variant; the pipeline
//! decides per variant whether to count down, surface a banner, or record a
//! per-item failure. Display strings are user-presentable.

use thiserror::Error;

/// Errors from the flashcard backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required. Please sign in again")]
    Authentication,

    #[error("Rate limit exceeded. Try again in {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("The AI service is temporarily unavailable. Try again shortly")]
    ServiceUnavailable,

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        /// Field-level details when the server supplies them.
        details: Option<serde_json::Value>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from server: {0}")]
    Parse(String),

    #[error("Request failed with status {status}: {message}")]
    Unexpected { status: u16, message: String },
}

impl ApiError {
    /// Stable machine-readable code for structured failure payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::RateLimited { .. } => "RATE_LIMIT",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::Unexpected { .. } => "AI_SERVICE_ERROR",
        }
    }

    /// A user-presentable message, uniform across variants.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rate_limited_message_names_the_wait() {
        let err = ApiError::RateLimited { retry_after_secs: 30 };
        assert!(err.user_message().contains("30"));
        assert_eq!(err.code(), "RATE_LIMIT");
    }

    #[test]
    fn unexpected_is_the_generic_service_error() {
        let err = ApiError::Unexpected { status: 500, message: "oops".to_string() };
        assert_eq!(err.code(), "AI_SERVICE_ERROR");
        assert!(err.user_message().contains("500"));
    }
}
