//! Failure taxonomy for scenarios
//!
//! Drivers and flows return `anyhow::Result`; the variants below are the
//! typed failures a scenario can end with. Callers that need to tell them
//! apart use `err.downcast_ref::<E2eError>()`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum E2eError {
    #[error("Element '{selector}' not visible after {timeout_ms}ms")]
    VisibilityTimeout { selector: String, timeout_ms: u64 },

    #[error("Element '{selector}' is visible but disabled")]
    ElementDisabled { selector: String },

    #[error("Element '{selector}' has text {actual:?}, expected {expected:?}")]
    TextMismatch {
        selector: String,
        expected: String,
        actual: Option<String>,
    },

    #[error("Login verification failed: {0}")]
    LoginVerification(String),

    #[error("{context}: unexpected HTTP status {actual} (expected {expected})")]
    HttpStatus {
        context: String,
        expected: String,
        actual: u16,
    },

    #[error("Schema assertion failed on '{field}': {reason}")]
    SchemaAssertion { field: String, reason: String },

    #[error("No successful response after '{action}' within {timeout_ms}ms")]
    ResponseTimeout { action: String, timeout_ms: u64 },

    #[error("URL did not match /{pattern}/ within {timeout_ms}ms")]
    UrlTimeout { pattern: String, timeout_ms: u64 },

    #[error("Response took {elapsed_ms}ms (limit {limit_ms}ms)")]
    ResponseTime { elapsed_ms: u64, limit_ms: u64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl E2eError {
    pub fn schema(field: &str, reason: impl Into<String>) -> Self {
        Self::SchemaAssertion {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Short machine-friendly kind, used as the JUnit failure type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VisibilityTimeout { .. } => "VisibilityTimeout",
            Self::ElementDisabled { .. } => "ElementDisabled",
            Self::TextMismatch { .. } => "TextMismatch",
            Self::LoginVerification(_) => "LoginVerificationError",
            Self::HttpStatus { .. } => "HttpStatusError",
            Self::SchemaAssertion { .. } => "SchemaAssertionError",
            Self::ResponseTimeout { .. } => "ResponseTimeout",
            Self::UrlTimeout { .. } => "UrlTimeout",
            Self::ResponseTime { .. } => "ResponseTime",
            Self::Config(_) => "ConfigError",
        }
    }
}

/// Classify an arbitrary failure for reporting
pub fn failure_kind(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<E2eError>()
        .map(E2eError::kind)
        .unwrap_or("Error")
}
