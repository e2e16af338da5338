// src/error.rs

//! Unified error handling for the slot watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Connection, timeout or body read failure while talking to a remote host
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream page answered with a non-2xx status
    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Listing container present but no slots could be extracted
    #[error("Parse error: {0}")]
    Parse(String),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Snapshot store read or write failed
    #[error("Store error: {0}")]
    Store(String),

    /// Send endpoint rejected the message, or could not be reached (status 0)
    #[error("Delivery failed with status {status}: {payload}")]
    Delivery { status: u16, payload: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Create a network error.
    pub fn network(message: impl fmt::Display) -> Self {
        Self::Network(message.to_string())
    }

    /// Create an upstream status error.
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a store error.
    pub fn store(message: impl fmt::Display) -> Self {
        Self::Store(message.to_string())
    }

    /// Create a delivery error.
    pub fn delivery(status: u16, payload: impl Into<String>) -> Self {
        Self::Delivery {
            status,
            payload: payload.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error means the page could not be turned into entries.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Selector { .. })
    }

    /// Pipeline stage the error belongs to, for log context.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Network(_) | Self::Upstream { .. } => "fetch",
            Self::Parse(_) | Self::Selector { .. } => "parse",
            Self::Store(_) | Self::Io(_) | Self::Json(_) => "store",
            Self::Delivery { .. } => "notify",
            Self::Toml(_) | Self::Url(_) | Self::Config(_) => "config",
        }
    }
}
