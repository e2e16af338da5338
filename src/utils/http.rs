// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &SourceConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| AppError::config(format!("cannot build HTTP client: {e}")))
}

/// Describe a transport-level reqwest failure without its request URL.
///
/// The URL may carry credentials in its query string.
pub fn describe_transport(err: reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "body read failed"
    } else {
        "request failed"
    };
    format!("{kind}: {}", err.without_url())
}

/// Map a transport-level reqwest failure to a network error with context.
pub fn network_error(context: &str, err: reqwest::Error) -> AppError {
    AppError::network(format!("{context}: {}", describe_transport(err)))
}
