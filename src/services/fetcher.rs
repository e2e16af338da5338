// src/services/fetcher.rs

//! Upstream page fetcher.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::{AppError, Result};
use crate::models::SourceConfig;
use crate::utils::http::{create_client, network_error};
use crate::utils::truncate;

/// Longest body excerpt kept in an upstream error.
const ERROR_BODY_CHARS: usize = 300;

/// Source of the raw listing page.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Retrieve the page content. One attempt, no retries.
    async fn fetch(&self) -> Result<String>;
}

/// Fetches the listing page with a single HTTP GET.
pub struct Fetcher {
    client: Client,
    url: String,
}

impl Fetcher {
    /// Create a fetcher with its own client built from the source settings.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self::with_client(create_client(config)?, &config.url))
    }

    /// Create a fetcher sharing an existing client.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PageSource for Fetcher {
    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| network_error(&self.url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| network_error(&self.url, e))?;

        check_status(status, body)
    }
}

/// Pass the body through on 2xx, otherwise report the status and an excerpt.
fn check_status(status: StatusCode, body: String) -> Result<String> {
    if status.is_success() {
        log::debug!("Received page ({} bytes)", body.len());
        Ok(body)
    } else {
        Err(AppError::upstream(
            status.as_u16(),
            truncate(body.trim(), ERROR_BODY_CHARS),
        ))
    }
}
