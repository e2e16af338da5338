// src/services/notifier.rs

//! Messenger notifier.
//!
//! Renders newly found slots into one message and posts it to the Messenger
//! Send API. A rejected send is reported as [`AppError::Delivery`]; it is
//! never retried.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{MessagesConfig, MessengerConfig, ScheduleEntry};
use crate::utils::http::describe_transport;

/// Longest text the Send API accepts in one message.
pub const SEND_API_TEXT_LIMIT: usize = 2000;

/// Acknowledgement returned by the send endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryReceipt {
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Delivers a batch of new entries to the subscriber.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, entries: &[ScheduleEntry]) -> Result<DeliveryReceipt>;
}

/// Builds the notification text.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    messages: MessagesConfig,
    source_url: String,
}

impl MessageComposer {
    pub fn new(messages: MessagesConfig, source_url: impl Into<String>) -> Self {
        Self {
            messages,
            source_url: source_url.into(),
        }
    }

    /// Header, one block per entry separated by blank lines, then the footer.
    pub fn compose(&self, entries: &[ScheduleEntry]) -> String {
        let mut blocks = Vec::with_capacity(entries.len() + 2);
        blocks.push(self.messages.header.clone());
        blocks.extend(
            entries
                .iter()
                .map(|e| e.format(&self.messages.entry_template)),
        );
        blocks.push(self.messages.footer.replace("{source}", &self.source_url));
        blocks.join("\n\n")
    }
}

/// Messenger Send API client for a single recipient.
pub struct MessengerNotifier {
    client: Client,
    config: MessengerConfig,
    composer: MessageComposer,
}

impl MessengerNotifier {
    pub fn new(client: Client, config: MessengerConfig, composer: MessageComposer) -> Self {
        Self {
            client,
            config,
            composer,
        }
    }

    /// Post a text message to the configured recipient.
    pub async fn send_text(&self, text: &str) -> Result<DeliveryReceipt> {
        let body = json!({
            "recipient": { "id": self.config.recipient_id },
            "message": { "text": text },
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[("access_token", self.config.access_token.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_failure(0, e))?;

        let status = response.status();
        let payload = response
            .text()
            .await
            .map_err(|e| self.transport_failure(status.as_u16(), e))?;

        classify_response(status, &payload)
    }

    /// Transport failure on the send call. `status` is 0 when no response arrived.
    fn transport_failure(&self, status: u16, err: reqwest::Error) -> AppError {
        let endpoint = self
            .config
            .endpoint
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        AppError::delivery(status, format!("{endpoint}: {}", describe_transport(err)))
    }
}

#[async_trait]
impl Notify for MessengerNotifier {
    async fn notify(&self, entries: &[ScheduleEntry]) -> Result<DeliveryReceipt> {
        let text = self.composer.compose(entries);
        let chars = text.chars().count();
        if chars > SEND_API_TEXT_LIMIT {
            log::warn!(
                "Notification for {} slots is {} chars, over the Send API limit of {}; the send will likely be rejected",
                entries.len(),
                chars,
                SEND_API_TEXT_LIMIT
            );
        } else {
            log::debug!("Sending notification ({} chars)", chars);
        }
        self.send_text(&text).await
    }
}

/// Logs the composed message instead of sending it. Used for dry runs.
pub struct LogNotifier {
    composer: MessageComposer,
}

impl LogNotifier {
    pub fn new(composer: MessageComposer) -> Self {
        Self { composer }
    }
}

#[async_trait]
impl Notify for LogNotifier {
    async fn notify(&self, entries: &[ScheduleEntry]) -> Result<DeliveryReceipt> {
        log::info!("Dry run, not sending:\n{}", self.composer.compose(entries));
        Ok(DeliveryReceipt::default())
    }
}

/// Accept 2xx answers that acknowledge a message or at least a recipient.
pub fn classify_response(status: StatusCode, payload: &str) -> Result<DeliveryReceipt> {
    if !status.is_success() {
        return Err(AppError::delivery(status.as_u16(), payload));
    }

    match serde_json::from_str::<DeliveryReceipt>(payload) {
        Ok(receipt) if receipt.message_id.is_some() || receipt.recipient_id.is_some() => {
            Ok(receipt)
        }
        _ => Err(AppError::delivery(status.as_u16(), payload)),
    }
}
