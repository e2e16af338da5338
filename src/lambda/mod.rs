// src/lambda/mod.rs

//! AWS Lambda handler for the slot watcher.
//!
//! Only scheduled (one-minute EventBridge) invocations run a tick against the
//! S3-backed snapshot. HTTP invocations (function URL or API Gateway) are
//! webhook traffic: they answer Messenger's `hub.*` subscription handshake or
//! are acknowledged, and never touch the snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::{TickReport, Watcher};
use crate::services::webhook::{self, Verification};
use crate::storage::SnapshotStore;
use crate::storage::s3::S3Storage;

/// Query part of a function URL / API Gateway event.
#[derive(Debug, Default, Deserialize)]
struct HttpEvent {
    #[serde(default, rename = "queryStringParameters")]
    query: Option<HashMap<String, String>>,
}

/// What caused an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Schedule,
    Http,
    Unknown,
}

impl Trigger {
    fn of(payload: &Value) -> Self {
        let field = |name: &str| payload.get(name).and_then(Value::as_str);

        if field("source") == Some("aws.events") || field("detail-type") == Some("Scheduled Event") {
            return Self::Schedule;
        }

        let is_http = payload.pointer("/requestContext/http").is_some()
            || payload.get("httpMethod").is_some()
            || payload.get("rawPath").is_some()
            || payload.get("queryStringParameters").is_some();
        if is_http { Self::Http } else { Self::Unknown }
    }
}

/// Lambda response payload for a tick.
#[derive(Debug, Default, Serialize)]
pub struct TickResponse {
    /// Whether the tick completed, including delivery
    pub success: bool,

    /// Entries currently listed upstream
    pub total_entries: usize,

    /// Entries that were not in the previous snapshot
    pub new_entries: usize,

    /// Entries that disappeared since the previous snapshot
    pub removed_entries: usize,

    /// Whether a notification went out
    pub notified: bool,

    /// Error message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl From<TickReport> for TickResponse {
    fn from(report: TickReport) -> Self {
        Self {
            success: true,
            total_entries: report.total,
            new_entries: report.new,
            removed_entries: report.removed,
            notified: report.notified,
            ..Default::default()
        }
    }
}

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<Value, LambdaError> {
    let (payload, _context) = event.into_parts();
    let config = load_lambda_config();
    dispatch(&payload, &config).await
}

/// Route an invocation by its trigger.
async fn dispatch(payload: &Value, config: &Config) -> std::result::Result<Value, LambdaError> {
    match Trigger::of(payload) {
        Trigger::Http => return Ok(http_response(payload, &config.messenger.verify_token)),
        Trigger::Unknown => {
            warn!("Unrecognized invocation, not running a tick");
            let response = TickResponse {
                error: Some("unrecognized trigger".to_string()),
                ..Default::default()
            };
            return Ok(serde_json::to_value(response)?);
        }
        Trigger::Schedule => {}
    }

    let start = std::time::Instant::now();
    let mut response = match run_tick(config).await {
        Ok(report) => {
            info!(
                "Tick completed: {} listed, {} new, notified={}",
                report.total, report.new, report.notified
            );
            TickResponse::from(report)
        }
        Err(e) => {
            error!(stage = e.stage(), "Tick failed: {}", e);
            TickResponse {
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    };
    response.execution_time_ms = start.elapsed().as_millis() as u64;

    Ok(serde_json::to_value(response)?)
}

/// Internal tick logic.
async fn run_tick(config: &Config) -> Result<TickReport> {
    let store: Arc<dyn SnapshotStore> = Arc::new(S3Storage::from_env().await?);
    let watcher = Watcher::from_config(config, store, false)?;
    watcher.tick().await
}

/// Answer webhook traffic: the subscription handshake, or a plain acknowledgement.
fn http_response(payload: &Value, verify_token: &str) -> Value {
    let event: HttpEvent = serde_json::from_value(payload.clone()).unwrap_or_default();
    let query = event.query.unwrap_or_default();

    let verification = webhook::verify(
        query.get("hub.mode").map(String::as_str),
        query.get("hub.verify_token").map(String::as_str),
        query.get("hub.challenge").map(String::as_str),
        verify_token,
    );

    match verification {
        Verification::Verified(challenge) => json!({ "statusCode": 200, "body": challenge }),
        Verification::Rejected => json!({ "statusCode": 403, "body": "Forbidden" }),
        Verification::Ignored => {
            info!("Webhook event acknowledged");
            json!({ "statusCode": 200, "body": "EVENT_RECEIVED" })
        }
    }
}

/// Load configuration suitable for Lambda environment.
///
/// `CONFIG_PATH` may point at a bundled TOML file; secrets come from the
/// environment either way.
fn load_lambda_config() -> Config {
    let mut config = match std::env::var("CONFIG_PATH") {
        Ok(path) => Config::load_or_default(path),
        Err(_) => Config::default(),
    };
    config.apply_env();
    config
}
