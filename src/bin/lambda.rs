//! AWS Lambda entry point for slotwatch.
//!
//! Deploy with `cargo lambda build --release --features lambda` and attach a
//! one-minute EventBridge schedule.
//!
//! ## Environment Variables
//!
//! - `S3_BUCKET`: S3 bucket for the snapshot (default: `slotwatch`)
//! - `S3_PREFIX`: S3 key prefix (default: `autino`)
//! - `CONFIG_PATH`: Optional bundled `config.toml`
//! - `PAGE_ACCESS_TOKEN`, `RECIPIENT_ID`, `VERIFY_TOKEN`: Messenger credentials
//! - `RUST_LOG`: Log level (e.g., `info`, `debug`)

use lambda_runtime::{Error as LambdaError, service_fn};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("slotwatch Lambda starting...");
    lambda_runtime::run(service_fn(slotwatch::lambda::handler)).await
}
