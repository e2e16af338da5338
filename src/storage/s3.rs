//! AWS S3 storage implementation.
//!
//! The snapshot lives in a single object `{prefix}/snapshot.json`. A
//! `PutObject` replaces the object atomically, so readers never see a
//! partially written set and overlapping ticks resolve as last writer wins.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{ScheduleEntry, Snapshot};
use crate::storage::{SNAPSHOT_KEY, SnapshotStore};

/// S3-backed snapshot store.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Storage {
    /// Create a new S3 storage instance.
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Create S3 storage from environment configuration.
    pub async fn from_env() -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);

        let bucket = std::env::var("S3_BUCKET").unwrap_or_else(|_| "slotwatch".to_string());
        let prefix = std::env::var("S3_PREFIX").unwrap_or_else(|_| "autino".to_string());

        Ok(Self::new(client, bucket, prefix))
    }

    fn key(&self) -> String {
        object_key(&self.prefix, SNAPSHOT_KEY)
    }

    /// Read the snapshot object, `None` when it does not exist.
    async fn read_object(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::store(format!("s3://{}/{}: {e}", self.bucket, key)))?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    info!("No existing snapshot at s3://{}/{}", self.bucket, key);
                    Ok(None)
                } else {
                    Err(AppError::store(format!(
                        "s3://{}/{}: {service_err}",
                        self.bucket, key
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl SnapshotStore for S3Storage {
    async fn read_all(&self) -> Result<Snapshot> {
        let key = self.key();
        match self.read_object(&key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| AppError::store(format!("s3://{}/{}: {e}", self.bucket, key))),
            None => Ok(Snapshot::default()),
        }
    }

    async fn replace_all(&self, entries: &[ScheduleEntry]) -> Result<()> {
        let key = self.key();
        let snapshot = Snapshot::from_entries(entries);
        let json = serde_json::to_vec_pretty(&snapshot)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(json))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| AppError::store(format!("s3://{}/{}: {e}", self.bucket, key)))?;

        info!(
            "Wrote {} entries to s3://{}/{}",
            snapshot.len(),
            self.bucket,
            key
        );
        Ok(())
    }
}

/// Join a prefix and object name without doubled slashes.
fn object_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
