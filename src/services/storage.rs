use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};

pub struct ObjectSummary {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Server-side view of the object store. Bytes are written by clients directly
/// under a signed credential, so there is no upload here.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Succeeds when the blob is gone afterwards, whether or not it existed.
    async fn delete_if_exists(&self, key: &str) -> Result<()>;
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>>;

    fn is_configured(&self) -> bool {
        true
    }
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn delete_if_exists(&self, key: &str) -> Result<()> {
        let res = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        if let Err(e) = res {
            let service_error = e.into_service_error();
            tracing::debug!(
                "S3 delete_object failed: bucket={}, key={}, error={:?}",
                self.bucket,
                key,
                service_error
            );
            return Err(anyhow::anyhow!(service_error));
        }
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let res = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await?;

            if let Some(contents) = res.contents {
                for object in contents {
                    if let Some(key) = object.key {
                        let last_modified = object
                            .last_modified
                            .and_then(|d| DateTime::from_timestamp(d.secs(), d.subsec_nanos()));
                        objects.push(ObjectSummary { key, last_modified });
                    }
                }
            }

            if res.is_truncated.unwrap_or(false) {
                continuation_token = res.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(objects)
    }
}
