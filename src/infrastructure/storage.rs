use crate::config::StorageConfig;
use crate::services::credentials::{CredentialIssuer, S3CredentialIssuer, UnconfiguredStorage};
use crate::services::storage::{S3StorageService, StorageService};
use crate::utils::blob_path::BlobLocator;
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::{info, warn};

/// Object store handles shared by the upload, resource and sweeper services.
#[derive(Clone)]
pub struct StorageHandles {
    pub storage: Arc<dyn StorageService>,
    pub issuer: Arc<dyn CredentialIssuer>,
    pub locator: Option<BlobLocator>,
}

impl StorageHandles {
    pub fn unconfigured(locator: Option<BlobLocator>) -> Self {
        let unconfigured = Arc::new(UnconfiguredStorage);
        Self {
            storage: unconfigured.clone(),
            issuer: unconfigured,
            locator,
        }
    }
}

pub async fn setup_storage(config: &StorageConfig) -> StorageHandles {
    let locator = config
        .public_base_url()
        .map(|base| BlobLocator::new(&base));

    let (Some(endpoint_url), Some(access_key), Some(secret_key)) = (
        config.endpoint.clone(),
        config.access_key.clone(),
        config.secret_key.clone(),
    ) else {
        warn!("⚠️  Storage credentials not configured, uploads and downloads are unavailable");
        return StorageHandles::unconfigured(locator);
    };

    info!("☁️  S3 Storage: {} (Bucket: {})", endpoint_url, config.bucket);

    let aws_config = aws_config::from_env()
        .endpoint_url(&endpoint_url)
        .region(Region::new(config.region.clone()))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            access_key, secret_key, None, None, "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.force_path_style)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    match s3_client.head_bucket().bucket(&config.bucket).send().await {
        Ok(_) => info!("✅ Bucket '{}' is ready", config.bucket),
        Err(e) => warn!(
            "⚠️  Bucket '{}' is not reachable yet: {}",
            config.bucket,
            e.into_service_error()
        ),
    }

    StorageHandles {
        storage: Arc::new(S3StorageService::new(
            s3_client.clone(),
            config.bucket.clone(),
        )),
        issuer: Arc::new(S3CredentialIssuer::new(s3_client, config.bucket.clone())),
        locator,
    }
}
