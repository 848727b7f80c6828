use crate::api::error::AppError;
use crate::models::{Permission, SignedCredential};
use crate::services::storage::{ObjectSummary, StorageService};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use chrono::{Duration, Utc};

/// Mints signed, self-expiring URLs for a single blob path.
///
/// Authorization happens before this is called; the object store only checks
/// the signature and expiry. There is no revocation.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(
        &self,
        blob_path: &str,
        ttl_minutes: u32,
        permission: Permission,
    ) -> Result<SignedCredential, AppError>;
}

fn check_request(blob_path: &str, ttl_minutes: u32) -> Result<(), AppError> {
    if blob_path.is_empty() {
        return Err(AppError::BadRequest("Blob path must not be empty".to_string()));
    }
    if ttl_minutes == 0 {
        return Err(AppError::Configuration(
            "credential TTL must be positive".to_string(),
        ));
    }
    Ok(())
}

/// SigV4 presigned URLs: `Read` is a presigned GET, `ReadWrite` a presigned PUT
/// for the client's direct upload.
pub struct S3CredentialIssuer {
    client: Client,
    bucket: String,
}

impl S3CredentialIssuer {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl CredentialIssuer for S3CredentialIssuer {
    async fn issue(
        &self,
        blob_path: &str,
        ttl_minutes: u32,
        permission: Permission,
    ) -> Result<SignedCredential, AppError> {
        check_request(blob_path, ttl_minutes)?;

        let issued_at = Utc::now();
        let ttl = std::time::Duration::from_secs(u64::from(ttl_minutes) * 60);
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| AppError::BadRequest(format!("Invalid credential TTL: {}", e)))?;

        let url = match permission {
            Permission::Read => self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(blob_path)
                .presigned(presigning)
                .await
                .map(|req| req.uri().to_string())
                .map_err(|e| anyhow::anyhow!("presign GET failed: {}", e))?,
            Permission::ReadWrite => self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(blob_path)
                .presigned(presigning)
                .await
                .map(|req| req.uri().to_string())
                .map_err(|e| anyhow::anyhow!("presign PUT failed: {}", e))?,
        };

        Ok(SignedCredential {
            url,
            blob_path: blob_path.to_string(),
            permission,
            expires_at: issued_at + Duration::minutes(i64::from(ttl_minutes)),
        })
    }
}

/// Stands in for both storage seams when credentials are missing, so that
/// every upload/download operation answers "not available" instead of
/// degrading silently.
pub struct UnconfiguredStorage;

const UNCONFIGURED: &str = "file storage credentials are not configured";

#[async_trait]
impl CredentialIssuer for UnconfiguredStorage {
    async fn issue(
        &self,
        _blob_path: &str,
        _ttl_minutes: u32,
        _permission: Permission,
    ) -> Result<SignedCredential, AppError> {
        Err(AppError::Configuration(UNCONFIGURED.to_string()))
    }
}

#[async_trait]
impl StorageService for UnconfiguredStorage {
    async fn delete_if_exists(&self, _key: &str) -> anyhow::Result<()> {
        anyhow::bail!(UNCONFIGURED)
    }

    async fn list_objects(&self, _prefix: &str) -> anyhow::Result<Vec<ObjectSummary>> {
        anyhow::bail!(UNCONFIGURED)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

    fn offline_issuer() -> S3CredentialIssuer {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url("http://127.0.0.1:9000")
            .credentials_provider(Credentials::new(
                "minioadmin",
                "minioadmin",
                None,
                None,
                "static",
            ))
            .force_path_style(true)
            .build();
        S3CredentialIssuer::new(Client::from_conf(config), "study-resources".to_string())
    }

    #[tokio::test]
    async fn test_read_write_credential_is_signed_put() {
        let issuer = offline_issuer();
        let before = Utc::now();
        let credential = issuer
            .issue("U1/S1/1700000000000_notes.pdf", 60, Permission::ReadWrite)
            .await
            .unwrap();

        assert!(
            credential
                .url
                .starts_with("http://127.0.0.1:9000/study-resources/U1/S1/1700000000000_notes.pdf?")
        );
        assert!(credential.url.contains("X-Amz-Signature="));
        assert!(credential.url.contains("X-Amz-Expires=3600"));
        assert_eq!(credential.permission, Permission::ReadWrite);
        assert!(credential.expires_at >= before + Duration::minutes(60));
        assert!(credential.expires_at <= Utc::now() + Duration::minutes(60));
    }

    #[tokio::test]
    async fn test_read_credential_uses_its_own_ttl() {
        let issuer = offline_issuer();
        let credential = issuer
            .issue("U1/S1/1_notes.pdf", 10, Permission::Read)
            .await
            .unwrap();
        assert!(credential.url.contains("X-Amz-Expires=600"));
        assert_eq!(credential.blob_path, "U1/S1/1_notes.pdf");
    }

    #[tokio::test]
    async fn test_signature_covers_the_path() {
        let issuer = offline_issuer();
        let a = issuer.issue("U1/S1/1_a.pdf", 10, Permission::Read).await.unwrap();
        let b = issuer.issue("U1/S1/1_b.pdf", 10, Permission::Read).await.unwrap();
        let signature = |url: &str| {
            url.split("X-Amz-Signature=")
                .nth(1)
                .map(|s| s.split('&').next().unwrap_or_default().to_string())
                .unwrap()
        };
        assert_ne!(signature(&a.url), signature(&b.url));
    }

    #[tokio::test]
    async fn test_invalid_requests_are_rejected() {
        let issuer = offline_issuer();
        assert!(matches!(
            issuer.issue("", 10, Permission::Read).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            issuer.issue("U1/S1/1_a.pdf", 0, Permission::Read).await,
            Err(AppError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_storage_refuses() {
        let storage = UnconfiguredStorage;
        assert!(matches!(
            storage.issue("U1/S1/1_a.pdf", 10, Permission::Read).await,
            Err(AppError::Configuration(_))
        ));
        assert!(storage.delete_if_exists("U1/S1/1_a.pdf").await.is_err());
        assert!(!storage.is_configured());
    }
}
