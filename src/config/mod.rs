use anyhow::{Result, bail};
use std::env;

/// Settings for the upload and resource lifecycle
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Lifetime of a read-write upload credential in minutes (default: 60)
    pub upload_ttl_minutes: u32,

    /// Lifetime of a read-only download credential in minutes (default: 10)
    pub read_ttl_minutes: u32,

    /// Attempts for a conditional schedule write before giving up with 409 (default: 3)
    pub max_write_attempts: u32,

    /// Seconds between orphaned blob sweeps (default: 3600)
    pub orphan_sweep_interval_secs: u64,

    /// Minimum blob age in hours before an untracked blob is swept (default: 24)
    pub orphan_grace_hours: i64,

    pub auth: AuthConfig,
}

/// Bearer token verification settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 secret. Empty means unset; startup refuses to run without a secret or public key.
    pub jwt_secret: String,

    /// RS256 public key PEM of an external identity provider. Takes precedence over the secret.
    pub jwt_public_key: Option<String>,
}

/// S3-compatible object storage settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: String,
    /// Base of the public blob URLs handed back to clients (default: "{endpoint}/{bucket}")
    pub public_base_url: Option<String>,
    pub force_path_style: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_ttl_minutes: 60,
            read_ttl_minutes: 10,
            max_write_attempts: 3,
            orphan_sweep_interval_secs: 3600,
            orphan_grace_hours: 24,
            auth: AuthConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_public_key: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: "us-east-1".to_string(),
            access_key: None,
            secret_key: None,
            bucket: "study-resources".to_string(),
            public_base_url: None,
            force_path_style: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            upload_ttl_minutes: parse_var("UPLOAD_CREDENTIAL_TTL_MINUTES")
                .unwrap_or(default.upload_ttl_minutes),

            read_ttl_minutes: parse_var("READ_CREDENTIAL_TTL_MINUTES")
                .unwrap_or(default.read_ttl_minutes),

            max_write_attempts: parse_var("MAX_WRITE_ATTEMPTS")
                .unwrap_or(default.max_write_attempts),

            orphan_sweep_interval_secs: parse_var("ORPHAN_SWEEP_INTERVAL_SECS")
                .unwrap_or(default.orphan_sweep_interval_secs),

            orphan_grace_hours: parse_var("ORPHAN_GRACE_HOURS")
                .unwrap_or(default.orphan_grace_hours),

            auth: AuthConfig {
                jwt_secret: non_empty_var("JWT_SECRET").unwrap_or(default.auth.jwt_secret),
                jwt_public_key: non_empty_var("JWT_PUBLIC_KEY"),
            },
        }
    }

    /// Create config for development and tests (short sweep interval, fixed secret)
    pub fn development() -> Self {
        Self {
            upload_ttl_minutes: 60,
            read_ttl_minutes: 10,
            max_write_attempts: 3,
            orphan_sweep_interval_secs: 60,
            orphan_grace_hours: 1,
            auth: AuthConfig {
                jwt_secret: "development-secret".to_string(),
                jwt_public_key: None,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.upload_ttl_minutes == 0 || self.read_ttl_minutes == 0 {
            bail!("credential TTLs must be positive");
        }
        if self.read_ttl_minutes >= self.upload_ttl_minutes {
            bail!(
                "read credential TTL ({}m) must be shorter than upload credential TTL ({}m)",
                self.read_ttl_minutes,
                self.upload_ttl_minutes
            );
        }
        if self.max_write_attempts == 0 {
            bail!("MAX_WRITE_ATTEMPTS must be at least 1");
        }
        if !self.auth.is_configured() {
            bail!("JWT_SECRET or JWT_PUBLIC_KEY must be set");
        }
        if self.orphan_grace_hours < 0 {
            bail!("ORPHAN_GRACE_HOURS must not be negative");
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.trim().is_empty() || self.jwt_public_key.is_some()
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            endpoint: non_empty_var("STORAGE_ENDPOINT"),
            region: env::var("STORAGE_REGION").unwrap_or(default.region),
            access_key: non_empty_var("STORAGE_ACCESS_KEY"),
            secret_key: non_empty_var("STORAGE_SECRET_KEY"),
            bucket: env::var("STORAGE_BUCKET").unwrap_or(default.bucket),
            public_base_url: non_empty_var("STORAGE_PUBLIC_BASE_URL"),
            force_path_style: env::var("STORAGE_FORCE_PATH_STYLE")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(default.force_path_style),
        }
    }

    pub fn public_base_url(&self) -> Option<String> {
        if let Some(base) = &self.public_base_url {
            return Some(base.trim_end_matches('/').to_string());
        }
        self.endpoint
            .as_ref()
            .map(|endpoint| format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket))
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
