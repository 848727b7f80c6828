use crate::config::AuthConfig;
use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user_id, the owner id of schedules
    pub exp: usize,
    #[serde(default)]
    pub jti: String,
}

/// Mints an HS256 token. Production tokens come from the identity provider.
pub fn create_jwt(user_id: &str, secret: &str, ttl: Duration) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?
        .timestamp();

    let claims = Claims {
        sub: user_id.to_owned(),
        exp: expiration as usize,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

pub fn validate_jwt(token: &str, config: &AuthConfig) -> Result<Claims> {
    let (decoding_key, validation) = if let Some(public_key) = &config.jwt_public_key {
        let mut val = Validation::new(Algorithm::RS256);
        val.validate_aud = false; // Allow any audience for generic OIDC compatibility
        (DecodingKey::from_rsa_pem(public_key.as_bytes())?, val)
    } else {
        if config.jwt_secret.trim().is_empty() {
            anyhow::bail!("no token signing key configured");
        }
        (
            DecodingKey::from_secret(config.jwt_secret.as_ref()),
            Validation::default(),
        )
    };

    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;

    if token_data.claims.sub.is_empty() {
        anyhow::bail!("token has no subject");
    }

    Ok(token_data.claims)
}
