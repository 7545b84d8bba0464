//! Google ID token verification
//!
//! The frontend completes the OAuth popup and hands the backend a Google ID
//! token. The backend checks it against Google's published signing keys
//! before creating a session.

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Google's JWKS endpoint
pub const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Issuers Google uses for ID tokens
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// How long fetched signing keys are reused (Google rotates them every few days)
const KEY_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Minimum gap between refetches triggered by an unknown key id
const KEY_REFRESH_MIN_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("malformed ID token: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),

    #[error("ID token header has no key id")]
    MissingKeyId,

    #[error("no signing key with id {0}")]
    UnknownKey(String),

    #[error("failed to fetch signing keys: {0}")]
    KeyFetch(#[from] reqwest::Error),

    #[error("ID token rejected: {0}")]
    Rejected(#[source] jsonwebtoken::errors::Error),
}

/// Profile carried by a verified ID token
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoogleIdentity {
    pub sub: String,
    pub email: String,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub email_verified: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Older Google tokens encode `email_verified` as the string `"true"`
fn bool_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.eq_ignore_ascii_case("true"),
    })
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify an ID token and return the identity it asserts
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, IdentityError>;
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

/// Verifies Google ID tokens for one OAuth client
pub struct GoogleVerifier {
    client_id: String,
    certs_url: String,
    http: reqwest::Client,
    keys: RwLock<Option<CachedKeys>>,
}

impl GoogleVerifier {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self::with_certs_url(client_id, GOOGLE_CERTS_URL)
    }

    /// Verifier reading keys from a custom JWKS location
    pub fn with_certs_url(client_id: impl Into<String>, certs_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client_id: client_id.into(),
            certs_url: certs_url.into(),
            http,
            keys: RwLock::new(None),
        }
    }

    async fn fetch_keys(&self) -> Result<JwkSet, IdentityError> {
        tracing::debug!("Fetching Google signing keys from {}", self.certs_url);
        let set = self
            .http
            .get(&self.certs_url)
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;
        Ok(set)
    }

    /// Resolve a signing key, refreshing the cache when stale or the key is unknown
    ///
    /// An unknown key id refreshes at most once per `KEY_REFRESH_MIN_INTERVAL`.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, IdentityError> {
        {
            let cached = self.keys.read().await;
            if let Some(cached) = cached.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < KEY_CACHE_TTL {
                    if let Some(jwk) = cached.set.find(kid) {
                        return DecodingKey::from_jwk(jwk).map_err(IdentityError::Malformed);
                    }
                    if age < KEY_REFRESH_MIN_INTERVAL {
                        return Err(IdentityError::UnknownKey(kid.to_string()));
                    }
                }
            }
        }

        let set = self.fetch_keys().await?;
        let key = set
            .find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()
            .map_err(IdentityError::Malformed)?;

        *self.keys.write().await = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });

        key.ok_or_else(|| IdentityError::UnknownKey(kid.to_string()))
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, IdentityError> {
        let header = decode_header(id_token).map_err(IdentityError::Malformed)?;
        let kid = header.kid.ok_or(IdentityError::MissingKeyId)?;
        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let data = decode::<GoogleIdentity>(id_token, &key, &validation)
            .map_err(IdentityError::Rejected)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_verified_accepts_string() {
        let identity: GoogleIdentity = serde_json::from_value(serde_json::json!({
            "sub": "1",
            "email": "a@example.com",
            "email_verified": "true"
        }))
        .unwrap();
        assert!(identity.email_verified);
        assert!(identity.name.is_none());
    }

    #[test]
    fn test_email_verified_defaults_to_false() {
        let identity: GoogleIdentity = serde_json::from_value(serde_json::json!({
            "sub": "1",
            "email": "a@example.com"
        }))
        .unwrap();
        assert!(!identity.email_verified);
    }

    #[tokio::test]
    async fn test_garbage_token_is_malformed() {
        let verifier = GoogleVerifier::with_certs_url("client", "http://127.0.0.1:9/certs");
        assert!(matches!(
            verifier.verify("not-a-jwt").await,
            Err(IdentityError::Malformed(_))
        ));
    }
}
