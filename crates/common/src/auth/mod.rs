//! Identity resolution
//!
//! Provides:
//! - Bearer token extraction
//! - RS256 JWT validation against the identity provider's published JWKS
//!   (cached, with a rate-limited refresh)
//! - Just-in-time provisioning of local user records

use crate::config::AuthConfig;
use crate::db::Repository;
use crate::errors::{AppError, Result};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// The verified identity attached to every ownership-gated operation
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Identity-provider subject, also the local user primary key
    pub user_id: String,

    pub email: String,
}

/// Claims expected from the identity provider's access token
#[derive(Debug, Deserialize)]
pub struct Claims {
    /// Subject (stable user identifier)
    pub sub: String,

    #[serde(default)]
    pub email: Option<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: Option<i64>,
}

/// A single key from the issuer's JWKS document
#[derive(Debug, Deserialize)]
pub struct Jwk {
    pub kid: String,
    pub kty: String,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(rename = "use", default)]
    pub public_key_use: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// Verifies bearer tokens against a trusted issuer.
///
/// Keys are fetched from the issuer's JWKS endpoint and cached; an unknown
/// key id triggers a refresh, at most once per cooldown interval so a flood
/// of bad tokens cannot hammer the issuer.
pub struct TokenVerifier {
    client: reqwest::Client,
    issuer: String,
    jwks_url: String,
    refresh_cooldown: Duration,
    keys: RwLock<HashMap<String, DecodingKey>>,
    last_refresh: Mutex<Option<Instant>>,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.jwks_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            issuer: config.issuer_url.clone(),
            jwks_url: config.jwks_url(),
            refresh_cooldown: Duration::from_secs(config.jwks_refresh_cooldown_secs),
            keys: RwLock::new(HashMap::new()),
            last_refresh: Mutex::new(None),
        }
    }

    /// Validate a bearer token's signature and claims
    pub async fn verify(&self, token: &str) -> Result<Claims> {
        let header = decode_header(token).map_err(|_| AppError::InvalidToken)?;
        let kid = header.kid.ok_or(AppError::InvalidToken)?;

        let key = match self.cached_key(&kid).await {
            Some(key) => key,
            None => {
                self.refresh_keys().await?;
                self.cached_key(&kid).await.ok_or(AppError::InvalidToken)?
            }
        };

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })
    }

    async fn cached_key(&self, kid: &str) -> Option<DecodingKey> {
        self.keys.read().await.get(kid).cloned()
    }

    /// Fetch the issuer's key set, at most once per cooldown interval
    async fn refresh_keys(&self) -> Result<()> {
        let mut last = self.last_refresh.lock().await;
        if let Some(at) = *last {
            if at.elapsed() < self.refresh_cooldown {
                return Ok(());
            }
        }
        *last = Some(Instant::now());

        let jwks: JwkSet = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::ServiceUnavailable {
                message: format!("Failed to fetch JWKS from issuer: {}", e),
            })?
            .json()
            .await
            .map_err(|e| AppError::ServiceUnavailable {
                message: format!("Malformed JWKS document: {}", e),
            })?;

        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            if let Some(key) = decoding_key_from_jwk(jwk) {
                keys.insert(jwk.kid.clone(), key);
            }
        }

        tracing::debug!(count = keys.len(), "Refreshed JWKS key set");

        *self.keys.write().await = keys;
        Ok(())
    }
}

/// Build a decoding key from an RSA signing JWK; other key types are skipped
fn decoding_key_from_jwk(jwk: &Jwk) -> Option<DecodingKey> {
    if jwk.kty != "RSA" {
        return None;
    }
    if matches!(jwk.public_key_use.as_deref(), Some(u) if u != "sig") {
        return None;
    }

    let n = jwk.n.as_deref()?;
    let e = jwk.e.as_deref()?;
    DecodingKey::from_rsa_components(n, e).ok()
}

/// Maps an inbound bearer credential to a local user identity,
/// provisioning a local record on first sight.
pub struct IdentityResolver {
    verifier: TokenVerifier,
    repo: Repository,
}

impl IdentityResolver {
    pub fn new(verifier: TokenVerifier, repo: Repository) -> Self {
        Self { verifier, repo }
    }

    /// Verify the token and return the local identity behind it
    pub async fn resolve(&self, token: &str) -> Result<AuthUser> {
        let claims = self.verifier.verify(token).await?;

        let email = claims
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Invalid token payload".to_string(),
            })?;
        if claims.sub.is_empty() {
            return Err(AppError::Unauthorized {
                message: "Invalid token payload".to_string(),
            });
        }

        let user = self
            .repo
            .get_or_create_user(&claims.sub, &email)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Error during user validation/provisioning");
                AppError::Unauthorized {
                    message: "Could not process user".to_string(),
                }
            })?;

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
        })
    }
}

/// Extract a bearer token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<IdentityResolver>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Authorization header must use the Bearer scheme".to_string(),
        })?;

        let resolver = Arc::<IdentityResolver>::from_ref(state);
        resolver.resolve(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("abc.def.ghi"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }

    #[test]
    fn test_jwks_parsing() {
        let doc = r#"{
            "keys": [
                {"kid": "rsa-1", "kty": "RSA", "alg": "RS256", "use": "sig",
                 "n": "sXchTqCn", "e": "AQAB"},
                {"kid": "ec-1", "kty": "EC", "use": "sig"}
            ]
        }"#;

        let jwks: JwkSet = serde_json::from_str(doc).unwrap();
        assert_eq!(jwks.keys.len(), 2);
        assert_eq!(jwks.keys[0].kid, "rsa-1");
        assert_eq!(jwks.keys[0].e.as_deref(), Some("AQAB"));

        // Non-RSA entries never produce a decoding key
        assert!(decoding_key_from_jwk(&jwks.keys[1]).is_none());
    }

    #[test]
    fn test_encryption_keys_are_skipped() {
        let jwk = Jwk {
            kid: "enc-1".to_string(),
            kty: "RSA".to_string(),
            alg: None,
            public_key_use: Some("enc".to_string()),
            n: Some("sXchTqCn".to_string()),
            e: Some("AQAB".to_string()),
        };
        assert!(decoding_key_from_jwk(&jwk).is_none());
    }
}
