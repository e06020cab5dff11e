use crate::models::Principal;
use crate::utils::error::AppError;
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const DEFAULT_KEYS_MAX_AGE: Duration = Duration::from_secs(3600);
const MIN_KEYS_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

/// Turns a bearer token into a verified principal.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Principal, AppError>;
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AppError> {
    let header = header
        .ok_or_else(|| AppError::Unauthenticated("Missing authorization token".to_string()))?;

    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("Bearer") => Ok(token),
        _ => Err(AppError::Unauthenticated("Invalid token format".to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
}

impl TryFrom<IdTokenClaims> for Principal {
    type Error = AppError;

    fn try_from(claims: IdTokenClaims) -> Result<Self, Self::Error> {
        if claims.sub.trim().is_empty() {
            return Err(AppError::Unauthenticated("Token has no subject".to_string()));
        }
        let email = claims
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| AppError::Unauthenticated("Token carries no email".to_string()))?;

        Ok(Principal {
            uid: claims.sub,
            email,
        })
    }
}

// ==================== FIREBASE ====================

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
    max_age: Duration,
}

impl CachedKeys {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.max_age
    }

    /// An unknown kid only justifies a refetch once the set is stale or past the minimum interval.
    fn may_refetch(&self) -> bool {
        !self.is_fresh() || self.fetched_at.elapsed() >= MIN_KEYS_REFETCH_INTERVAL
    }
}

/// Verifies Firebase ID tokens against Google's published signing keys.
pub struct FirebaseVerifier {
    project_id: String,
    keys_url: String,
    http: reqwest::Client,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(project_id: impl Into<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            project_id: project_id.into(),
            keys_url: GOOGLE_JWKS_URL.to_string(),
            http,
            keys: RwLock::new(None),
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "aud", "iss"]);
        validation
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AppError> {
        {
            let cached = self.keys.read().await;
            if let Some(keys) = cached.as_ref() {
                if keys.is_fresh() {
                    if let Some(jwk) = keys.set.find(kid) {
                        return DecodingKey::from_jwk(jwk).map_err(|e| {
                            AppError::Unauthenticated(format!("Unusable signing key: {}", e))
                        });
                    }
                }
                if !keys.may_refetch() {
                    return Err(AppError::Unauthenticated(format!("Unknown signing key: {}", kid)));
                }
            }
        }

        // Unknown kid or stale set: Google rotates keys, refetch once.
        let fresh = self.fetch_keys().await?;
        let key = fresh
            .set
            .find(kid)
            .ok_or_else(|| AppError::Unauthenticated(format!("Unknown signing key: {}", kid)))
            .and_then(|jwk| {
                DecodingKey::from_jwk(jwk)
                    .map_err(|e| AppError::Unauthenticated(format!("Unusable signing key: {}", e)))
            });
        *self.keys.write().await = Some(fresh);
        key
    }

    async fn fetch_keys(&self) -> Result<CachedKeys, AppError> {
        log::debug!("🔑 Fetching identity provider signing keys");

        let response = self
            .http
            .get(&self.keys_url)
            .send()
            .await
            .map_err(|e| AppError::Unauthenticated(format!("Failed to fetch signing keys: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthenticated(format!(
                "Signing key endpoint returned {}",
                response.status()
            )));
        }

        let max_age = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_KEYS_MAX_AGE);

        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| AppError::Unauthenticated(format!("Failed to parse signing keys: {}", e)))?;

        Ok(CachedKeys {
            set,
            fetched_at: Instant::now(),
            max_age,
        })
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AppError> {
        let header = decode_header(token)
            .map_err(|e| AppError::Unauthenticated(format!("Malformed token: {}", e)))?;
        if header.alg != Algorithm::RS256 {
            return Err(AppError::Unauthenticated(format!("Unexpected algorithm {:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthenticated("Token has no key id".to_string()))?;

        let key = self.key_for(&kid).await?;
        let data = decode::<IdTokenClaims>(token, &key, &self.validation())
            .map_err(|e| AppError::Unauthenticated(format!("Invalid token: {}", e)))?;

        Principal::try_from(data.claims)
    }
}

fn parse_max_age(cache_control: &str) -> Option<Duration> {
    cache_control
        .split(',')
        .find_map(|directive| directive.trim().strip_prefix("max-age="))
        .and_then(|seconds| seconds.parse::<u64>().ok())
        .map(Duration::from_secs)
}

// ==================== SHARED SECRET ====================

/// HS256 tokens signed with `JWT_SECRET`; used for local runs and tests.
pub struct SharedSecretVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SharedSecretVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AppError> {
        let data = decode::<IdTokenClaims>(token, &self.key, &self.validation)
            .map_err(|e| AppError::Unauthenticated(format!("Invalid token: {}", e)))?;

        Principal::try_from(data.claims)
    }
}
