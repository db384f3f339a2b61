// ==================== IDENTITY VERIFICATION ====================
// Firebase ID tokens are RS256 JWTs signed by Google's securetoken service
// account. Verification checks the signature against Google's published JWK
// set, plus the audience (project id) and issuer claims.

use crate::middleware::auth::DecodedUser;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::env;
use std::sync::RwLock;
use std::time::{Duration, Instant};

const SECURE_TOKEN_JWK_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const DEFAULT_KEY_TTL: Duration = Duration::from_secs(3600);

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies a bearer token and returns the identity it asserts.
    async fn verify_id_token(&self, token: &str) -> Result<DecodedUser, String>;
}

#[derive(Debug, Deserialize)]
struct ServiceAccount {
    project_id: String,
}

#[derive(Debug, Deserialize, Clone)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

struct CachedKeys {
    keys: HashMap<String, Jwk>,
    fetched_at: Instant,
    ttl: Duration,
}

impl CachedKeys {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }
}

/// Claims of a Firebase ID token. Only the fields the service reads; the
/// signature/aud/iss/exp checks are done by the JWT library.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    email: Option<String>,
}

pub struct FirebaseVerifier {
    project_id: String,
    http: reqwest::Client,
    keys: RwLock<Option<CachedKeys>>,
}

/// FIREBASE_SERVICE_ACCOUNT may hold the service-account JSON directly or a
/// base64 encoding of it (the usual form in container environments).
fn parse_service_account(raw: &str) -> Result<ServiceAccount, String> {
    let trimmed = raw.trim();

    let json = if trimmed.starts_with('{') {
        trimmed.to_string()
    } else {
        let decoded = general_purpose::STANDARD
            .decode(trimmed)
            .map_err(|e| format!("Service account is neither JSON nor base64: {}", e))?;
        String::from_utf8(decoded)
            .map_err(|e| format!("Service account is not valid UTF-8: {}", e))?
    };

    serde_json::from_str(&json).map_err(|e| format!("Failed to parse service account: {}", e))
}

/// Extracts max-age from a Cache-Control header value.
fn key_ttl(cache_control: Option<&str>) -> Duration {
    cache_control
        .and_then(|value| {
            value.split(',').find_map(|part| {
                part.trim()
                    .strip_prefix("max-age=")
                    .and_then(|secs| secs.parse::<u64>().ok())
            })
        })
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_KEY_TTL)
}

impl FirebaseVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            http: reqwest::Client::new(),
            keys: RwLock::new(None),
        }
    }

    pub fn from_env() -> Result<Self, String> {
        let raw = env::var("FIREBASE_SERVICE_ACCOUNT")
            .map_err(|_| "FIREBASE_SERVICE_ACCOUNT not found in environment".to_string())?;

        let account = parse_service_account(&raw)?;

        log::info!("🔐 Identity verifier ready for project {}", account.project_id);

        Ok(Self::new(account.project_id))
    }

    fn cached_key(&self, kid: &str) -> Option<Jwk> {
        let guard = self.keys.read().ok()?;
        let cached = guard.as_ref()?;
        if cached.is_fresh() {
            cached.keys.get(kid).cloned()
        } else {
            None
        }
    }

    async fn fetch_keys(&self) -> Result<CachedKeys, String> {
        log::debug!("🔑 Refreshing securetoken JWK set");

        let response = self
            .http
            .get(SECURE_TOKEN_JWK_URL)
            .send()
            .await
            .map_err(|e| format!("Failed to fetch signing keys: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "Signing-key endpoint returned {}",
                response.status()
            ));
        }

        let ttl = key_ttl(
            response
                .headers()
                .get(reqwest::header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
        );

        let jwk_set: JwkSet = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse signing keys: {}", e))?;

        let keys = jwk_set
            .keys
            .into_iter()
            .map(|jwk| (jwk.kid.clone(), jwk))
            .collect();

        Ok(CachedKeys {
            keys,
            fetched_at: Instant::now(),
            ttl,
        })
    }

    async fn key_for(&self, kid: &str) -> Result<Jwk, String> {
        if let Some(jwk) = self.cached_key(kid) {
            return Ok(jwk);
        }

        let fetched = self.fetch_keys().await?;
        let jwk = fetched.keys.get(kid).cloned();

        if let Ok(mut guard) = self.keys.write() {
            *guard = Some(fetched);
        }

        jwk.ok_or_else(|| format!("No signing key matches kid {}", kid))
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify_id_token(&self, token: &str) -> Result<DecodedUser, String> {
        let header = decode_header(token).map_err(|e| format!("Invalid token header: {}", e))?;
        let kid = header
            .kid
            .ok_or_else(|| "Token header has no key id".to_string())?;

        let jwk = self.key_for(&kid).await?;
        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| format!("Invalid signing key: {}", e))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.clone()]);

        let mut issuers = HashSet::new();
        issuers.insert(format!(
            "https://securetoken.google.com/{}",
            self.project_id
        ));
        validation.iss = Some(issuers);

        let data = decode::<IdTokenClaims>(token, &decoding_key, &validation)
            .map_err(|e| format!("Token verification failed: {}", e))?;

        let email = data
            .claims
            .email
            .ok_or_else(|| "Token carries no email claim".to_string())?;

        Ok(DecodedUser { email })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT_JSON: &str =
        r#"{ "type": "service_account", "project_id": "fovia-doctor", "client_email": "svc@fovia-doctor.iam.gserviceaccount.com" }"#;

    #[test]
    fn parses_a_raw_json_service_account() {
        let account = parse_service_account(ACCOUNT_JSON).unwrap();
        assert_eq!(account.project_id, "fovia-doctor");
    }

    #[test]
    fn parses_a_base64_encoded_service_account() {
        let encoded = general_purpose::STANDARD.encode(ACCOUNT_JSON);
        let account = parse_service_account(&encoded).unwrap();
        assert_eq!(account.project_id, "fovia-doctor");
    }

    #[test]
    fn rejects_a_credential_that_is_neither_json_nor_base64() {
        assert!(parse_service_account("not a credential !!").is_err());
    }

    #[test]
    fn key_ttl_honors_max_age() {
        let ttl = key_ttl(Some("public, max-age=19302, must-revalidate, no-transform"));
        assert_eq!(ttl, Duration::from_secs(19302));
    }

    #[test]
    fn key_ttl_falls_back_without_a_header() {
        assert_eq!(key_ttl(None), DEFAULT_KEY_TTL);
        assert_eq!(key_ttl(Some("no-store")), DEFAULT_KEY_TTL);
    }

    #[tokio::test]
    async fn malformed_tokens_fail_before_any_network_call() {
        let verifier = FirebaseVerifier::new("fovia-doctor");
        let result = verifier.verify_id_token("definitely-not-a-jwt").await;
        assert!(result.is_err());
    }
}
