//! Verification against an identity provider's published key set.
//!
//! Keys are fetched from the provider's JWKS endpoint and reused until the
//! cache TTL runs out. A token signed with a key id we have not seen causes
//! one early refetch, rate-limited so a stream of bogus tokens cannot turn
//! into a stream of provider requests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use tokio::sync::RwLock;

use crate::auth::{AuthError, TokenVerifier, UserIdentity, build_validation, decode_identity};

/// Shortest gap between refetches triggered by unknown key ids.
pub const DEFAULT_MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

struct CachedKeys {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Verifies RS256 tokens with keys from a JWKS endpoint.
pub struct JwksVerifier {
    client: reqwest::Client,
    jwks_url: String,
    validation: Validation,
    cache_ttl: Duration,
    min_refetch_interval: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl JwksVerifier {
    pub fn new(
        jwks_url: impl Into<String>,
        issuer: Option<&str>,
        audience: Option<&str>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            jwks_url: jwks_url.into(),
            validation: build_validation(Algorithm::RS256, issuer, audience),
            cache_ttl,
            min_refetch_interval: DEFAULT_MIN_REFETCH_INTERVAL,
            cache: RwLock::new(None),
        }
    }

    /// Override how soon an unknown key id may trigger another fetch.
    pub fn with_min_refetch_interval(mut self, interval: Duration) -> Self {
        self.min_refetch_interval = interval;
        self
    }

    /// The key set, from cache when it is younger than `max_age`.
    async fn keys(&self, max_age: Duration) -> Result<Arc<JwkSet>, AuthError> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.fetched_at.elapsed() < max_age {
                return Ok(Arc::clone(&cached.keys));
            }
        }

        let keys = Arc::new(self.fetch_keys().await?);
        *self.cache.write().await = Some(CachedKeys {
            keys: Arc::clone(&keys),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        tracing::debug!(url = %self.jwks_url, "Fetching identity provider keys");

        let unavailable = |e: reqwest::Error| {
            tracing::error!(url = %self.jwks_url, error = %e, "Key set fetch failed");
            AuthError::ProviderUnavailable(e.to_string())
        };

        let keys: JwkSet = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(unavailable)?
            .json()
            .await
            .map_err(unavailable)?;

        tracing::info!(count = keys.keys.len(), "Loaded identity provider keys");
        Ok(keys)
    }
}

impl std::fmt::Debug for JwksVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksVerifier")
            .field("jwks_url", &self.jwks_url)
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify_token(&self, token: &str) -> Result<UserIdentity, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidCredential(format!(
                "unsupported signing algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidCredential("token has no key id".into()))?;

        let mut keys = self.keys(self.cache_ttl).await?;
        if keys.find(&kid).is_none() {
            tracing::debug!(kid = %kid, "Unknown key id, refreshing key set");
            keys = self.keys(self.min_refetch_interval).await?;
        }
        let jwk = keys
            .find(&kid)
            .ok_or_else(|| AuthError::InvalidCredential(format!("unknown key id {kid}")))?;

        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| AuthError::InvalidCredential(format!("unusable key {kid}: {e}")))?;
        decode_identity(token, &key, &self.validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Router, http::StatusCode, routing::get};
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    const JWKS_FIXTURE: &str = include_str!("../tests/fixtures/jwks.json");
    const PRIVATE_KEY_PEM: &[u8] = include_bytes!("../tests/fixtures/jwt_rsa_private.pem");
    const KID: &str = "notes-test-key";

    /// Serve the fixture key set with `status`, counting requests.
    async fn serve_jwks(status: StatusCode) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/jwks",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (
                        status,
                        [(http::header::CONTENT_TYPE, "application/json")],
                        JWKS_FIXTURE,
                    )
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/jwks"), hits)
    }

    fn mint(kid: &str, claims: serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM).unwrap();
        jsonwebtoken::encode(&header, &claims, &key).unwrap()
    }

    fn claims(sub: &str) -> serde_json::Value {
        let now = chrono::Utc::now().timestamp();
        json!({
            "sub": sub,
            "iss": "https://issuer.test/notes",
            "aud": "notes-test",
            "iat": now,
            "exp": now + 600,
        })
    }

    fn verifier(url: &str) -> JwksVerifier {
        JwksVerifier::new(
            url,
            Some("https://issuer.test/notes"),
            Some("notes-test"),
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn test_valid_token_and_cached_keys() {
        let (url, hits) = serve_jwks(StatusCode::OK).await;
        let verifier = verifier(&url);

        let identity = verifier.verify_token(&mint(KID, claims("alice"))).await.unwrap();
        assert_eq!(identity.user_id.as_str(), "alice");

        verifier.verify_token(&mint(KID, claims("bob"))).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_kid_refetches_once() {
        let (url, hits) = serve_jwks(StatusCode::OK).await;
        let verifier = verifier(&url).with_min_refetch_interval(Duration::ZERO);

        let err = verifier
            .verify_token(&mint("rotated-key", claims("alice")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_kid_refetch_is_rate_limited() {
        let (url, hits) = serve_jwks(StatusCode::OK).await;
        let verifier = verifier(&url);

        for _ in 0..3 {
            let _ = verifier.verify_token(&mint("rotated-key", claims("a"))).await;
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wrong_audience_rejected() {
        let (url, _) = serve_jwks(StatusCode::OK).await;
        let mut bad = claims("alice");
        bad["aud"] = json!("someone-else");
        let err = verifier(&url).verify_token(&mint(KID, bad)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (url, _) = serve_jwks(StatusCode::OK).await;
        let mut expired = claims("alice");
        expired["exp"] = json!(chrono::Utc::now().timestamp() - 3600);
        let err = verifier(&url).verify_token(&mint(KID, expired)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_hs256_token_rejected_without_fetch() {
        let (url, hits) = serve_jwks(StatusCode::OK).await;
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims("alice"),
            &EncodingKey::from_secret(b"guess"),
        )
        .unwrap();

        let err = verifier(&url).verify_token(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_error_status_is_unavailable() {
        let (url, _) = serve_jwks(StatusCode::INTERNAL_SERVER_ERROR).await;
        let err = verifier(&url)
            .verify_token(&mint(KID, claims("alice")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_unavailable() {
        let err = verifier("http://127.0.0.1:1/jwks")
            .verify_token(&mint(KID, claims("alice")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ProviderUnavailable(_)));
    }
}
