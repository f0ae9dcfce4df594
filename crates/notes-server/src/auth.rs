//! Bearer token verification.
//!
//! Every note request carries an ID token issued by an external identity
//! provider. A [`TokenVerifier`] turns that token into a [`UserIdentity`];
//! nothing is cached per session, so every request is verified again.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation};
use serde::Deserialize;

use notes_core::UserId;

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// Stable identifier from the token's `sub` claim. Owns every note the
    /// caller creates.
    pub user_id: UserId,
    /// Email address, when the provider includes one.
    pub email: Option<String>,
}

/// Why a credential was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No bearer token was supplied, or it was blank.
    #[error("missing bearer credential")]
    MissingCredential,

    /// The token is malformed, expired, or not signed by the provider.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The identity provider could not be reached.
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

/// Verifies bearer tokens.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` and return the identity it asserts.
    async fn verify_token(&self, token: &str) -> Result<UserIdentity, AuthError>;
}

/// Claims read from an ID token.
#[derive(Debug, Deserialize)]
pub struct Claims {
    /// Subject: the provider's user id.
    pub sub: String,
    /// Issued-at, seconds since the epoch.
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Clock skew tolerated on `exp`, `nbf` and `iat`, in seconds.
pub const LEEWAY_SECONDS: u64 = 60;

/// Validation rules shared by every verifier.
///
/// `exp` is always required. `iss` and `aud` are required and checked only
/// when configured.
pub(crate) fn build_validation(
    algorithm: Algorithm,
    issuer: Option<&str>,
    audience: Option<&str>,
) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.leeway = LEEWAY_SECONDS;
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let mut required = vec!["exp", "sub"];
    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
        required.push("iss");
    }
    match audience {
        Some(audience) => {
            validation.set_audience(&[audience]);
            required.push("aud");
        }
        None => validation.validate_aud = false,
    }
    validation.set_required_spec_claims(&required);
    validation
}

/// Decode and check a token with an already-resolved key.
pub(crate) fn decode_identity(
    token: &str,
    key: &DecodingKey,
    validation: &Validation,
) -> Result<UserIdentity, AuthError> {
    let data: TokenData<Claims> = jsonwebtoken::decode(token, key, validation).map_err(|e| {
        tracing::debug!(error = %e, "Token validation failed");
        AuthError::InvalidCredential(e.to_string())
    })?;
    identity_from_claims(data.claims, chrono::Utc::now().timestamp())
}

fn identity_from_claims(claims: Claims, now: i64) -> Result<UserIdentity, AuthError> {
    if claims.sub.trim().is_empty() {
        return Err(AuthError::InvalidCredential("token has an empty subject".into()));
    }
    if let Some(iat) = claims.iat {
        if iat > now + LEEWAY_SECONDS as i64 {
            return Err(AuthError::InvalidCredential("token issued in the future".into()));
        }
    }

    Ok(UserIdentity {
        user_id: UserId::new(claims.sub),
        email: claims.email,
    })
}

/// Verifies HS256 tokens signed with a shared secret.
///
/// For development and tests, where no identity provider is available.
pub struct SharedSecretVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SharedSecretVerifier {
    pub fn new(secret: &str, issuer: Option<&str>, audience: Option<&str>) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: build_validation(Algorithm::HS256, issuer, audience),
        }
    }
}

impl std::fmt::Debug for SharedSecretVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretVerifier").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenVerifier for SharedSecretVerifier {
    async fn verify_token(&self, token: &str) -> Result<UserIdentity, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingCredential);
        }
        decode_identity(token, &self.key, &self.validation)
    }
}
