//! Request extractors: the authenticated caller and JSON bodies.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde_json::Value;

use crate::auth::{AuthError, UserIdentity};
use crate::error::ApiError;
use crate::state::AppState;

/// The caller, verified from `Authorization: Bearer <token>`.
///
/// Rejects with `MissingCredential` when the header is absent or the token
/// is blank, `InvalidCredential` when the header or token is bad, and
/// `ProviderUnavailable` when the identity provider cannot be reached.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserIdentity);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() || has_blank_bearer(parts) {
                        ApiError::MissingCredential
                    } else {
                        tracing::warn!("Rejected malformed Authorization header");
                        ApiError::InvalidCredential(
                            "expected Authorization: Bearer <token>".into(),
                        )
                    }
                })?;

        let token = bearer.token().trim();
        if token.is_empty() {
            return Err(ApiError::MissingCredential);
        }

        tracing::debug!(token_len = token.len(), "Verifying bearer token");
        let identity = state
            .verifier()
            .verify_token(token)
            .await
            .inspect_err(|e| match e {
                AuthError::ProviderUnavailable(_) => {}
                _ => tracing::warn!(error = %e, "Rejected bearer token"),
            })?;

        Ok(Self(identity))
    }
}

/// `Authorization: Bearer` with nothing after the scheme.
fn has_blank_bearer(parts: &Parts) -> bool {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("bearer"))
}

/// A JSON request body, left as a [`Value`] for the schema layer to check.
///
/// Bodies that are not JSON are rejected as `MalformedBody`.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
