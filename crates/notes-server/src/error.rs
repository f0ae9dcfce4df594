//! API error types with JSON responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use notes_core::{FieldError, ValidationError};
use notes_store::StoreError;

use crate::auth::AuthError;
use crate::service::NotesError;

/// API error that can be returned from handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No bearer token (401).
    #[error("missing bearer credential")]
    MissingCredential,

    /// Token rejected (401).
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// Identity provider unreachable (503).
    #[error("identity provider unavailable")]
    ProviderUnavailable(String),

    /// Field-level validation failure (422).
    #[error("request validation failed")]
    Validation(Vec<FieldError>),

    /// Update body with no fields (422).
    #[error("update must set at least one field")]
    EmptyUpdate,

    /// Body is not JSON, or not an object (400).
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// Bad `page` / `page_size` (400).
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),

    /// Body over the size limit (413).
    #[error("request body too large: {0}")]
    PayloadTooLarge(String),

    /// Not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Known path, unsupported method (405).
    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    /// Document store unreachable (503).
    #[error("document store unavailable")]
    StoreUnavailable(String),

    /// Internal server error (500).
    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    /// Get the error code string for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::InvalidCredential(_) => "INVALID_CREDENTIAL",
            Self::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::EmptyUpdate => "EMPTY_UPDATE",
            Self::MalformedBody(_) => "MALFORMED_BODY",
            Self::InvalidPagination(_) => "INVALID_PAGINATION",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredential | Self::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            Self::ProviderUnavailable(_) | Self::StoreUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Validation(_) | Self::EmptyUpdate => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MalformedBody(_) | Self::InvalidPagination(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        match self {
            Self::ProviderUnavailable(detail) | Self::StoreUnavailable(detail) => {
                tracing::error!(code = self.code(), detail = %detail, "Upstream unavailable");
            }
            Self::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
            }
            _ => tracing::debug!(code = self.code(), error = %self, "Request rejected"),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorDetails,
}

/// Error details within the response.
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    /// Error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Offending fields, for validation errors only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let challenge = match &self {
            Self::MissingCredential => Some(HeaderValue::from_static("Bearer")),
            Self::InvalidCredential(_) => {
                Some(HeaderValue::from_static(r#"Bearer error="invalid_token""#))
            }
            _ => None,
        };
        let message = self.to_string();
        let code = self.code().to_string();
        let details = match self {
            Self::Validation(fields) => Some(fields),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(challenge) = challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, challenge);
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential => Self::MissingCredential,
            AuthError::InvalidCredential(reason) => Self::InvalidCredential(reason),
            AuthError::ProviderUnavailable(reason) => Self::ProviderUnavailable(reason),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::NotAnObject => {
                Self::MalformedBody("request body must be a JSON object".into())
            }
            ValidationError::EmptyUpdate => Self::EmptyUpdate,
            ValidationError::Fields(fields) => Self::Validation(fields),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_unavailable() {
            return Self::StoreUnavailable(err.to_string());
        }
        match err {
            StoreError::DocumentNotFound { id, .. } => Self::NotFound(format!("note {id}")),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<NotesError> for ApiError {
    fn from(err: NotesError) -> Self {
        match err {
            NotesError::InvalidPagination(reason) => Self::InvalidPagination(reason),
            NotesError::NotFound(id) => Self::NotFound(format!("note {id}")),
            NotesError::Store(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(rejection.body_text())
        } else {
            Self::MalformedBody(rejection.body_text())
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use notes_core::NoteId;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::MissingCredential.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::InvalidCredential("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::ProviderUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Validation(vec![]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::InvalidPagination("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::MethodNotAllowed("PATCH".into()).status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ApiError::PayloadTooLarge("x".into()).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::StoreUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let err = ApiError::Validation(vec![FieldError::new("color", "format", "bad color")]);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"][0]["field"], "color");
        assert_eq!(body["error"]["details"][0]["rule"], "format");
    }

    #[tokio::test]
    async fn test_unauthorized_sets_challenge() {
        let response = ApiError::MissingCredential.into_response();
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "MISSING_CREDENTIAL");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError::Internal("connection string leaked".into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "internal server error");
    }

    #[test]
    fn test_store_error_mapping() {
        let unavailable: ApiError = StoreError::Unavailable("down".into()).into();
        assert_eq!(unavailable.code(), "STORE_UNAVAILABLE");

        let corrupt: ApiError = StoreError::CorruptDocument {
            id: "x".into(),
            reason: "missing title".into(),
        }
        .into();
        assert_eq!(corrupt.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_notes_error_mapping() {
        let err: ApiError = NotesError::NotFound(NoteId::new("abc")).into();
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "not found: note abc");

        let err: ApiError = ValidationError::EmptyUpdate.into();
        assert_eq!(err.code(), "EMPTY_UPDATE");
    }
}
