//! Error types for formshield

use axum::response::{IntoResponse, Response};
use axum::Json;
use formshield_csrf::CsrfError;
use formshield_validate::{FormDataError, ValidationErrors};
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for formshield operations
pub type Result<T, E = ShieldError> = std::result::Result<T, E>;

/// Errors from attaching the extension or constructing a form.
///
/// Most variants are programming or request-shape errors. Failed field
/// rules and CSRF checks are recorded on the form by `ShieldForm::validate`;
/// they only become [`ShieldError::Validation`] through
/// `ShieldForm::validate_or_reject`.
#[derive(Debug, Error)]
pub enum ShieldError {
    /// `init_app` was called more than once on the same extension.
    #[error("FormShield can only be initialized with an application once")]
    AlreadyInitialized,

    /// A form was constructed through an extension never attached to an app.
    #[error("FormShield is not attached to an application; call init_app first")]
    NotInitialized,

    /// CSRF is enabled but no secret key is configured.
    #[error("a secret key is required when CSRF protection is enabled")]
    MissingSecretKey,

    /// The session accessor returned no session for the request.
    #[error("no session available to store the CSRF token")]
    MissingCsrfContext,

    /// A declared field uses the name reserved for the CSRF token field.
    #[error("field `{0}` collides with the CSRF token field name")]
    CsrfFieldCollision(String),

    /// Token issuance failed.
    #[error(transparent)]
    Csrf(CsrfError),

    /// The request body is not valid form data.
    #[error(transparent)]
    InvalidBody(#[from] FormDataError),

    /// The request body could not be read.
    #[error("failed to read request body: {0}")]
    Body(String),

    /// The request body is larger than the extractor accepts.
    #[error("request body exceeds limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The submitted form failed validation.
    #[error("{0}")]
    Validation(ValidationErrors),
}

impl From<CsrfError> for ShieldError {
    fn from(err: CsrfError) -> Self {
        match err {
            CsrfError::MissingSecretKey => ShieldError::MissingSecretKey,
            other => ShieldError::Csrf(other),
        }
    }
}

impl ShieldError {
    /// HTTP status used when the error reaches a client.
    pub fn status(&self) -> StatusCode {
        match self {
            ShieldError::InvalidBody(_) | ShieldError::Body(_) => StatusCode::BAD_REQUEST,
            ShieldError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ShieldError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            ShieldError::AlreadyInitialized => "already_initialized",
            ShieldError::NotInitialized => "not_initialized",
            ShieldError::MissingSecretKey => "missing_secret_key",
            ShieldError::MissingCsrfContext => "missing_csrf_context",
            ShieldError::CsrfFieldCollision(_) => "csrf_field_collision",
            ShieldError::Csrf(_) => "csrf_error",
            ShieldError::InvalidBody(_) | ShieldError::Body(_) => "bad_request",
            ShieldError::PayloadTooLarge { .. } => "payload_too_large",
            ShieldError::Validation(_) => "validation_error",
        }
    }
}

/// JSON representation of an error response
#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    error_type: &'static str,
    message: String,
}

impl IntoResponse for ShieldError {
    fn into_response(self) -> Response {
        if let ShieldError::Validation(errors) = &self {
            return (self.status(), Json(errors.to_response_body())).into_response();
        }

        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "form construction failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                error_type: self.error_type(),
                // Server-side details stay in the log.
                message: if status.is_server_error() {
                    "Internal server error".to_string()
                } else {
                    self.to_string()
                },
            },
        };
        (status, Json(body)).into_response()
    }
}
