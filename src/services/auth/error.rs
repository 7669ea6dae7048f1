//! Authorization failures raised by the gate.
//!
//! Every variant maps to exactly one HTTP status and one log code.
//! The boundary (`crate::error::AppError`) renders them as
//! `{"success": false, "code": <status>, "description": ...}`.
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    AuthHeaderMissing,

    #[error("Authorization header must be in the form 'Bearer <token>'.")]
    AuthHeaderMalformed,

    #[error("Unable to parse authentication token header: {0}")]
    MalformedHeader(String),

    #[error("Unable to find the appropriate key.")]
    KeyNotFound { kid: String },

    #[error("Token signature could not be verified.")]
    InvalidSignature,

    #[error("Token expired.")]
    TokenExpired,

    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims,

    #[error("Permissions not included in token.")]
    PermissionsMissingInToken,

    #[error("Permission not found.")]
    Forbidden { required: String },

    // The key endpoint could not be reached or returned garbage.
    #[error("Signing keys are currently unavailable.")]
    KeySetUnavailable(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::PermissionsMissingInToken => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::KeySetUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable name for rejection logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthHeaderMissing => "authorization_header_missing",
            Self::AuthHeaderMalformed => "invalid_authorization_header",
            Self::MalformedHeader(_) => "invalid_token_header",
            Self::KeyNotFound { .. } => "key_not_found",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::InvalidClaims => "invalid_claims",
            Self::PermissionsMissingInToken => "permissions_missing",
            Self::Forbidden { .. } => "forbidden",
            Self::KeySetUnavailable(_) => "key_set_unavailable",
        }
    }

    /// Human readable text sent to the client.
    ///
    /// Internal detail (fetch errors, key ids) stays in the logs.
    pub fn description(&self) -> String {
        match self {
            Self::MalformedHeader(_) => "Unable to parse authentication token header.".to_string(),
            _ => self.to_string(),
        }
    }
}
