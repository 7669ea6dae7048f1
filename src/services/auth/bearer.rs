//! `Authorization: Bearer <token>` extraction.
use axum::http::HeaderValue;

use crate::services::auth::error::AuthError;

/// Return the raw credential carried by an `Authorization` header value.
///
/// The value must be exactly two whitespace separated parts, the first being
/// `Bearer` (ASCII case-insensitive). The second part is returned as-is.
pub fn extract_bearer(authorization: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = authorization.ok_or(AuthError::AuthHeaderMissing)?;
    let value = value.to_str().map_err(|_| AuthError::AuthHeaderMalformed)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::AuthHeaderMalformed),
    }
}
