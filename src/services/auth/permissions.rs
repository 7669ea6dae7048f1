//! Permission scopes and the check applied after a token is verified.
use crate::services::auth::claims::AccessTokenClaims;
use crate::services::auth::error::AuthError;

pub const GET_PROFILE: &str = "get:profile";

/// Confirm that `required` is granted by the verified claims.
///
/// - no `permissions` claim at all => `PermissionsMissingInToken` (400)
/// - claim present without `required` => `Forbidden` (403)
///
/// Matching is exact and case-sensitive.
pub fn check_permission(claims: &AccessTokenClaims, required: &str) -> Result<(), AuthError> {
    let granted = claims
        .permissions
        .as_ref()
        .ok_or(AuthError::PermissionsMissingInToken)?;

    if granted.contains(required) {
        Ok(())
    } else {
        Err(AuthError::Forbidden {
            required: required.to_string(),
        })
    }
}
