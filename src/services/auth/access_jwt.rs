use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation};

use crate::services::auth::bearer::extract_bearer;
use crate::services::auth::claims::AccessTokenClaims;
use crate::services::auth::error::AuthError;
use crate::services::auth::jwks::{JwksCache, JwksPolicy, KeySetSource};
use crate::services::auth::permissions::check_permission;

/// Expected token shape, resolved from `Config` at startup.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub issuer: String,
    pub audience: String,
    // Allow-list; never contains `none` or an HMAC algorithm.
    pub algorithms: Vec<Algorithm>,
    pub leeway_seconds: u64,
    pub jwks_cache_ttl: Duration,
    pub jwks_min_refresh_interval: Duration,
}

/// Access-token verifier backed by the identity provider's key set.
///
/// Stateless per call apart from the shared `JwksCache`.
pub struct AuthService {
    keys: JwksCache,
    validation: Validation,
    algorithms: Vec<Algorithm>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("keys", &self.keys)
            .field("validation", &self.validation)
            .finish()
    }
}

impl AuthService {
    pub fn new(settings: AuthSettings, source: Arc<dyn KeySetSource>) -> Self {
        let primary = settings
            .algorithms
            .first()
            .copied()
            .unwrap_or(Algorithm::RS256);

        let mut validation = Validation::new(primary);
        validation.algorithms = settings.algorithms.clone();
        validation.set_issuer(&[&settings.issuer]);
        validation.set_audience(&[&settings.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = settings.leeway_seconds;

        let policy = JwksPolicy {
            ttl: settings.jwks_cache_ttl,
            min_refresh_interval: settings.jwks_min_refresh_interval,
        };

        Self {
            keys: JwksCache::new(source, policy, settings.algorithms.clone()),
            validation,
            algorithms: settings.algorithms,
        }
    }

    /// Verify a raw credential and decode its claims.
    ///
    /// 1. decode the (unverified) header, require an allowed `alg` and a `kid`
    /// 2. resolve the key for `kid`
    /// 3. verify signature, `exp`, `iss`, `aud`
    pub async fn verify(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AuthError::MalformedHeader(e.to_string()))?;

        if !self.algorithms.contains(&header.alg) {
            return Err(AuthError::MalformedHeader(format!(
                "algorithm {:?} is not allowed",
                header.alg
            )));
        }

        let kid = header
            .kid
            .as_deref()
            .ok_or_else(|| AuthError::MalformedHeader("missing kid".to_string()))?;

        let key = self.keys.resolve(kid).await?;

        let data = jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &self.validation)
            .map_err(classify)?;

        Ok(data.claims)
    }

    /// Full gate: bearer extraction, verification, permission check.
    ///
    /// Returns the verified claims untouched on success.
    pub async fn authorize(
        &self,
        authorization: Option<&HeaderValue>,
        required: &str,
    ) -> Result<AccessTokenClaims, AuthError> {
        let token = extract_bearer(authorization)?;
        let claims = self.verify(token).await?;
        check_permission(&claims, required)?;
        Ok(claims)
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::ImmatureSignature
        | ErrorKind::Json(_) => {
            tracing::debug!(error = %err, "token claims rejected");
            AuthError::InvalidClaims
        }
        _ => {
            tracing::debug!(error = %err, "token signature rejected");
            AuthError::InvalidSignature
        }
    }
}
