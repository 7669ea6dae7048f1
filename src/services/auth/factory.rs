//! Factory: build `AuthService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::AuthService;
use crate::services::auth::jwks::HttpKeySetSource;

pub fn build_auth_service(config: &Config) -> Result<Arc<AuthService>, AppError> {
    let source = HttpKeySetSource::new(config.auth_jwks_url.clone(), config.jwks_fetch_timeout)
        .map_err(|e| {
            tracing::error!(error = %e, "failed to build JWKS http client");
            AppError::Internal
        })?;

    tracing::info!(
        issuer = %config.auth_issuer,
        audience = %config.auth_audience,
        jwks_url = %config.auth_jwks_url,
        "access token verification configured"
    );

    let auth = AuthService::new(config.auth_settings(), Arc::new(source));

    Ok(Arc::new(auth))
}
