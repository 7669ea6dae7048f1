/*
 * Responsibility
 * - request extensions から AuthCtx を取り出す FromRequestParts 実装
 * - 見つからない場合は配線ミス (requires_auth を通っていない) として 500
 */
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::AuthCtx;

/// `requires_auth` が格納した `AuthCtx` を handler で受け取るための extractor
pub struct AuthCtxExtractor(pub AuthCtx);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthCtx>()
            .cloned()
            .map(AuthCtxExtractor)
            .ok_or_else(|| {
                tracing::error!(uri = %parts.uri, "AuthCtx missing: route is not behind requires_auth");
                AppError::Internal
            })
    }
}
