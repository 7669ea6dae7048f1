/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT 検証や JWKS の解決は middleware/services 側の責務
 */
use crate::services::auth::AccessTokenClaims;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `claims` は decode したものをそのまま渡す
/// - `permission` は route が要求し、トークンが満たした permission
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub claims: AccessTokenClaims,
    pub permission: &'static str,
}

impl AuthCtx {
    pub fn new(claims: AccessTokenClaims, permission: &'static str) -> Self {
        Self { claims, permission }
    }
}
