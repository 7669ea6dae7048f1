/*
 * Responsibility
 * - GET /me の response DTO
 * - 検証済み claims からのみ組み立てる
 */
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::services::auth::AccessTokenClaims;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub subject: Option<String>,
    pub permissions: BTreeSet<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<AccessTokenClaims> for MeResponse {
    fn from(claims: AccessTokenClaims) -> Self {
        let expires_at = claims.expires_at();
        Self {
            success: true,
            subject: claims.sub,
            permissions: claims.permissions.unwrap_or_default(),
            expires_at,
        }
    }
}
