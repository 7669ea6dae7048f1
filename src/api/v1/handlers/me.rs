/*
 * Responsibility
 * - GET /me: 検証済みトークンの持ち主を返す
 * - claims は AuthCtxExtractor 経由でのみ受け取る (requires_auth が格納)
 */
use axum::Json;

use crate::api::v1::{dto::me::MeResponse, extractors::AuthCtxExtractor};

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse::from(ctx.claims))
}
