/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 認可が必要な route は requires_auth で permission を 1 つだけ宣言する
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{health::health, me::me};
use crate::middleware::auth::requires_auth;
use crate::services::auth::permissions;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/me", requires_auth(permissions::GET_PROFILE, get(me), state))
}
