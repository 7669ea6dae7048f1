//! route 単位の認可ゲート (permission 指定)
//!
//! `requires_auth(permission, route, &state)` で 1 つの route を包む:
//! Bearer 抽出 → JWKS で鍵解決 → 署名/claims 検証 → permission チェック
//! 成功時は検証済み claims を `AuthCtx` として extensions に入れ、handler は
//! `AuthCtxExtractor` で受け取る。失敗時は `AppError::Auth` でそのまま返す。
//!
//! 例：
//! ```ignore
//! Router::new()
//!     .route("/drinks", get(list).merge(requires_auth("post:drinks", post(create), &state)))
//!     .route("/drinks/{id}", requires_auth("patch:drinks", patch(update), &state))
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

#[derive(Clone)]
struct Gate {
    auth: Arc<AuthService>,
    permission: &'static str,
}

/// `permission` を持つトークンの時だけ `route` を実行させる
pub fn requires_auth(
    permission: &'static str,
    route: MethodRouter<AppState>,
    state: &AppState,
) -> MethodRouter<AppState> {
    let gate = Gate {
        auth: state.auth.clone(),
        permission,
    };
    // route_layer にしておくと、未定義メソッドは 401 ではなく 405 になる
    route.route_layer(middleware::from_fn_with_state(gate, gate_middleware))
}

async fn gate_middleware(
    State(gate): State<Gate>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = req.headers().get(header::AUTHORIZATION).cloned();

    let claims = match gate
        .auth
        .authorize(authorization.as_ref(), gate.permission)
        .await
    {
        Ok(claims) => claims,
        Err(err) => {
            log_rejection(&err, gate.permission, &req);
            return Err(err.into());
        }
    };

    tracing::debug!(
        permission = gate.permission,
        sub = claims.sub.as_deref().unwrap_or("-"),
        "request authorized"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut()
        .insert(AuthCtx::new(claims, gate.permission));

    Ok(next.run(req).await)
}

fn log_rejection(err: &AuthError, permission: &str, req: &Request<Body>) {
    match err {
        AuthError::KeySetUnavailable(detail) => tracing::error!(
            code = err.code(),
            permission,
            method = %req.method(),
            uri = %req.uri(),
            detail = %detail,
            "authorization aborted: signing keys unavailable"
        ),
        AuthError::KeyNotFound { kid } => tracing::warn!(
            code = err.code(),
            permission,
            method = %req.method(),
            uri = %req.uri(),
            kid = %kid,
            "authorization rejected"
        ),
        _ => tracing::warn!(
            code = err.code(),
            status = err.status().as_u16(),
            permission,
            method = %req.method(),
            uri = %req.uri(),
            "authorization rejected"
        ),
    }
}
