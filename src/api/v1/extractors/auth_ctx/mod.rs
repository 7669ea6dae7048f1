/**
 * Responsibility
 *  - core と types を束ねる
 *  - handler には検証済みコンテキスト (AuthCtx) を引数として明示的に渡す
 *
 * 公開するもの
 *  - AuthCtx
 *  - AuthCtxExtractor
 */

mod core;
mod types;

pub use self::core::AuthCtxExtractor;
pub use self::types::AuthCtx;
