/*
 * Responsibility
 * - middleware 層の公開インターフェース
 * - auth::requires_auth は route 単位、cors / http / security_headers は Router 全体に掛ける
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
