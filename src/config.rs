/*
 * Responsibility
 * - 環境変数 (.env は dotenvy) から設定を読み込む
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 * - IdP のドメインから issuer / JWKS エンドポイントを導出
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

use crate::services::auth::access_jwt::AuthSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,

    pub auth_issuer: String,
    pub auth_audience: String,
    pub auth_jwks_url: Url,
    pub auth_algorithms: Vec<Algorithm>,
    pub access_token_leeway_seconds: u64,

    pub jwks_cache_ttl: Duration,
    pub jwks_min_refresh_interval: Duration,
    pub jwks_fetch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `var` は環境変数の代わり (テストでは HashMap を渡す)
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = match var("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 5000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(&var("APP_ENV").unwrap_or_default());

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let request_timeout = Duration::from_secs(seconds(&var, "REQUEST_TIMEOUT_SECONDS", 30)?);

        // AUTH_ISSUER が優先。無ければ AUTH0_DOMAIN から https://<domain>/
        let auth_issuer = match var("AUTH_ISSUER") {
            Some(issuer) => issuer,
            None => var("AUTH0_DOMAIN")
                .as_deref()
                .map(issuer_for_domain)
                .ok_or(ConfigError::Missing("AUTH_ISSUER"))?,
        };

        let auth_audience = var("AUTH_AUDIENCE").ok_or(ConfigError::Missing("AUTH_AUDIENCE"))?;

        let auth_jwks_url = match var("AUTH_JWKS_URL") {
            Some(url) => Url::parse(&url).map_err(|_| ConfigError::Invalid("AUTH_JWKS_URL"))?,
            None => {
                jwks_url_for_issuer(&auth_issuer).ok_or(ConfigError::Invalid("AUTH_ISSUER"))?
            }
        };

        let auth_algorithms =
            parse_algorithms(&var("AUTH_ALGORITHMS").unwrap_or_else(|| "RS256".into()))
                .ok_or(ConfigError::Invalid("AUTH_ALGORITHMS"))?;

        let access_token_leeway_seconds = seconds(&var, "ACCESS_TOKEN_LEEWAY_SECONDS", 0)?;

        let jwks_cache_ttl = Duration::from_secs(seconds(&var, "JWKS_CACHE_TTL_SECONDS", 600)?);
        let jwks_min_refresh_interval =
            Duration::from_secs(seconds(&var, "JWKS_MIN_REFRESH_INTERVAL_SECONDS", 10)?);
        let jwks_fetch_timeout =
            Duration::from_secs(seconds(&var, "JWKS_FETCH_TIMEOUT_SECONDS", 5)?);

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            request_timeout,
            auth_issuer,
            auth_audience,
            auth_jwks_url,
            auth_algorithms,
            access_token_leeway_seconds,
            jwks_cache_ttl,
            jwks_min_refresh_interval,
            jwks_fetch_timeout,
        })
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            issuer: self.auth_issuer.clone(),
            audience: self.auth_audience.clone(),
            algorithms: self.auth_algorithms.clone(),
            leeway_seconds: self.access_token_leeway_seconds,
            jwks_cache_ttl: self.jwks_cache_ttl,
            jwks_min_refresh_interval: self.jwks_min_refresh_interval,
        }
    }
}

// 未設定 => default / 設定済みで parse 不可 => 起動失敗
fn seconds(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match var(key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn issuer_for_domain(domain: &str) -> String {
    format!("https://{}/", domain.trim().trim_end_matches('/'))
}

fn jwks_url_for_issuer(issuer: &str) -> Option<Url> {
    let url = format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/'));
    Url::parse(&url).ok()
}

/// カンマ区切りの allow-list (RSA 署名のみ)
fn parse_algorithms(raw: &str) -> Option<Vec<Algorithm>> {
    let mut algorithms = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let alg = match name.to_ascii_uppercase().as_str() {
            "RS256" => Algorithm::RS256,
            "RS384" => Algorithm::RS384,
            "RS512" => Algorithm::RS512,
            _ => return None,
        };
        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }
    (!algorithms.is_empty()).then_some(algorithms)
}
