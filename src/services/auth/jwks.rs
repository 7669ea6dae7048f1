//! Verification key set (JWKS) fetched from the identity provider.
//!
//! Responsibility:
//! - Fetch the published key set (`KeySetSource`)
//! - Keep an immutable kid -> key snapshot that readers load without locking
//! - Refresh on expiry or on an unknown `kid`, at most once per lookup
//!
//! Policy:
//! - snapshot older than `ttl` => refetch
//! - `kid` not in a fresh snapshot => refetch, unless the snapshot is younger
//!   than `min_refresh_interval`
//! - concurrent refreshes wait on one fetch instead of issuing their own
//! - a failed fetch blocks new attempts for `min_refresh_interval`; callers in
//!   that window get `KeySetUnavailable` without touching the endpoint
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::Mutex;
use url::Url;

use crate::services::auth::error::AuthError;

/// Where the key set comes from.
///
/// One call is one attempt: implementations must not retry internally.
#[async_trait]
pub trait KeySetSource: Send + Sync + 'static {
    // Used in logs only.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<JwkSet, AuthError>;
}

/// `GET <jwks_url>` with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpKeySetSource {
    url: Url,
    client: reqwest::Client,
}

impl HttpKeySetSource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %self.url, error = %e, "failed to fetch JWKS");
                AuthError::KeySetUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(url = %self.url, %status, "JWKS endpoint returned an error status");
            return Err(AuthError::KeySetUnavailable(format!(
                "JWKS endpoint returned {status}"
            )));
        }

        response.json::<JwkSet>().await.map_err(|e| {
            tracing::error!(url = %self.url, error = %e, "failed to parse JWKS");
            AuthError::KeySetUnavailable(e.to_string())
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct JwksPolicy {
    pub ttl: Duration,
    pub min_refresh_interval: Duration,
}

/// Immutable kid -> key mapping taken from one fetch.
pub struct KeySetSnapshot {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
}

impl KeySetSnapshot {
    /// Keep only keys that can verify a token under `allowed`.
    fn from_jwks(jwks: &JwkSet, allowed: &[Algorithm]) -> Self {
        let mut keys = HashMap::with_capacity(jwks.keys.len());

        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.as_deref() else {
                tracing::debug!("skipping JWK without kid");
                continue;
            };
            if !is_usable(jwk, allowed) {
                tracing::debug!(kid, "skipping JWK not usable for signature verification");
                continue;
            }
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid.to_string(), key);
                }
                Err(e) => tracing::warn!(kid, error = %e, "skipping invalid JWK"),
            }
        }

        Self {
            keys,
            fetched_at: Instant::now(),
        }
    }

    pub fn get(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}

fn is_usable(jwk: &Jwk, allowed: &[Algorithm]) -> bool {
    if !matches!(jwk.algorithm, AlgorithmParameters::RSA(_)) {
        return false;
    }
    if matches!(
        jwk.common.public_key_use,
        Some(PublicKeyUse::Encryption) | Some(PublicKeyUse::Other(_))
    ) {
        return false;
    }
    match jwk.common.key_algorithm {
        None => true,
        Some(KeyAlgorithm::RS256) => allowed.contains(&Algorithm::RS256),
        Some(KeyAlgorithm::RS384) => allowed.contains(&Algorithm::RS384),
        Some(KeyAlgorithm::RS512) => allowed.contains(&Algorithm::RS512),
        Some(_) => false,
    }
}

/// Process-wide key set cache.
pub struct JwksCache {
    source: Arc<dyn KeySetSource>,
    policy: JwksPolicy,
    allowed: Vec<Algorithm>,
    current: ArcSwapOption<KeySetSnapshot>,
    // Held while fetching. Stores when the last failed attempt finished.
    refresh_lock: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for JwksCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwksCache")
            .field("source", &self.source.describe())
            .field("policy", &self.policy)
            .field("allowed", &self.allowed)
            .finish_non_exhaustive()
    }
}

impl JwksCache {
    pub fn new(source: Arc<dyn KeySetSource>, policy: JwksPolicy, allowed: Vec<Algorithm>) -> Self {
        Self {
            source,
            policy,
            allowed,
            current: ArcSwapOption::empty(),
            refresh_lock: Mutex::new(None),
        }
    }

    /// Resolve the verification key for `kid`.
    pub async fn resolve(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(key) = self.lookup_fresh(kid) {
            return Ok(key);
        }

        let mut last_failure = self.refresh_lock.lock().await;

        // Another request may have refreshed while we waited.
        if let Some(key) = self.lookup_fresh(kid) {
            return Ok(key);
        }

        if let Some(failed_at) = *last_failure {
            let since = failed_at.elapsed();
            if since < self.policy.min_refresh_interval {
                tracing::debug!(kid, ?since, "key set fetch failed recently, not retrying");
                return Err(AuthError::KeySetUnavailable(format!(
                    "last fetch failed {since:?} ago"
                )));
            }
        }

        if let Some(current) = self.current.load_full() {
            let age = current.age();
            if age < self.policy.ttl && age < self.policy.min_refresh_interval {
                tracing::debug!(kid, ?age, "unknown kid, key set refreshed too recently");
                return Err(AuthError::KeyNotFound {
                    kid: kid.to_string(),
                });
            }
        }

        let snapshot = match self.refresh().await {
            Ok(snapshot) => {
                *last_failure = None;
                snapshot
            }
            Err(err) => {
                *last_failure = Some(Instant::now());
                return Err(err);
            }
        };
        snapshot
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::KeyNotFound {
                kid: kid.to_string(),
            })
    }

    fn lookup_fresh(&self, kid: &str) -> Option<DecodingKey> {
        let guard = self.current.load();
        let snapshot = (*guard).as_ref()?;
        if snapshot.age() >= self.policy.ttl {
            return None;
        }
        snapshot.get(kid).cloned()
    }

    async fn refresh(&self) -> Result<Arc<KeySetSnapshot>, AuthError> {
        tracing::debug!(source = %self.source.describe(), "refreshing JWKS");

        let jwks = self.source.fetch().await?;
        let snapshot = Arc::new(KeySetSnapshot::from_jwks(&jwks, &self.allowed));

        tracing::info!(
            fetched = jwks.keys.len(),
            usable = snapshot.len(),
            "JWKS refreshed"
        );

        self.current.store(Some(snapshot.clone()));
        Ok(snapshot)
    }
}
