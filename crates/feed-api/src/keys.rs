//! Sources of the identity provider's public signing keys.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use reqwest::header::CACHE_CONTROL;
use tokio::sync::RwLock;
use tracing::debug;

use crate::verifier::VerifyError;

/// Google's published ID token signing keys.
pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Used when the key endpoint sends no `max-age`.
const DEFAULT_KEY_TTL: Duration = Duration::from_secs(3600);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait KeySource: Send + Sync {
    async fn keys(&self) -> Result<Arc<JwkSet>, VerifyError>;
}

/// A fixed key set.
pub struct StaticKeys {
    keys: Arc<JwkSet>,
}

impl StaticKeys {
    pub fn new(keys: JwkSet) -> Self {
        Self {
            keys: Arc::new(keys),
        }
    }
}

#[async_trait]
impl KeySource for StaticKeys {
    async fn keys(&self) -> Result<Arc<JwkSet>, VerifyError> {
        Ok(self.keys.clone())
    }
}

struct CachedKeys {
    keys: Arc<JwkSet>,
    expires_at: Instant,
}

impl CachedKeys {
    fn fresh(&self) -> bool {
        self.expires_at > Instant::now()
    }
}

/// Keys fetched over HTTP from a JWKS endpoint and cached for as long as the
/// endpoint's `Cache-Control: max-age` allows.
pub struct RemoteKeys {
    url: String,
    http: reqwest::Client,
    cache: RwLock<Option<CachedKeys>>,
}

impl RemoteKeys {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
            cache: RwLock::new(None),
        }
    }

    async fn fetch(&self) -> Result<CachedKeys, VerifyError> {
        debug!(url = %self.url, "Fetching signing keys");
        let response = self
            .http
            .get(&self.url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?;

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(max_age)
            .unwrap_or(DEFAULT_KEY_TTL);

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?;

        debug!(
            url = %self.url,
            count = keys.keys.len(),
            ttl_secs = ttl.as_secs(),
            "Fetched signing keys"
        );

        Ok(CachedKeys {
            keys: Arc::new(keys),
            expires_at: Instant::now() + ttl,
        })
    }
}

#[async_trait]
impl KeySource for RemoteKeys {
    async fn keys(&self) -> Result<Arc<JwkSet>, VerifyError> {
        if let Some(cached) = self.cache.read().await.as_ref().filter(|c| c.fresh()) {
            debug!(url = %self.url, "Using cached signing keys");
            return Ok(cached.keys.clone());
        }

        let mut cache = self.cache.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(cached) = cache.as_ref().filter(|c| c.fresh()) {
            return Ok(cached.keys.clone());
        }

        let fetched = self.fetch().await?;
        let keys = fetched.keys.clone();
        *cache = Some(fetched);
        Ok(keys)
    }
}

/// `max-age` directive of a `Cache-Control` header value.
fn max_age(cache_control: &str) -> Option<Duration> {
    cache_control.split(',').find_map(|directive| {
        let (name, value) = directive.trim().split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("max-age") {
            return None;
        }
        value.trim().parse().ok().map(Duration::from_secs)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Json, Router, http::header, routing::get};

    use super::*;

    async fn serve_jwks(hits: Arc<AtomicUsize>, cache_control: &'static str) -> String {
        let jwks: serde_json::Value =
            serde_json::from_str(include_str!("../tests/fixtures/jwks.json")).unwrap();
        let app = Router::new().route(
            "/certs",
            get(move || {
                let hits = hits.clone();
                let jwks = jwks.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    ([(header::CACHE_CONTROL, cache_control)], Json(jwks))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/certs")
    }

    #[test]
    fn parses_max_age() {
        assert_eq!(
            max_age("public, max-age=19800, must-revalidate, no-transform"),
            Some(Duration::from_secs(19800))
        );
        assert_eq!(max_age("Max-Age=60"), Some(Duration::from_secs(60)));
        assert_eq!(max_age("no-cache"), None);
        assert_eq!(max_age("max-age=soon"), None);
    }

    #[tokio::test]
    async fn caches_keys_until_max_age() {
        let hits = Arc::new(AtomicUsize::new(0));
        let url = serve_jwks(hits.clone(), "public, max-age=3600").await;
        let source = RemoteKeys::new(url);

        let first = source.keys().await.unwrap();
        let second = source.keys().await.unwrap();

        assert!(first.find("test-key-1").is_some());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refetches_when_cache_is_stale() {
        let hits = Arc::new(AtomicUsize::new(0));
        let url = serve_jwks(hits.clone(), "max-age=0").await;
        let source = RemoteKeys::new(url);

        source.keys().await.unwrap();
        source.keys().await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_closed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = RemoteKeys::new(format!("http://{addr}/certs"));
        assert!(matches!(source.keys().await, Err(VerifyError::KeyFetch(_))));
    }
}
