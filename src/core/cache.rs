//! Cache-aside gateway and the stores behind it.
//!
//! Every upstream lookup goes through [`CacheGateway::with_cache`]. Successful
//! results and recognized failures are both stored for the TTL; untyped
//! transport/parse failures are returned without being stored.
//!
//! The gateway takes no locks. Two concurrent misses on one key both run their
//! producer and the later store wins, which is harmless because both write a
//! snapshot of the same upstream record.

use crate::core::error::{Result, VideoError};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600 * 24 * 7);

/// Expiry used when `now + ttl` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store error: {0}")]
    Store(String),
    #[error("cache encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("unknown cached error code: {0}")]
    UnknownCode(String),
}

/// Namespaced string store with per-entry expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns `None` for missing or expired entries.
    async fn get(&self, namespace: &str, key: &str) -> std::result::Result<Option<String>, CacheError>;
    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> std::result::Result<(), CacheError>;
}

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// In-process store. Expired entries are dropped lazily on read.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn slot(namespace: &str, key: &str) -> String {
        format!("{}:{}", namespace, key)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, namespace: &str, key: &str) -> std::result::Result<Option<String>, CacheError> {
        let slot = Self::slot(namespace, key);

        if let Some(entry) = self.entries.get(&slot) {
            if Instant::now() < entry.expires_at {
                return Ok(Some(entry.value.clone()));
            }
        }

        // a fresh value may have been stored since the read above
        self.entries
            .remove_if(&slot, |_, entry| Instant::now() >= entry.expires_at);

        Ok(None)
    }

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> std::result::Result<(), CacheError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + FAR_FUTURE);

        self.entries
            .insert(Self::slot(namespace, key), MemoryEntry { value, expires_at });
        Ok(())
    }
}

/// Field-level hash store without TTL support (a hash keyed by namespace).
#[async_trait]
pub trait HashStore: Send + Sync {
    async fn hget(&self, hash: &str, field: &str) -> std::result::Result<Option<String>, CacheError>;
    async fn hset(&self, hash: &str, field: &str, value: String) -> std::result::Result<(), CacheError>;
}

/// Value written into a [`HashStore`] field. The expiry travels with the item
/// because the store itself cannot expire fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub item: serde_json::Value,
    /// Unix time in milliseconds.
    pub expires_at: i64,
}

impl CacheEntry {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }
}

/// Adapts a [`HashStore`] to [`CacheStore`], checking expiry on read.
pub struct HashCache<S> {
    store: S,
}

impl<S: HashStore> HashCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: HashStore> CacheStore for HashCache<S> {
    async fn get(&self, namespace: &str, key: &str) -> std::result::Result<Option<String>, CacheError> {
        let Some(raw) = self.store.hget(namespace, key).await? else {
            return Ok(None);
        };

        let entry: CacheEntry = serde_json::from_str(&raw)?;
        if entry.is_expired(chrono::Utc::now().timestamp_millis()) {
            return Ok(None);
        }

        Ok(Some(entry.item.to_string()))
    }

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> std::result::Result<(), CacheError> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let entry = CacheEntry {
            item: serde_json::from_str(&value)?,
            expires_at: chrono::Utc::now().timestamp_millis().saturating_add(ttl_ms),
        };
        self.store
            .hset(namespace, key, serde_json::to_string(&entry)?)
            .await
    }
}

/// In-process [`HashStore`].
#[derive(Default)]
pub struct MemoryHashStore {
    hashes: DashMap<String, HashMap<String, String>>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HashStore for MemoryHashStore {
    async fn hget(&self, hash: &str, field: &str) -> std::result::Result<Option<String>, CacheError> {
        Ok(self
            .hashes
            .get(hash)
            .and_then(|fields| fields.get(field).cloned()))
    }

    async fn hset(&self, hash: &str, field: &str, value: String) -> std::result::Result<(), CacheError> {
        self.hashes
            .entry(hash.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
enum CachedItem<T> {
    Ok(T),
    Err(String),
}

/// Side channel for cache failures that must not affect the caller's result.
pub type CacheErrorListener = Arc<dyn Fn(&CacheError) + Send + Sync>;

fn log_cache_error() -> CacheErrorListener {
    Arc::new(|err: &CacheError| warn!("Cache error: {}", err))
}

#[derive(Clone)]
pub struct CacheGateway {
    store: Arc<dyn CacheStore>,
    namespace: String,
    default_ttl: Duration,
    listener: CacheErrorListener,
}

impl CacheGateway {
    pub fn new(store: Arc<dyn CacheStore>, namespace: impl Into<String>, default_ttl: Duration) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            default_ttl,
            listener: log_cache_error(),
        }
    }

    pub fn with_listener(mut self, listener: CacheErrorListener) -> Self {
        self.listener = listener;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub async fn with_cache<T, F, Fut>(&self, key: &str, producer: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.with_cache_ttl(key, self.default_ttl, producer).await
    }

    pub async fn with_cache_ttl<T, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(cached) = self.lookup::<T>(key).await {
            debug!("Cache hit for {}", key);
            return cached;
        }

        debug!("Cache miss for {}", key);
        let outcome = producer().await;

        match &outcome {
            Ok(value) => self.store(key, &CachedItem::Ok(value), ttl).await,
            Err(err) => {
                if let Some(code) = err.code() {
                    self.store(key, &CachedItem::<&T>::Err(code.to_string()), ttl)
                        .await;
                }
            }
        }

        outcome
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<Result<T>> {
        let raw = match self.store.get(&self.namespace, key).await {
            Ok(raw) => raw?,
            Err(err) => {
                self.report(err);
                return None;
            }
        };

        match serde_json::from_str::<CachedItem<T>>(&raw) {
            Ok(CachedItem::Ok(value)) => Some(Ok(value)),
            Ok(CachedItem::Err(code)) => match VideoError::from_code(&code) {
                Some(err) => Some(Err(err)),
                None => {
                    self.report(CacheError::UnknownCode(code));
                    None
                }
            },
            Err(err) => {
                self.report(err.into());
                None
            }
        }
    }

    async fn store<T: Serialize>(&self, key: &str, item: &CachedItem<&T>, ttl: Duration) {
        let value = match serde_json::to_string(item) {
            Ok(value) => value,
            Err(err) => return self.report(err.into()),
        };

        if let Err(err) = self.store.set(&self.namespace, key, value, ttl).await {
            self.report(err);
        }
    }

    fn report(&self, err: CacheError) {
        (self.listener)(&err);
    }
}
