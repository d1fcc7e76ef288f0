use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::cfg;

/// Cache scopes, one per list query that handlers cache.
pub mod scope {
    pub const OWNER_PROPERTIES: &str = "owner-properties";
    pub const TENANT_RECEIPTS: &str = "tenant-receipts";
    pub const TENANT_DOCUMENTS: &str = "tenant-documents";
    pub const ADMIN_BANNERS: &str = "admin-banners";
    pub const ADMIN_SERVICES: &str = "admin-services";
    pub const DASHBOARD_CAROUSEL: &str = "dashboard-carousel";
    pub const LISTED_PROPERTIES: &str = "listed-properties";
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CacheKey {
    pub scope: &'static str,
    pub discriminator: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(scope: &'static str, discriminator: impl fmt::Display) -> Self {
        Self {
            scope,
            discriminator: discriminator.to_string(),
        }
    }

    #[must_use]
    pub fn global(scope: &'static str) -> Self {
        Self::new(scope, "*")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope, self.discriminator)
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    stored_at: Instant,
}

/// Read-through cache for list queries.
///
/// Entries are scoped so that a mutation can drop every list it may have
/// changed (`invalidate_scope`), or just the caller's own list (`invalidate`).
/// Values are shared as `Arc<dyn Any>` and cloned out on a hit.
#[derive(Clone)]
pub struct QueryCache {
    ttl: Duration,
    max_entries: usize,
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
}

impl QueryCache {
    #[must_use]
    pub fn new(settings: &cfg::CacheSettings) -> Self {
        Self {
            ttl: Duration::from_secs(settings.ttl_seconds),
            max_entries: settings.max_entries.max(1),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub async fn get<T>(&self, key: &CacheKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        if !self.is_enabled() {
            return None;
        }
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() > self.ttl {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    pub async fn put<T>(&self, key: CacheKey, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        if !self.is_enabled() {
            return;
        }
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| now.duration_since(entry.stored_at) <= self.ttl);
        while entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(oldest) => entries.remove(&oldest),
                None => break,
            };
        }
        entries.insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                stored_at: now,
            },
        );
    }

    /// Returns the cached value for `key`, or runs `fetch` and caches its result.
    /// Errors are never cached.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(&key).await {
            tracing::debug!(key = %key, "query cache hit");
            return Ok(value);
        }
        let value = fetch().await?;
        self.put(key, value.clone()).await;
        Ok(value)
    }

    pub async fn invalidate(&self, key: &CacheKey) {
        if self.entries.write().await.remove(key).is_some() {
            tracing::debug!(key = %key, "query cache entry invalidated");
        }
    }

    pub async fn invalidate_scope(&self, scope: &str) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| key.scope != scope);
        tracing::debug!(scope, removed = before - entries.len(), "query cache scope invalidated");
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
