use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Lifetime of cached list queries; 0 disables caching
    #[serde(default)]
    pub ttl_seconds: u64,

    /// Upper bound on cached entries before the oldest ones are evicted
    #[serde(default)]
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 30,
            max_entries: 1024,
        }
    }
}
