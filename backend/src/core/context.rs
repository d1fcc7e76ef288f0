use crate::auth;
use crate::cfg;
use crate::core;
use crate::middleware::rate_limit;

pub type ArcContext = std::sync::Arc<Context>;

/// Process-wide state, created once at start-up and handed to every handler.
#[derive(Clone)]
pub struct Context {
    pub db: core::DbContext,
    pub jwt: auth::JwtContext,
    pub settings: cfg::AppSettings,
    pub cache: core::QueryCache,
    pub rate_limiter: rate_limit::RateLimiter,
}

impl Context {
    #[must_use]
    pub fn new(db: core::DbContext, jwt: auth::JwtContext, settings: cfg::AppSettings) -> ArcContext {
        Self {
            db,
            jwt,
            cache: core::QueryCache::new(&settings.cache),
            rate_limiter: rate_limit::RateLimiter::new(&settings.auth),
            settings,
        }
        .into()
    }
}
