use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuthSettings {
    /// Minimum accepted length for new passwords
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Sign-in and sign-up attempts allowed per client IP within one window
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
}

const fn default_min_password_length() -> usize {
    6
}

const fn default_rate_limit_max_requests() -> u32 {
    20
}

const fn default_rate_limit_window_secs() -> u64 {
    60
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
        }
    }
}
