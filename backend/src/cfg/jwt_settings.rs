use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct JwtSettings {
    #[serde(default)]
    pub access_token_expiry: i64, // In seconds (e.g., 15 minutes = 900)

    #[serde(default)]
    pub refresh_token_expiry: i64, // In seconds (e.g., 30 days = 2592000)
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            access_token_expiry: 15 * 60,            // 15 minutes
            refresh_token_expiry: 30 * 24 * 60 * 60, // 30 days
        }
    }
}
