use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{DbContext, DbError};

pub const DEFAULT_DAYS_BEFORE_DUE: i64 = 3;

/// Owner preferences for rent reminders.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, FromRow)]
pub struct NotificationSettings {
    pub auto_sms_enabled: bool,
    pub days_before_due: i64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            auto_sms_enabled: false,
            days_before_due: DEFAULT_DAYS_BEFORE_DUE,
        }
    }
}

/// Stored settings, or the defaults when the user never saved any.
pub async fn get_notification_settings(db: &DbContext, user_id: i64) -> Result<NotificationSettings, DbError> {
    let settings = sqlx::query_as::<_, NotificationSettings>(
        "SELECT auto_sms_enabled, days_before_due FROM notification_settings WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(settings.unwrap_or_default())
}

pub async fn upsert_notification_settings(
    db: &DbContext,
    user_id: i64,
    settings: &NotificationSettings,
) -> Result<NotificationSettings, DbError> {
    let saved = sqlx::query_as::<_, NotificationSettings>(
        r"
        INSERT INTO notification_settings (user_id, auto_sms_enabled, days_before_due, updated_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(user_id) DO UPDATE SET
            auto_sms_enabled = excluded.auto_sms_enabled,
            days_before_due = excluded.days_before_due,
            updated_at = CURRENT_TIMESTAMP
        RETURNING auto_sms_enabled, days_before_due
        ",
    )
    .bind(user_id)
    .bind(settings.auto_sms_enabled)
    .bind(settings.days_before_due)
    .fetch_one(db)
    .await?;
    Ok(saved)
}
