use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;

use crate::core::{self, ApiError};
use crate::db::{self, NotificationSettings};
use crate::middleware::role_guard::Caller;

const MAX_DAYS_BEFORE_DUE: i64 = 28;

pub async fn get_settings(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let settings = db::get_notification_settings(&context.db, caller.user_id).await?;
    Ok(Json(json!({"result": "ok", "settings": settings})))
}

pub async fn update_settings(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Json(settings): Json<NotificationSettings>,
) -> Result<impl IntoResponse, ApiError> {
    if !(1..=MAX_DAYS_BEFORE_DUE).contains(&settings.days_before_due) {
        return Err(ApiError::invalid(format!(
            "Reminder lead time must be between 1 and {MAX_DAYS_BEFORE_DUE} days"
        )));
    }
    let settings = db::upsert_notification_settings(&context.db, caller.user_id, &settings).await?;
    Ok(Json(json!({"result": "ok", "settings": settings})))
}
