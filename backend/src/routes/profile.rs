use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;

use crate::core::{self, ApiError, scope};
use crate::db::{self, ProfileUpdate};
use crate::middleware::role_guard::Identity;

pub async fn get_profile(
    State(context): State<core::ArcContext>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ApiError> {
    let user = db::get_user_by_id(&context.db, identity.user_id)
        .await
        .map_err(ApiError::not_found_or("Profile"))?;
    let roles = db::get_user_roles(&context.db, user.id).await?;
    let notifications = db::get_notification_settings(&context.db, user.id).await?;
    Ok(Json(json!({
        "result": "ok",
        "profile": user,
        "roles": roles,
        "notifications": notifications,
    })))
}

pub async fn update_profile(
    State(context): State<core::ArcContext>,
    Extension(identity): Extension<Identity>,
    Json(update): Json<ProfileUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if update.full_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::invalid("Full name cannot be empty"));
    }
    let user = db::update_profile(&context.db, identity.user_id, &update)
        .await
        .map_err(ApiError::not_found_or("Profile"))?;
    // listings embed the owner's name and phone
    context.cache.invalidate_scope(scope::LISTED_PROPERTIES).await;
    tracing::info!(user_id = user.id, "Profile updated");
    Ok(Json(json!({"result": "ok", "profile": user})))
}
