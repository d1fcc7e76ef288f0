use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::RoleSet;
use crate::core::{self, ApiError, CacheKey, scope};
use crate::db::{self, BannerUpdate, NewBanner};

#[derive(Deserialize)]
pub struct ActiveFlag {
    pub is_active: bool,
}

/// Drops the admin list and every role's carousel.
async fn invalidate_banners(context: &core::Context) {
    context.cache.invalidate(&CacheKey::global(scope::ADMIN_BANNERS)).await;
    context.cache.invalidate_scope(scope::DASHBOARD_CAROUSEL).await;
}

pub async fn list(State(context): State<core::ArcContext>) -> Result<impl IntoResponse, ApiError> {
    let banners = context
        .cache
        .get_or_fetch(CacheKey::global(scope::ADMIN_BANNERS), || db::list_banners(&context.db))
        .await?;
    Ok(Json(json!({"result": "ok", "banners": banners})))
}

pub async fn get(State(context): State<core::ArcContext>, Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let banner = db::get_banner(&context.db, id)
        .await
        .map_err(ApiError::not_found_or("Banner"))?;
    Ok(Json(json!({"result": "ok", "banner": banner})))
}

pub async fn create(
    State(context): State<core::ArcContext>,
    Json(new_banner): Json<NewBanner>,
) -> Result<impl IntoResponse, ApiError> {
    if new_banner.title.trim().is_empty() {
        return Err(ApiError::invalid("Title is required"));
    }
    if new_banner.target_roles.is_empty() {
        return Err(ApiError::invalid("Select at least one role to show this banner to"));
    }
    let banner = db::create_banner(&context.db, &new_banner).await?;
    invalidate_banners(&context).await;
    tracing::info!(banner_id = banner.id, "Banner created");
    Ok((StatusCode::CREATED, Json(json!({"result": "ok", "banner": banner}))))
}

pub async fn update(
    State(context): State<core::ArcContext>,
    Path(id): Path<i64>,
    Json(update): Json<BannerUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if update.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
        return Err(ApiError::invalid("Title cannot be empty"));
    }
    if update.target_roles.as_ref().is_some_and(RoleSet::is_empty) {
        return Err(ApiError::invalid("Select at least one role to show this banner to"));
    }
    let banner = db::update_banner(&context.db, id, &update)
        .await
        .map_err(ApiError::not_found_or("Banner"))?;
    invalidate_banners(&context).await;
    Ok(Json(json!({"result": "ok", "banner": banner})))
}

pub async fn set_active(
    State(context): State<core::ArcContext>,
    Path(id): Path<i64>,
    Json(flag): Json<ActiveFlag>,
) -> Result<impl IntoResponse, ApiError> {
    let banner = db::set_banner_active(&context.db, id, flag.is_active)
        .await
        .map_err(ApiError::not_found_or("Banner"))?;
    invalidate_banners(&context).await;
    tracing::info!(banner_id = banner.id, is_active = banner.is_active, "Banner visibility changed");
    Ok(Json(json!({"result": "ok", "banner": banner})))
}

pub async fn delete(State(context): State<core::ArcContext>, Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    db::delete_banner(&context.db, id)
        .await
        .map_err(ApiError::not_found_or("Banner"))?;
    invalidate_banners(&context).await;
    tracing::info!(banner_id = id, "Banner deleted");
    Ok(Json(json!({"result": "ok"})))
}
