use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::auth::RoleSet;
use crate::core::{self, ApiError, CacheKey, scope};
use crate::db::{self, NewServiceCard, ServiceCardUpdate};
use crate::routes::banners::ActiveFlag;

async fn invalidate_services(context: &core::Context) {
    context.cache.invalidate(&CacheKey::global(scope::ADMIN_SERVICES)).await;
    context.cache.invalidate_scope(scope::DASHBOARD_CAROUSEL).await;
}

pub async fn list(State(context): State<core::ArcContext>) -> Result<impl IntoResponse, ApiError> {
    let services = context
        .cache
        .get_or_fetch(CacheKey::global(scope::ADMIN_SERVICES), || db::list_service_cards(&context.db))
        .await?;
    Ok(Json(json!({"result": "ok", "services": services})))
}

pub async fn get(State(context): State<core::ArcContext>, Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let service = db::get_service_card(&context.db, id)
        .await
        .map_err(ApiError::not_found_or("Service"))?;
    Ok(Json(json!({"result": "ok", "service": service})))
}

pub async fn create(
    State(context): State<core::ArcContext>,
    Json(new_card): Json<NewServiceCard>,
) -> Result<impl IntoResponse, ApiError> {
    if new_card.title.trim().is_empty() {
        return Err(ApiError::invalid("Title is required"));
    }
    if new_card.target_roles.is_empty() {
        return Err(ApiError::invalid("Select at least one role to show this service to"));
    }
    let service = db::create_service_card(&context.db, &new_card).await?;
    invalidate_services(&context).await;
    tracing::info!(service_id = service.id, "Service created");
    Ok((StatusCode::CREATED, Json(json!({"result": "ok", "service": service}))))
}

pub async fn update(
    State(context): State<core::ArcContext>,
    Path(id): Path<i64>,
    Json(update): Json<ServiceCardUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if update.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
        return Err(ApiError::invalid("Title cannot be empty"));
    }
    if update.target_roles.as_ref().is_some_and(RoleSet::is_empty) {
        return Err(ApiError::invalid("Select at least one role to show this service to"));
    }
    let service = db::update_service_card(&context.db, id, &update)
        .await
        .map_err(ApiError::not_found_or("Service"))?;
    invalidate_services(&context).await;
    Ok(Json(json!({"result": "ok", "service": service})))
}

pub async fn set_active(
    State(context): State<core::ArcContext>,
    Path(id): Path<i64>,
    Json(flag): Json<ActiveFlag>,
) -> Result<impl IntoResponse, ApiError> {
    let service = db::set_service_card_active(&context.db, id, flag.is_active)
        .await
        .map_err(ApiError::not_found_or("Service"))?;
    invalidate_services(&context).await;
    Ok(Json(json!({"result": "ok", "service": service})))
}

pub async fn delete(State(context): State<core::ArcContext>, Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    db::delete_service_card(&context.db, id)
        .await
        .map_err(ApiError::not_found_or("Service"))?;
    invalidate_services(&context).await;
    tracing::info!(service_id = id, "Service deleted");
    Ok(Json(json!({"result": "ok"})))
}
