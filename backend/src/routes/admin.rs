use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;

use crate::core::{self, ApiError};
use crate::db;

pub async fn users(State(context): State<core::ArcContext>) -> Result<impl IntoResponse, ApiError> {
    let users = db::list_users_with_roles(&context.db).await?;
    Ok(Json(json!({"result": "ok", "users": users})))
}

pub async fn properties(State(context): State<core::ArcContext>) -> Result<impl IntoResponse, ApiError> {
    let properties = db::list_property_overview(&context.db).await?;
    Ok(Json(json!({"result": "ok", "properties": properties})))
}
