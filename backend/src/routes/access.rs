use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, GateDecision, RoleResolution};
use crate::core::{self, ApiError};
use crate::db;

#[derive(Deserialize)]
pub struct AccessQuery {
    pub path: String,
}

/// Gate decision for a client route, so the client can render, wait or redirect.
pub async fn check_access(
    State(context): State<core::ArcContext>,
    headers: HeaderMap,
    Query(query): Query<AccessQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let resolution = match auth::decode_access_token_from_headers(&context.jwt, &headers)
        .ok()
        .and_then(|claims| claims.user_id().ok())
    {
        Some(user_id) => db::resolve_role(&context.db, user_id).await?,
        None => RoleResolution::Anonymous,
    };

    let decision = auth::allowed_roles_for(&query.path)
        .map_or(GateDecision::Render, |allowed| auth::evaluate(resolution, allowed));
    tracing::debug!(path = query.path, ?resolution, ?decision, "Access check");

    Ok(Json(json!({
        "result": "ok",
        "path": query.path,
        "session": resolution,
        "access": decision,
    })))
}
