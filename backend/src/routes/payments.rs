use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::Local;
use serde_json::json;

use crate::core::{self, ApiError, CacheKey, scope};
use crate::db;
use crate::middleware::role_guard::Caller;
use crate::services::payments::{self, PaymentRequest};

pub async fn record(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<PaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = payments::record_payment(&context.db, caller.user_id, &request, Local::now().date_naive()).await?;
    context.cache.invalidate(&CacheKey::new(scope::TENANT_RECEIPTS, caller.user_id)).await;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "result": "ok",
            "message": format!("Payment of {:.2} via {} recorded", payment.amount, payment.method.label()),
            "payment": payment,
        })),
    ))
}

pub async fn receipts(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let receipts = context
        .cache
        .get_or_fetch(CacheKey::new(scope::TENANT_RECEIPTS, caller.user_id), || {
            db::list_receipts_for_tenant(&context.db, caller.user_id)
        })
        .await?;
    Ok(Json(json!({"result": "ok", "receipts": receipts})))
}
