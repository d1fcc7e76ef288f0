use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{Datelike, Local};
use serde::Deserialize;
use serde_json::json;

use crate::core::{self, ApiError};
use crate::middleware::role_guard::Caller;
use crate::services::finance;

#[derive(Deserialize)]
pub struct ReportPeriod {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

pub async fn summary(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let overview = finance::owner_finance(&context.db, caller.user_id).await?;
    Ok(Json(json!({
        "result": "ok",
        "summary": overview.summary,
        "transactions": overview.transactions,
    })))
}

/// Monthly report, for the current month unless another is given.
pub async fn monthly_report(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Query(period): Query<ReportPeriod>,
) -> Result<impl IntoResponse, ApiError> {
    let today = Local::now().date_naive();
    let month = period.month.unwrap_or_else(|| today.month());
    if !(1..=12).contains(&month) {
        return Err(ApiError::invalid("Month must be between 1 and 12"));
    }
    let year = period.year.unwrap_or_else(|| today.year());

    let report = finance::owner_monthly_report(&context.db, caller.user_id, month, year).await?;
    Ok(Json(json!({"result": "ok", "report": report})))
}

pub async fn platform_report(State(context): State<core::ArcContext>) -> Result<impl IntoResponse, ApiError> {
    let report = finance::platform_report(&context.db, Local::now().date_naive()).await?;
    Ok(Json(json!({"result": "ok", "report": report})))
}
