use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::Local;
use serde_json::json;

use crate::core::{self, ApiError};
use crate::db::{self, NewExpense};
use crate::middleware::role_guard::Caller;

pub async fn create(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Json(new_expense): Json<NewExpense>,
) -> Result<impl IntoResponse, ApiError> {
    if new_expense.description.trim().is_empty() {
        return Err(ApiError::invalid("Description is required"));
    }
    if !new_expense.amount.is_finite() || new_expense.amount <= 0.0 {
        return Err(ApiError::invalid("Amount must be greater than zero"));
    }
    db::get_owned_property(&context.db, caller.user_id, new_expense.property_id)
        .await
        .map_err(ApiError::not_found_or("Property"))?;

    let spent_on = new_expense.spent_on.unwrap_or_else(|| Local::now().date_naive());
    let expense = db::create_expense(&context.db, caller.user_id, &new_expense, spent_on).await?;
    tracing::info!(owner_id = caller.user_id, expense_id = expense.id, "Expense recorded");
    Ok((StatusCode::CREATED, Json(json!({"result": "ok", "expense": expense}))))
}

pub async fn list(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let expenses = db::list_expenses_by_owner(&context.db, caller.user_id).await?;
    Ok(Json(json!({"result": "ok", "expenses": expenses})))
}

pub async fn delete(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    db::delete_expense(&context.db, caller.user_id, id)
        .await
        .map_err(ApiError::not_found_or("Expense"))?;
    Ok(Json(json!({"result": "ok"})))
}
