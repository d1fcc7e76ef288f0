use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{Datelike, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::{self, ApiError, CacheKey, scope};
use crate::db::{self, AssignedTenant, RentStatus};
use crate::middleware::role_guard::Caller;
use crate::services::schedule::{self, PaidMonth};
use crate::services::sms::{self, SmsLink};
use crate::services::tenancy;

const SEARCH_LIMIT: i64 = 20;

#[derive(Deserialize)]
pub struct TenantSearch {
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
pub struct NewAssignment {
    pub property_id: i64,
    pub tenant_id: i64,
    pub move_in_date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct Reminder {
    pub assignment_id: i64,
    pub tenant_name: String,
    pub property_name: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub sms: SmsLink,
}

/// Registered tenants matching an email or phone fragment.
pub async fn search_tenants(
    State(context): State<core::ArcContext>,
    Query(search): Query<TenantSearch>,
) -> Result<impl IntoResponse, ApiError> {
    let query = search.q.trim();
    if query.len() < 3 {
        return Err(ApiError::invalid("Enter at least 3 characters of an email or phone number"));
    }
    let tenants = db::search_tenants(&context.db, query, SEARCH_LIMIT).await?;
    Ok(Json(json!({"result": "ok", "tenants": tenants})))
}

pub async fn assign(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<NewAssignment>,
) -> Result<impl IntoResponse, ApiError> {
    let move_in_date = request.move_in_date.unwrap_or_else(|| Local::now().date_naive());
    let assignment =
        tenancy::assign_tenant(&context.db, caller.user_id, request.property_id, request.tenant_id, move_in_date).await?;

    context.cache.invalidate(&CacheKey::new(scope::OWNER_PROPERTIES, caller.user_id)).await;
    context.cache.invalidate_scope(scope::LISTED_PROPERTIES).await;
    Ok((StatusCode::CREATED, Json(json!({"result": "ok", "assignment": assignment}))))
}

pub async fn list_assigned(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let today = Local::now().date_naive();
    let tenants = db::list_assigned_tenants_for_owner(&context.db, caller.user_id, (today.month(), today.year())).await?;
    Ok(Json(json!({"result": "ok", "tenants": tenants})))
}

/// SMS inviting an assigned tenant to sign in.
pub async fn invitation(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Path(assignment_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = find_assigned(&context, caller.user_id, assignment_id).await?;
    let owner = db::get_user_by_id(&context.db, caller.user_id)
        .await
        .map_err(ApiError::not_found_or("Owner"))?;
    let message = sms::invitation_message(&tenant.tenant_name, &owner.full_name, &tenant.property_name);
    let link = SmsLink::new(&tenant.tenant_phone, message)
        .ok_or_else(|| ApiError::invalid("This tenant has no phone number"))?;
    Ok(Json(json!({"result": "ok", "sms": link})))
}

/// Reminder SMS links for every tenant who has not paid the month of the next
/// due date, using the owner's reminder lead time.
pub async fn reminders(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let settings = db::get_notification_settings(&context.db, caller.user_id).await?;
    let today = Local::now().date_naive();
    let due_date = next_due_date(today);

    let tenants =
        db::list_assigned_tenants_for_owner(&context.db, caller.user_id, (due_date.month(), due_date.year())).await?;
    let reminders: Vec<Reminder> = tenants
        .into_iter()
        .filter(|t| t.rent_status == RentStatus::Pending)
        .filter_map(|t| {
            let due = due_date.format("%-d %b %Y").to_string();
            let message = sms::reminder_message(&t.tenant_name, &t.property_name, t.rent_amount, &due);
            SmsLink::new(&t.tenant_phone, message).map(|sms| Reminder {
                assignment_id: t.assignment_id,
                tenant_name: t.tenant_name,
                property_name: t.property_name,
                amount: t.rent_amount,
                due_date,
                sms,
            })
        })
        .collect();

    let days_until_due = (due_date - today).num_days();
    Ok(Json(json!({
        "result": "ok",
        "auto_sms_enabled": settings.auto_sms_enabled,
        "days_before_due": settings.days_before_due,
        "due_soon": days_until_due <= settings.days_before_due,
        "reminders": reminders,
    })))
}

fn next_due_date(today: NaiveDate) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    if first == today {
        return today;
    }
    first.checked_add_months(Months::new(1)).unwrap_or(first)
}

async fn find_assigned(context: &core::Context, owner_id: i64, assignment_id: i64) -> Result<AssignedTenant, ApiError> {
    let today = Local::now().date_naive();
    db::list_assigned_tenants_for_owner(&context.db, owner_id, (today.month(), today.year()))
        .await?
        .into_iter()
        .find(|t| t.assignment_id == assignment_id)
        .ok_or(ApiError::NotFound("Tenant assignment"))
}

/// The tenant's rental agreements with owner contact details.
pub async fn agreement(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let today = Local::now().date_naive();
    let agreements = db::list_agreements_for_tenant(&context.db, caller.user_id, (today.month(), today.year())).await?;
    Ok(Json(json!({"result": "ok", "agreements": agreements})))
}

/// Rent schedule for each of the tenant's rentals.
pub async fn rent_schedule(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let today = Local::now().date_naive();
    let mut schedules = Vec::new();
    for agreement in db::list_agreements_for_tenant(&context.db, caller.user_id, (today.month(), today.year())).await? {
        let paid: Vec<PaidMonth> = db::list_payments_for_assignment(&context.db, agreement.assignment_id)
            .await?
            .into_iter()
            .filter(|p| p.status == db::PaymentStatus::Completed)
            .map(|p| PaidMonth { month: p.month, year: p.year, receipt_id: p.receipt_id })
            .collect();
        let schedule = schedule::build_schedule(agreement.move_in_date, today, agreement.rent_amount, &paid);
        schedules.push(json!({
            "assignment_id": agreement.assignment_id,
            "property_name": agreement.property_name,
            "schedule": schedule,
        }));
    }
    Ok(Json(json!({"result": "ok", "schedules": schedules})))
}
