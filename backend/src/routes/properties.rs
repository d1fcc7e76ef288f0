use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{Datelike, Local};
use serde_json::json;

use crate::core::{self, ApiError, CacheKey, DbError, scope};
use crate::db::{self, NewProperty, PropertyStatus, PropertyUpdate};
use crate::middleware::role_guard::Caller;
use crate::services::sms::{self, SmsLink};

fn validate_rent(rent_amount: f64) -> Result<(), ApiError> {
    if rent_amount.is_finite() && rent_amount >= 0.0 {
        Ok(())
    } else {
        Err(ApiError::invalid("Rent amount must be zero or more"))
    }
}

async fn invalidate_listings(context: &core::Context, owner_id: i64) {
    context.cache.invalidate(&CacheKey::new(scope::OWNER_PROPERTIES, owner_id)).await;
    context.cache.invalidate_scope(scope::LISTED_PROPERTIES).await;
}

pub async fn list_owned(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    let properties = context
        .cache
        .get_or_fetch(CacheKey::new(scope::OWNER_PROPERTIES, caller.user_id), || {
            db::list_properties_by_owner(&context.db, caller.user_id)
        })
        .await?;
    Ok(Json(json!({"result": "ok", "properties": properties})))
}

pub async fn create(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Json(new_property): Json<NewProperty>,
) -> Result<impl IntoResponse, ApiError> {
    if new_property.name.trim().is_empty() {
        return Err(ApiError::invalid("Property name is required"));
    }
    validate_rent(new_property.rent_amount)?;

    let property = db::create_property(&context.db, caller.user_id, &new_property).await?;
    invalidate_listings(&context, caller.user_id).await;
    tracing::info!(owner_id = caller.user_id, property_id = property.id, "Property created");
    Ok((StatusCode::CREATED, Json(json!({"result": "ok", "property": property}))))
}

pub async fn get(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let property = db::get_owned_property(&context.db, caller.user_id, id)
        .await
        .map_err(ApiError::not_found_or("Property"))?;
    let today = Local::now().date_naive();
    let tenants: Vec<_> = db::list_assigned_tenants_for_owner(&context.db, caller.user_id, (today.month(), today.year()))
        .await?
        .into_iter()
        .filter(|t| t.property_id == property.id)
        .collect();
    Ok(Json(json!({"result": "ok", "property": property, "tenants": tenants})))
}

pub async fn update(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    Json(update): Json<PropertyUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::invalid("Property name cannot be empty"));
    }
    if let Some(rent_amount) = update.rent_amount {
        validate_rent(rent_amount)?;
    }

    let property = db::update_property(&context.db, caller.user_id, id, &update)
        .await
        .map_err(ApiError::not_found_or("Property"))?;
    invalidate_listings(&context, caller.user_id).await;
    Ok(Json(json!({"result": "ok", "property": property})))
}

/// Deletes a property that has never been rented. Assigned properties keep
/// their tenants' payment history, so they cannot be deleted.
pub async fn delete(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let property = db::get_owned_property(&context.db, caller.user_id, id)
        .await
        .map_err(ApiError::not_found_or("Property"))?;
    if db::count_assignments_for_property(&context.db, property.id).await? > 0 {
        return Err(ApiError::PropertyInUse);
    }
    db::delete_property(&context.db, caller.user_id, property.id)
        .await
        .map_err(ApiError::not_found_or("Property"))?;
    invalidate_listings(&context, caller.user_id).await;
    tracing::info!(owner_id = caller.user_id, property_id = id, "Property deleted");
    Ok(Json(json!({"result": "ok"})))
}

/// Publishes a vacant property so tenants can find it.
pub async fn publish(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let property = db::get_owned_property(&context.db, caller.user_id, id)
        .await
        .map_err(ApiError::not_found_or("Property"))?;
    if property.status == PropertyStatus::Occupied {
        return Err(ApiError::invalid("An occupied property cannot be listed"));
    }
    set_status(&context, caller.user_id, property.id, PropertyStatus::Listed).await?;
    Ok(Json(json!({"result": "ok", "status": PropertyStatus::Listed})))
}

/// Takes a listed property off the market.
pub async fn unpublish(
    State(context): State<core::ArcContext>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let property = db::get_owned_property(&context.db, caller.user_id, id)
        .await
        .map_err(ApiError::not_found_or("Property"))?;
    if property.status != PropertyStatus::Listed {
        return Err(ApiError::invalid("This property is not listed"));
    }
    set_status(&context, caller.user_id, property.id, PropertyStatus::Vacant).await?;
    Ok(Json(json!({"result": "ok", "status": PropertyStatus::Vacant})))
}

async fn set_status(context: &core::Context, owner_id: i64, id: i64, status: PropertyStatus) -> Result<(), ApiError> {
    let mut conn = context.db.acquire().await.map_err(DbError::from)?;
    db::set_property_status(&mut conn, id, status).await?;
    invalidate_listings(context, owner_id).await;
    tracing::info!(owner_id, property_id = id, %status, "Property status changed");
    Ok(())
}

pub async fn browse_listed(State(context): State<core::ArcContext>) -> Result<impl IntoResponse, ApiError> {
    let properties = context
        .cache
        .get_or_fetch(CacheKey::global(scope::LISTED_PROPERTIES), || {
            db::list_listed_properties(&context.db)
        })
        .await?;
    Ok(Json(json!({"result": "ok", "properties": properties})))
}

/// SMS link that opens a message to the owner of a listed property.
pub async fn contact_owner(
    State(context): State<core::ArcContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let property = db::get_listed_property(&context.db, id)
        .await
        .map_err(ApiError::not_found_or("Property"))?;
    let message = sms::contact_owner_message(&property.name, &property.address);
    let link = SmsLink::new(&property.owner_phone, message)
        .ok_or_else(|| ApiError::invalid("The owner has not shared a phone number"))?;
    Ok(Json(json!({"result": "ok", "sms": link})))
}
