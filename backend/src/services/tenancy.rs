use chrono::NaiveDate;

use crate::auth::Role;
use crate::core::{ApiError, DbContext, DbError};
use crate::db::{self, PropertyStatus, TenantAssignment};
use crate::services::audit::{self, AuditEvent};

/// Links a registered tenant to one of the owner's properties and marks the
/// property occupied.
///
/// Both writes share one transaction. A second assignment of the same pair
/// fails with `AlreadyAssigned` and leaves the property untouched.
pub async fn assign_tenant(
    db: &DbContext,
    owner_id: i64,
    property_id: i64,
    tenant_id: i64,
    move_in_date: NaiveDate,
) -> Result<TenantAssignment, ApiError> {
    let property = db::get_owned_property(db, owner_id, property_id)
        .await
        .map_err(ApiError::not_found_or("Property"))?;

    let roles = db::get_user_roles(db, tenant_id).await?;
    if !roles.contains(&Role::Tenant) {
        return Err(ApiError::NotFound("Tenant"));
    }

    let mut tx = db.begin().await.map_err(DbError::from)?;

    if db::find_assignment_for_pair(&mut tx, property.id, tenant_id).await?.is_some() {
        return Err(ApiError::AlreadyAssigned);
    }

    let assignment = db::insert_assignment(&mut tx, property.id, tenant_id, move_in_date)
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation(_) => ApiError::AlreadyAssigned,
            other => ApiError::Database(other),
        })?;
    db::set_property_status(&mut tx, property.id, PropertyStatus::Occupied).await?;

    tx.commit().await.map_err(DbError::from)?;

    audit::log_event(&AuditEvent::TenantAssigned {
        owner_id,
        property_id: property.id,
        tenant_id,
    });
    Ok(assignment)
}
