use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::core::{ApiError, DbContext, DbError};
use crate::db::{self, NewPayment, Payment, PaymentMethod, PaymentStatus, RentStatus, TenantAssignment};
use crate::services::audit::{self, AuditEvent};

const RECEIPT_ATTEMPTS: usize = 3;

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    /// Needed only when the tenant rents more than one property.
    pub assignment_id: Option<i64>,
    pub method: PaymentMethod,
    /// Defaults to the property's monthly rent.
    pub amount: Option<f64>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// `RCPT-YYYYMM-XXXXXXXX`, the suffix taken from a random UUID.
#[must_use]
pub fn generate_receipt_id(month: u32, year: i32) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("RCPT-{year:04}{month:02}-{}", suffix.to_ascii_uppercase())
}

/// Records a rent payment. There is no gateway, so the payment is stored as
/// completed and the assignment's rent is marked paid in the same transaction.
pub async fn record_payment(
    db: &DbContext,
    tenant_id: i64,
    request: &PaymentRequest,
    today: NaiveDate,
) -> Result<Payment, ApiError> {
    let assignment = resolve_assignment(db, tenant_id, request.assignment_id).await?;
    let property = db::get_property_by_id(db, assignment.property_id)
        .await
        .map_err(ApiError::not_found_or("Property"))?;

    let amount = request.amount.unwrap_or(property.rent_amount);
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::invalid("Amount must be greater than zero"));
    }
    let month = request.month.unwrap_or_else(|| today.month());
    if !(1..=12).contains(&month) {
        return Err(ApiError::invalid("Month must be between 1 and 12"));
    }
    let year = request.year.unwrap_or_else(|| today.year());

    let new_payment = NewPayment {
        tenant_id,
        assignment_id: assignment.id,
        property_id: property.id,
        amount,
        method: request.method,
        status: PaymentStatus::Completed,
        receipt_id: String::new(),
        month,
        year,
    };

    let mut tx = db.begin().await.map_err(DbError::from)?;
    let payment = insert_with_unique_receipt(&mut tx, new_payment, || generate_receipt_id(month, year)).await?;
    db::set_rent_status(&mut tx, assignment.id, RentStatus::Paid).await?;
    tx.commit().await.map_err(DbError::from)?;

    audit::log_event(&AuditEvent::PaymentRecorded {
        tenant_id,
        property_id: property.id,
        receipt_id: payment.receipt_id.clone(),
        amount: payment.amount,
    });
    Ok(payment)
}

/// Inserts the payment under a fresh receipt id from `next_receipt_id`,
/// drawing another one when the id is already taken.
pub async fn insert_with_unique_receipt(
    conn: &mut SqliteConnection,
    mut new_payment: NewPayment,
    mut next_receipt_id: impl FnMut() -> String,
) -> Result<Payment, DbError> {
    let mut attempt = 1;
    loop {
        new_payment.receipt_id = next_receipt_id();
        match db::insert_payment(conn, &new_payment).await {
            Err(DbError::UniqueViolation(_)) if attempt < RECEIPT_ATTEMPTS => {
                tracing::warn!(receipt_id = %new_payment.receipt_id, attempt, "Receipt id already taken, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

async fn resolve_assignment(
    db: &DbContext,
    tenant_id: i64,
    assignment_id: Option<i64>,
) -> Result<TenantAssignment, ApiError> {
    if let Some(id) = assignment_id {
        return db::get_tenant_assignment(db, tenant_id, id)
            .await
            .map_err(ApiError::not_found_or("Rental agreement"));
    }

    let mut assignments = db::list_assignments_for_tenant(db, tenant_id).await?;
    match assignments.len() {
        0 => Err(ApiError::NotFound("Rental agreement")),
        1 => Ok(assignments.remove(0)),
        _ => Err(ApiError::invalid("Choose which rental this payment is for")),
    }
}
