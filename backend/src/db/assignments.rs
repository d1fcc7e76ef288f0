use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::auth::ParseEnumError;
use crate::core::{DbContext, DbError};

const ASSIGNMENT_COLUMNS: &str = "id, property_id, tenant_id, rent_status, move_in_date, created_at";

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RentStatus {
    Pending,
    Paid,
}

impl RentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for RentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            _ => Err(ParseEnumError::new("rent status", s)),
        }
    }
}

impl TryFrom<String> for RentStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, FromRow)]
pub struct TenantAssignment {
    pub id: i64,
    pub property_id: i64,
    pub tenant_id: i64,
    #[sqlx(try_from = "String")]
    pub rent_status: RentStatus,
    pub move_in_date: NaiveDate,
    pub created_at: NaiveDateTime,
}

/// Assignment joined with tenant and property, for the owner's tenant list
/// and for rent reminders.
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct AssignedTenant {
    pub assignment_id: i64,
    pub property_id: i64,
    pub property_name: String,
    pub rent_amount: f64,
    pub tenant_id: i64,
    pub tenant_name: String,
    pub tenant_email: String,
    pub tenant_phone: String,
    #[sqlx(try_from = "String")]
    pub rent_status: RentStatus,
    pub move_in_date: NaiveDate,
}

/// Assignment joined with its property and owner, as the tenant sees it.
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct TenantAgreement {
    pub assignment_id: i64,
    pub property_id: i64,
    pub property_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub rent_amount: f64,
    #[sqlx(try_from = "String")]
    pub rent_status: RentStatus,
    pub move_in_date: NaiveDate,
    pub owner_name: String,
    pub owner_phone: String,
    pub owner_email: String,
}

pub async fn find_assignment_for_pair(
    conn: &mut SqliteConnection,
    property_id: i64,
    tenant_id: i64,
) -> Result<Option<TenantAssignment>, DbError> {
    let assignment = sqlx::query_as::<_, TenantAssignment>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM tenant_assignments WHERE property_id = ? AND tenant_id = ?"
    ))
    .bind(property_id)
    .bind(tenant_id)
    .fetch_optional(conn)
    .await?;
    Ok(assignment)
}

pub async fn insert_assignment(
    conn: &mut SqliteConnection,
    property_id: i64,
    tenant_id: i64,
    move_in_date: NaiveDate,
) -> Result<TenantAssignment, DbError> {
    let assignment = sqlx::query_as::<_, TenantAssignment>(&format!(
        r"
        INSERT INTO tenant_assignments (property_id, tenant_id, rent_status, move_in_date, created_at)
        VALUES (?, ?, 'pending', ?, CURRENT_TIMESTAMP)
        RETURNING {ASSIGNMENT_COLUMNS}
        "
    ))
    .bind(property_id)
    .bind(tenant_id)
    .bind(move_in_date)
    .fetch_one(conn)
    .await?;
    Ok(assignment)
}

pub async fn get_tenant_assignment(
    db: &DbContext,
    tenant_id: i64,
    assignment_id: i64,
) -> Result<TenantAssignment, DbError> {
    let assignment = sqlx::query_as::<_, TenantAssignment>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM tenant_assignments WHERE id = ? AND tenant_id = ?"
    ))
    .bind(assignment_id)
    .bind(tenant_id)
    .fetch_one(db)
    .await?;
    Ok(assignment)
}

pub async fn list_assignments_for_tenant(db: &DbContext, tenant_id: i64) -> Result<Vec<TenantAssignment>, DbError> {
    let assignments = sqlx::query_as::<_, TenantAssignment>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM tenant_assignments WHERE tenant_id = ? ORDER BY move_in_date DESC, id DESC"
    ))
    .bind(tenant_id)
    .fetch_all(db)
    .await?;
    Ok(assignments)
}

/// Rent status for the billing `(month, year)`, taken from completed payments.
const PERIOD_RENT_STATUS: &str = r"
    CASE WHEN EXISTS (
        SELECT 1 FROM payments pay
        WHERE pay.assignment_id = a.id AND pay.status = 'completed' AND pay.month = ? AND pay.year = ?
    ) THEN 'paid' ELSE 'pending' END";

pub async fn list_assigned_tenants_for_owner(
    db: &DbContext,
    owner_id: i64,
    period: (u32, i32),
) -> Result<Vec<AssignedTenant>, DbError> {
    let (month, year) = period;
    let tenants = sqlx::query_as::<_, AssignedTenant>(&format!(
        r"
        SELECT a.id AS assignment_id, p.id AS property_id, p.name AS property_name, p.rent_amount,
               u.id AS tenant_id, u.full_name AS tenant_name, u.email AS tenant_email, u.phone AS tenant_phone,
               {PERIOD_RENT_STATUS} AS rent_status, a.move_in_date
        FROM tenant_assignments a
        JOIN properties p ON p.id = a.property_id
        JOIN users u ON u.id = a.tenant_id
        WHERE p.owner_id = ?
        ORDER BY p.name, u.full_name, a.id
        "
    ))
    .bind(month)
    .bind(year)
    .bind(owner_id)
    .fetch_all(db)
    .await?;
    Ok(tenants)
}

pub async fn list_agreements_for_tenant(
    db: &DbContext,
    tenant_id: i64,
    period: (u32, i32),
) -> Result<Vec<TenantAgreement>, DbError> {
    let (month, year) = period;
    let agreements = sqlx::query_as::<_, TenantAgreement>(&format!(
        r"
        SELECT a.id AS assignment_id, p.id AS property_id, p.name AS property_name, p.address, p.city, p.state,
               p.rent_amount, {PERIOD_RENT_STATUS} AS rent_status, a.move_in_date,
               o.full_name AS owner_name, o.phone AS owner_phone, o.email AS owner_email
        FROM tenant_assignments a
        JOIN properties p ON p.id = a.property_id
        JOIN users o ON o.id = p.owner_id
        WHERE a.tenant_id = ?
        ORDER BY a.move_in_date DESC, a.id DESC
        "
    ))
    .bind(month)
    .bind(year)
    .bind(tenant_id)
    .fetch_all(db)
    .await?;
    Ok(agreements)
}

pub async fn set_rent_status(conn: &mut SqliteConnection, assignment_id: i64, status: RentStatus) -> Result<(), DbError> {
    sqlx::query("UPDATE tenant_assignments SET rent_status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(assignment_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn count_assignments_for_property(db: &DbContext, property_id: i64) -> Result<i64, DbError> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM tenant_assignments WHERE property_id = ?")
        .bind(property_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

/// Monthly rent of every assignment with no completed payment for `period`.
pub async fn sum_pending_rent(db: &DbContext, period: (u32, i32)) -> Result<f64, DbError> {
    let (month, year) = period;
    let total: f64 = sqlx::query_scalar(
        r"
        SELECT CAST(COALESCE(SUM(p.rent_amount), 0) AS REAL)
        FROM tenant_assignments a
        JOIN properties p ON p.id = a.property_id
        WHERE NOT EXISTS (
            SELECT 1 FROM payments pay
            WHERE pay.assignment_id = a.id AND pay.status = 'completed' AND pay.month = ? AND pay.year = ?
        )
        ",
    )
    .bind(month)
    .bind(year)
    .fetch_one(db)
    .await?;
    Ok(total)
}
