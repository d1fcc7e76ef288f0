use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::auth::ParseEnumError;
use crate::core::{DbContext, DbError};

const PAYMENT_COLUMNS: &str =
    "id, tenant_id, assignment_id, property_id, amount, method, status, receipt_id, month, year, created_at";

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum PaymentMethod {
    Upi,
    Card,
    NetBanking,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upi => "upi",
            Self::Card => "card",
            Self::NetBanking => "net_banking",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upi => "UPI",
            Self::Card => "Card",
            Self::NetBanking => "Net Banking",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts both the stored names and the labels shown to users.
impl FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "upi" => Ok(Self::Upi),
            "card" => Ok(Self::Card),
            "net_banking" | "netbanking" => Ok(Self::NetBanking),
            _ => Err(ParseEnumError::new("payment method", s)),
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseEnumError::new("payment status", s)),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Debug, Serialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub tenant_id: i64,
    pub assignment_id: i64,
    pub property_id: i64,
    pub amount: f64,
    #[sqlx(try_from = "String")]
    pub method: PaymentMethod,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub receipt_id: String,
    pub month: u32,
    pub year: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug)]
pub struct NewPayment {
    pub tenant_id: i64,
    pub assignment_id: i64,
    pub property_id: i64,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub receipt_id: String,
    pub month: u32,
    pub year: i32,
}

/// Payment joined with its property, as listed in the tenant's receipts.
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct Receipt {
    pub id: i64,
    pub receipt_id: String,
    pub property_id: i64,
    pub property_name: String,
    pub amount: f64,
    #[sqlx(try_from = "String")]
    pub method: PaymentMethod,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub month: u32,
    pub year: i32,
    pub created_at: NaiveDateTime,
}

/// Payment received on one of the owner's properties.
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct IncomingPayment {
    pub id: i64,
    pub receipt_id: String,
    pub property_id: i64,
    pub property_name: String,
    pub tenant_name: String,
    pub amount: f64,
    #[sqlx(try_from = "String")]
    pub method: PaymentMethod,
    pub month: u32,
    pub year: i32,
    pub created_at: NaiveDateTime,
}

pub async fn insert_payment(conn: &mut SqliteConnection, new_payment: &NewPayment) -> Result<Payment, DbError> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        r"
        INSERT INTO payments
            (tenant_id, assignment_id, property_id, amount, method, status, receipt_id, month, year, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        RETURNING {PAYMENT_COLUMNS}
        "
    ))
    .bind(new_payment.tenant_id)
    .bind(new_payment.assignment_id)
    .bind(new_payment.property_id)
    .bind(new_payment.amount)
    .bind(new_payment.method.as_str())
    .bind(new_payment.status.as_str())
    .bind(&new_payment.receipt_id)
    .bind(new_payment.month)
    .bind(new_payment.year)
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

pub async fn list_receipts_for_tenant(db: &DbContext, tenant_id: i64) -> Result<Vec<Receipt>, DbError> {
    let receipts = sqlx::query_as::<_, Receipt>(
        r"
        SELECT pay.id, pay.receipt_id, pay.property_id, p.name AS property_name, pay.amount, pay.method,
               pay.status, pay.month, pay.year, pay.created_at
        FROM payments pay
        JOIN properties p ON p.id = pay.property_id
        WHERE pay.tenant_id = ?
        ORDER BY pay.created_at DESC, pay.id DESC
        ",
    )
    .bind(tenant_id)
    .fetch_all(db)
    .await?;
    Ok(receipts)
}

pub async fn list_payments_for_assignment(db: &DbContext, assignment_id: i64) -> Result<Vec<Payment>, DbError> {
    let payments = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE assignment_id = ? ORDER BY year, month, id"
    ))
    .bind(assignment_id)
    .fetch_all(db)
    .await?;
    Ok(payments)
}

/// Completed payments received on properties owned by `owner_id`.
pub async fn list_payments_for_owner(db: &DbContext, owner_id: i64) -> Result<Vec<IncomingPayment>, DbError> {
    let payments = sqlx::query_as::<_, IncomingPayment>(
        r"
        SELECT pay.id, pay.receipt_id, pay.property_id, p.name AS property_name, u.full_name AS tenant_name,
               pay.amount, pay.method, pay.month, pay.year, pay.created_at
        FROM payments pay
        JOIN properties p ON p.id = pay.property_id
        JOIN users u ON u.id = pay.tenant_id
        WHERE p.owner_id = ? AND pay.status = 'completed'
        ORDER BY pay.created_at DESC, pay.id DESC
        ",
    )
    .bind(owner_id)
    .fetch_all(db)
    .await?;
    Ok(payments)
}

/// Total of completed payments, optionally restricted to one billing month.
pub async fn sum_completed_payments(db: &DbContext, period: Option<(u32, i32)>) -> Result<f64, DbError> {
    let (month, year) = period.unzip();
    let total: f64 = sqlx::query_scalar(
        r"
        SELECT CAST(COALESCE(SUM(amount), 0) AS REAL)
        FROM payments
        WHERE status = 'completed'
          AND (? IS NULL OR month = ?)
          AND (? IS NULL OR year = ?)
        ",
    )
    .bind(month)
    .bind(month)
    .bind(year)
    .bind(year)
    .fetch_one(db)
    .await?;
    Ok(total)
}

pub async fn count_payments(db: &DbContext) -> Result<i64, DbError> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM payments").fetch_one(db).await?;
    Ok(count)
}
