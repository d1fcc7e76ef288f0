use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::auth::Role;
use crate::core::{DbContext, DbError};
use crate::db::{self, AssignedTenant, Expense, IncomingPayment, Property, PropertyStatus, RentStatus};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FinanceSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_income: f64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub description: String,
    pub property_name: String,
    pub amount: f64,
    pub date: NaiveDate,
}

#[derive(Clone, Debug, Serialize)]
pub struct OwnerFinance {
    pub summary: FinanceSummary,
    pub transactions: Vec<Transaction>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub month: u32,
    pub year: i32,
    pub income: f64,
    pub expenses: f64,
    pub net_income: f64,
    pub paid_tenants: usize,
    pub total_tenants: usize,
    pub occupied_properties: usize,
    pub total_properties: usize,
    /// Percentage of properties that are occupied, rounded to a whole number.
    pub occupancy_rate: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlatformReport {
    pub total_properties: usize,
    pub total_owners: i64,
    pub total_tenants: i64,
    pub total_admins: i64,
    pub total_payments: i64,
    pub total_paid_rent: f64,
    pub total_pending_rent: f64,
    pub monthly_revenue: f64,
    pub total_expenses: f64,
    pub active_banners: usize,
    pub active_services: usize,
}

#[must_use]
pub fn summarize(payments: &[IncomingPayment], expenses: &[Expense]) -> FinanceSummary {
    let total_income = total(payments.iter().map(|p| p.amount));
    let total_expenses = total(expenses.iter().map(|e| e.amount));
    FinanceSummary {
        total_income,
        total_expenses,
        net_income: total_income - total_expenses,
    }
}

/// Income and expenses merged into one feed, newest first.
#[must_use]
pub fn transactions(payments: &[IncomingPayment], expenses: &[Expense]) -> Vec<Transaction> {
    let income = payments.iter().map(|p| Transaction {
        kind: TransactionKind::Income,
        description: format!("Rent from {}", p.tenant_name),
        property_name: p.property_name.clone(),
        amount: p.amount,
        date: p.created_at.date(),
    });
    let spent = expenses.iter().map(|e| Transaction {
        kind: TransactionKind::Expense,
        description: e.description.clone(),
        property_name: e.property_name.clone(),
        amount: e.amount,
        date: e.spent_on,
    });
    let mut feed: Vec<Transaction> = income.chain(spent).collect();
    feed.sort_by(|a, b| b.date.cmp(&a.date));
    feed
}

#[must_use]
pub fn monthly_report(
    month: u32,
    year: i32,
    payments: &[IncomingPayment],
    expenses: &[Expense],
    properties: &[Property],
    tenants: &[AssignedTenant],
) -> MonthlyReport {
    let income = total(
        payments
            .iter()
            .filter(|p| p.month == month && p.year == year)
            .map(|p| p.amount),
    );
    let spent = total(
        expenses
            .iter()
            .filter(|e| e.spent_on.month() == month && e.spent_on.year() == year)
            .map(|e| e.amount),
    );
    let occupied = properties
        .iter()
        .filter(|p| p.status == PropertyStatus::Occupied)
        .count();

    MonthlyReport {
        month,
        year,
        income,
        expenses: spent,
        net_income: income - spent,
        paid_tenants: tenants.iter().filter(|t| t.rent_status == RentStatus::Paid).count(),
        total_tenants: tenants.len(),
        occupied_properties: occupied,
        total_properties: properties.len(),
        occupancy_rate: percentage(occupied, properties.len()),
    }
}

/// Starts from `0.0`; `Iterator::sum` of no floats is `-0.0`.
fn total(amounts: impl Iterator<Item = f64>) -> f64 {
    amounts.fold(0.0, |acc, amount| acc + amount)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 * 100.0 / whole as f64).round() as u32
}

pub async fn owner_finance(db: &DbContext, owner_id: i64) -> Result<OwnerFinance, DbError> {
    let payments = db::list_payments_for_owner(db, owner_id).await?;
    let expenses = db::list_expenses_by_owner(db, owner_id).await?;
    Ok(OwnerFinance {
        summary: summarize(&payments, &expenses),
        transactions: transactions(&payments, &expenses),
    })
}

pub async fn owner_monthly_report(db: &DbContext, owner_id: i64, month: u32, year: i32) -> Result<MonthlyReport, DbError> {
    let payments = db::list_payments_for_owner(db, owner_id).await?;
    let expenses = db::list_expenses_by_owner(db, owner_id).await?;
    let properties = db::list_properties_by_owner(db, owner_id).await?;
    let tenants = db::list_assigned_tenants_for_owner(db, owner_id, (month, year)).await?;
    Ok(monthly_report(month, year, &payments, &expenses, &properties, &tenants))
}

pub async fn platform_report(db: &DbContext, today: NaiveDate) -> Result<PlatformReport, DbError> {
    let role_counts = db::count_users_by_role(db).await?;
    let count_of = |role: Role| {
        role_counts
            .iter()
            .find(|(r, _)| *r == role)
            .map_or(0, |(_, count)| *count)
    };

    let properties = db::list_property_overview(db).await?;
    let banners = db::list_banners(db).await?;
    let services = db::list_service_cards(db).await?;

    Ok(PlatformReport {
        total_properties: properties.len(),
        total_owners: count_of(Role::Owner),
        total_tenants: count_of(Role::Tenant),
        total_admins: count_of(Role::Admin),
        total_payments: db::count_payments(db).await?,
        total_paid_rent: db::sum_completed_payments(db, None).await?,
        total_pending_rent: db::sum_pending_rent(db, (today.month(), today.year())).await?,
        monthly_revenue: db::sum_completed_payments(db, Some((today.month(), today.year()))).await?,
        total_expenses: db::sum_expenses(db).await?,
        active_banners: banners.iter().filter(|b| b.is_active).count(),
        active_services: services.iter().filter(|s| s.is_active).count(),
    })
}
