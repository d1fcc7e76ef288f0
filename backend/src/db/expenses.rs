use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{DbContext, DbError};

#[derive(Clone, Debug, Serialize, FromRow)]
pub struct Expense {
    pub id: i64,
    pub owner_id: i64,
    pub property_id: i64,
    pub property_name: String,
    pub description: String,
    pub amount: f64,
    pub spent_on: NaiveDate,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewExpense {
    pub property_id: i64,
    pub description: String,
    pub amount: f64,
    pub spent_on: Option<NaiveDate>,
}

const EXPENSE_SELECT: &str = r"
    SELECT e.id, e.owner_id, e.property_id, p.name AS property_name, e.description, e.amount, e.spent_on,
           e.created_at
    FROM expenses e
    JOIN properties p ON p.id = e.property_id
";

/// The caller checks that the property belongs to `owner_id`.
pub async fn create_expense(
    db: &DbContext,
    owner_id: i64,
    new_expense: &NewExpense,
    spent_on: NaiveDate,
) -> Result<Expense, DbError> {
    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO expenses (owner_id, property_id, description, amount, spent_on, created_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        RETURNING id
        ",
    )
    .bind(owner_id)
    .bind(new_expense.property_id)
    .bind(new_expense.description.trim())
    .bind(new_expense.amount)
    .bind(spent_on)
    .fetch_one(db)
    .await?;

    let expense = sqlx::query_as::<_, Expense>(&format!("{EXPENSE_SELECT} WHERE e.id = ?"))
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(expense)
}

pub async fn list_expenses_by_owner(db: &DbContext, owner_id: i64) -> Result<Vec<Expense>, DbError> {
    let expenses = sqlx::query_as::<_, Expense>(&format!(
        "{EXPENSE_SELECT} WHERE e.owner_id = ? ORDER BY e.spent_on DESC, e.id DESC"
    ))
    .bind(owner_id)
    .fetch_all(db)
    .await?;
    Ok(expenses)
}

pub async fn delete_expense(db: &DbContext, owner_id: i64, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND owner_id = ?")
        .bind(id)
        .bind(owner_id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::RowNotFound(sqlx::Error::RowNotFound));
    }
    Ok(())
}

pub async fn sum_expenses(db: &DbContext) -> Result<f64, DbError> {
    let total: f64 = sqlx::query_scalar("SELECT CAST(COALESCE(SUM(amount), 0) AS REAL) FROM expenses")
        .fetch_one(db)
        .await?;
    Ok(total)
}
