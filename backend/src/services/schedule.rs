use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    Paid,
    Overdue,
    Upcoming,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Installment {
    pub month: u32,
    pub year: i32,
    pub label: String,
    pub due_date: NaiveDate,
    pub amount: f64,
    pub status: InstallmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RentSchedule {
    /// Newest month first.
    pub installments: Vec<Installment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due: Option<NextDue>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NextDue {
    pub due_date: NaiveDate,
    pub amount: f64,
    /// Negative once the due date has passed.
    pub days_left: i64,
}

/// Payment already recorded for a billing month.
#[derive(Clone, Debug)]
pub struct PaidMonth {
    pub month: u32,
    pub year: i32,
    pub receipt_id: String,
}

/// Rent is due on the first of each month, except in the move-in month where
/// it is due on the move-in date. The schedule runs from the move-in month
/// through the month after `today`.
#[must_use]
pub fn build_schedule(move_in: NaiveDate, today: NaiveDate, rent: f64, paid: &[PaidMonth]) -> RentSchedule {
    let mut installments = Vec::new();
    let Some(last) = first_of_month(today).checked_add_months(Months::new(1)) else {
        return RentSchedule { installments, next_due: None };
    };

    let mut cursor = first_of_month(move_in);
    while cursor <= last {
        let due_date = if cursor == first_of_month(move_in) { move_in } else { cursor };
        let receipt = paid
            .iter()
            .find(|p| p.month == cursor.month() && p.year == cursor.year())
            .map(|p| p.receipt_id.clone());
        let status = match receipt {
            Some(_) => InstallmentStatus::Paid,
            None if due_date < today => InstallmentStatus::Overdue,
            None => InstallmentStatus::Upcoming,
        };
        installments.push(Installment {
            month: cursor.month(),
            year: cursor.year(),
            label: cursor.format("%B %Y").to_string(),
            due_date,
            amount: rent,
            status,
            receipt_id: receipt,
        });

        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }

    let next_due = installments
        .iter()
        .find(|i| i.status != InstallmentStatus::Paid)
        .map(|i| NextDue {
            due_date: i.due_date,
            amount: i.amount,
            days_left: (i.due_date - today).num_days(),
        });

    installments.reverse();
    RentSchedule { installments, next_due }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
