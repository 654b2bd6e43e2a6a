//! Reporting aggregates

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Loan count for one status
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StatusCount {
    pub status: super::loan::LoanStatus,
    pub count: i64,
}

/// Dashboard counters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Dashboard {
    pub tools: i64,
    /// Units currently on the shelf across all tools
    pub total_stock: i64,
    pub categories: i64,
    pub users: i64,
    pub loans_by_status: Vec<StatusCount>,
    /// Loans out past their due date
    pub overdue_loans: i64,
    pub total_late_fees: Decimal,
}

/// Loans submitted on one day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: i64,
}

/// Loans per category
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CategoryCount {
    pub category_id: i32,
    pub category_name: String,
    pub count: i64,
}

/// Date range for time series reports (defaults to the last 30 days)
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    /// Start date (YYYY-MM-DD)
    pub from: Option<NaiveDate>,
    /// End date (YYYY-MM-DD)
    pub to: Option<NaiveDate>,
}
