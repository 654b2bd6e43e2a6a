//! Read-only aggregations for the dashboard and reports

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::AppResult,
    models::report::{CategoryCount, DailyCount, Dashboard, StatusCount},
};

#[derive(Clone)]
pub struct ReportsRepository {
    pool: Pool<Postgres>,
}

impl ReportsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Dashboard counters; loans still out past their due date as of `today` count as overdue
    pub async fn dashboard(&self, today: NaiveDate) -> AppResult<Dashboard> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tools) AS tools,
                (SELECT COALESCE(SUM(stock), 0)::bigint FROM tools) AS total_stock,
                (SELECT COUNT(*) FROM categories) AS categories,
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM loans
                 WHERE status IN ('approved', 'pending_return') AND due_date < $1) AS overdue_loans,
                (SELECT COALESCE(SUM(late_fee), 0) FROM returns) AS total_late_fees
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        let loans_by_status = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM loans GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(Dashboard {
            tools: row.get("tools"),
            total_stock: row.get("total_stock"),
            categories: row.get("categories"),
            users: row.get("users"),
            loans_by_status,
            overdue_loans: row.get("overdue_loans"),
            total_late_fees: row.get::<Decimal, _>("total_late_fees"),
        })
    }

    /// Loans submitted per day between two dates (inclusive)
    pub async fn loans_by_day(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<DailyCount>> {
        let rows = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT borrowed_on AS day, COUNT(*) AS count
            FROM loans
            WHERE borrowed_on BETWEEN $1 AND $2
            GROUP BY borrowed_on
            ORDER BY borrowed_on
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Loans per category between two dates (inclusive), busiest first
    pub async fn loans_by_category(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<CategoryCount>> {
        let rows = sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT c.id AS category_id, c.name AS category_name, COUNT(l.id) AS count
            FROM categories c
            LEFT JOIN tools t ON t.category_id = c.id
            LEFT JOIN loans l ON l.tool_id = t.id AND l.borrowed_on BETWEEN $1 AND $2
            GROUP BY c.id, c.name
            ORDER BY count DESC, c.name
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
