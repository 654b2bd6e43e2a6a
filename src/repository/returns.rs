//! Returns ledger repository

use sqlx::{Pool, Postgres};

use super::paginate;
use crate::{error::AppResult, models::loan_return::ReturnDetails};

#[derive(Clone)]
pub struct ReturnsRepository {
    pool: Pool<Postgres>,
}

impl ReturnsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List completed returns, newest first
    pub async fn list(&self, page: Option<i64>, per_page: Option<i64>) -> AppResult<(Vec<ReturnDetails>, i64)> {
        let (_, per_page, offset) = paginate(page, per_page);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM returns")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ReturnDetails>(
            r#"
            SELECT r.id, r.loan_id, l.user_id, u.login AS user_login,
                   l.tool_id, t.name AS tool_name,
                   l.borrowed_on, l.due_date, r.returned_on, r.days_late, r.late_fee,
                   r.initiated_by, r.processed_by, r.created_at
            FROM returns r
            JOIN loans l ON l.id = r.loan_id
            JOIN users u ON u.id = l.user_id
            JOIN tools t ON t.id = l.tool_id
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }
}
