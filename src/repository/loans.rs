//! Loans repository: loan ledger and the transactional lifecycle transitions

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgConnection, Pool, Postgres};

use super::{paginate, tools::ToolsRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{CreateLoan, Loan, LoanDetails, LoanQuery, LoanStatus},
        loan_return::{self, LoanReturn, ReturnInitiator},
    },
};

/// Loan details query; `$1` is the current date used for `is_overdue`
const DETAILS_SELECT: &str = r#"
    SELECT l.id, l.user_id, u.login AS user_login, u.full_name AS user_full_name,
           l.tool_id, t.name AS tool_name, c.name AS category_name,
           l.borrowed_on, l.due_date, l.returned_on, l.status,
           r.late_fee,
           (l.status IN ('approved', 'pending_return') AND l.due_date < $1) AS is_overdue,
           l.created_at
    FROM loans l
    JOIN users u ON u.id = l.user_id
    JOIN tools t ON t.id = l.tool_id
    JOIN categories c ON c.id = t.category_id
    LEFT JOIN returns r ON r.loan_id = l.id
"#;

/// Parameters of the return transition
#[derive(Debug, Clone)]
pub struct ReturnLoan {
    pub initiated_by: ReturnInitiator,
    /// User performing the return
    pub processed_by: Option<i32>,
    /// When set, the loan must belong to this user
    pub owner_id: Option<i32>,
    pub returned_on: NaiveDate,
    pub late_fee_per_day: Decimal,
}

/// Result of a completed return
#[derive(Debug, Clone)]
pub struct ReturnOutcome {
    pub loan: Loan,
    pub record: LoanReturn,
    pub stock: i32,
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan with borrower and tool details
    pub async fn get_details(&self, id: i32, today: NaiveDate) -> AppResult<LoanDetails> {
        let q = format!("{} WHERE l.id = $2", DETAILS_SELECT);
        sqlx::query_as::<_, LoanDetails>(&q)
            .bind(today)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// List loans with optional filters and pagination, newest first
    pub async fn list(&self, query: &LoanQuery, today: NaiveDate) -> AppResult<(Vec<LoanDetails>, i64)> {
        let (_, per_page, offset) = paginate(query.page, query.per_page);

        // Placeholders start after the ones already used by the statement
        let where_clause = |mut idx: usize| {
            let mut conditions = Vec::new();
            if query.status.is_some() {
                conditions.push(format!("l.status = ${}", idx));
                idx += 1;
            }
            if query.user_id.is_some() {
                conditions.push(format!("l.user_id = ${}", idx));
                idx += 1;
            }
            if query.tool_id.is_some() {
                conditions.push(format!("l.tool_id = ${}", idx));
            }

            if conditions.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", conditions.join(" AND "))
            }
        };

        let count_q = format!("SELECT COUNT(*) FROM loans l {}", where_clause(1));
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(status) = query.status { count_builder = count_builder.bind(status); }
        if let Some(uid) = query.user_id { count_builder = count_builder.bind(uid); }
        if let Some(tid) = query.tool_id { count_builder = count_builder.bind(tid); }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "{} {} ORDER BY l.created_at DESC, l.id DESC LIMIT {} OFFSET {}",
            DETAILS_SELECT,
            where_clause(2),
            per_page,
            offset
        );
        let mut builder = sqlx::query_as::<_, LoanDetails>(&select_q).bind(today);
        if let Some(status) = query.status { builder = builder.bind(status); }
        if let Some(uid) = query.user_id { builder = builder.bind(uid); }
        if let Some(tid) = query.tool_id { builder = builder.bind(tid); }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    /// All loans of one user, newest first
    pub async fn list_for_user(&self, user_id: i32, today: NaiveDate) -> AppResult<Vec<LoanDetails>> {
        let q = format!(
            "{} WHERE l.user_id = $2 ORDER BY l.created_at DESC, l.id DESC",
            DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, LoanDetails>(&q)
            .bind(today)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Insert a pending loan. Stock is not checked here, only at approval.
    pub async fn create(&self, loan: &CreateLoan) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, tool_id, borrowed_on, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(loan.user_id)
        .bind(loan.tool_id)
        .bind(loan.borrowed_on)
        .bind(loan.due_date)
        .bind(LoanStatus::Pending)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::NotFound(format!("Tool {} not found", loan.tool_id))
            }
            _ => AppError::Database(e),
        })
    }

    /// Lock a loan row for the rest of the transaction
    async fn lock(conn: &mut PgConnection, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    async fn set_status(conn: &mut PgConnection, id: i32, status: LoanStatus) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(loan)
    }

    /// pending → approved, taking one unit of stock. Returns the loan and
    /// the tool's remaining stock.
    pub async fn approve(&self, id: i32) -> AppResult<(Loan, i32)> {
        let mut tx = self.pool.begin().await?;

        let loan = Self::lock(&mut tx, id).await?;
        loan.status.ensure_transition(id, LoanStatus::Approved)?;

        let stock = ToolsRepository::take_unit(&mut tx, loan.tool_id)
            .await?
            .ok_or_else(|| {
                AppError::InsufficientStock(format!(
                    "Tool {} has no stock left to approve loan {}",
                    loan.tool_id, id
                ))
            })?;

        let loan = Self::set_status(&mut tx, id, LoanStatus::Approved).await?;

        tx.commit().await?;
        Ok((loan, stock))
    }

    /// pending → rejected. No stock was reserved, so none is released.
    pub async fn reject(&self, id: i32) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let loan = Self::lock(&mut tx, id).await?;
        loan.status.ensure_transition(id, LoanStatus::Rejected)?;
        let loan = Self::set_status(&mut tx, id, LoanStatus::Rejected).await?;

        tx.commit().await?;
        Ok(loan)
    }

    /// approved → pending_return, requested by the borrower
    pub async fn request_return(&self, id: i32, owner_id: i32) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let loan = Self::lock(&mut tx, id).await?;
        if loan.user_id != owner_id {
            return Err(AppError::NotFound(format!("Loan with id {} not found", id)));
        }
        loan.status.ensure_transition(id, LoanStatus::PendingReturn)?;
        let loan = Self::set_status(&mut tx, id, LoanStatus::PendingReturn).await?;

        tx.commit().await?;
        Ok(loan)
    }

    /// Close a loan: mark it returned, record the return with its late fee and
    /// put the unit back into stock, all in one transaction.
    pub async fn complete_return(&self, id: i32, params: &ReturnLoan) -> AppResult<ReturnOutcome> {
        let mut tx = self.pool.begin().await?;

        let loan = Self::lock(&mut tx, id).await?;

        if let Some(owner_id) = params.owner_id {
            if loan.user_id != owner_id {
                return Err(AppError::NotFound(format!("Loan with id {} not found", id)));
            }
        }

        if !params.initiated_by.accepts(loan.status) {
            return Err(AppError::InvalidState(format!(
                "Loan {} cannot be returned by {} while its status is {}",
                id, params.initiated_by, loan.status
            )));
        }

        let days_late = loan_return::days_late(loan.due_date, params.returned_on);
        let fee = loan_return::late_fee(loan.due_date, params.returned_on, params.late_fee_per_day);

        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET status = $1, returned_on = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(LoanStatus::Returned)
        .bind(params.returned_on)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let record = sqlx::query_as::<_, LoanReturn>(
            r#"
            INSERT INTO returns (loan_id, returned_on, days_late, late_fee, initiated_by, processed_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(params.returned_on)
        .bind(days_late as i32)
        .bind(fee)
        .bind(params.initiated_by)
        .bind(params.processed_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::InvalidState(format!("Loan {} is already returned", id))
            }
            _ => AppError::Database(e),
        })?;

        let stock = ToolsRepository::put_back_unit(&mut tx, loan.tool_id).await?;

        tx.commit().await?;

        Ok(ReturnOutcome {
            loan: updated,
            record,
            stock,
        })
    }
}
