//! Loan lifecycle service

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    models::{
        audit_log::{AuditAction, NewAuditEntry},
        loan::{parse_due_date, CreateLoan, Loan, LoanDetails, LoanQuery},
        loan_return::{LoanReturn, ReturnDetails, ReturnInitiator},
        user::UserClaims,
    },
    repository::{
        loans::{ReturnLoan, ReturnOutcome},
        Repository,
    },
    services::{audit::AuditService, today},
};

/// Raw submission, fields are checked before anything touches the database
#[derive(Debug, Default, Clone)]
pub struct LoanSubmission {
    pub tool_id: Option<i32>,
    pub due_date: Option<String>,
}

impl LoanSubmission {
    /// Resolve into `(tool_id, due_date)`, naming every missing field
    pub fn validate(&self) -> AppResult<(i32, NaiveDate)> {
        let mut missing = Vec::new();
        if self.tool_id.is_none() {
            missing.push("tool_id");
        }
        let due = self.due_date.as_deref().map(str::trim).filter(|s| !s.is_empty());
        if due.is_none() {
            missing.push("due_date");
        }

        match (self.tool_id, due) {
            (Some(tool_id), Some(due)) => Ok((tool_id, parse_due_date(due)?)),
            _ => Err(AppError::Validation(format!(
                "Missing required field(s): {}",
                missing.join(", ")
            ))),
        }
    }
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    audit: AuditService,
    late_fee_per_day: Decimal,
}

impl LoansService {
    pub fn new(repository: Repository, audit: AuditService, late_fee_per_day: Decimal) -> Self {
        Self {
            repository,
            audit,
            late_fee_per_day,
        }
    }

    /// Submit a loan request for the caller. The loan starts pending and
    /// reserves no stock.
    pub async fn submit(&self, borrower_id: i32, submission: LoanSubmission) -> AppResult<Loan> {
        let (tool_id, due_date) = submission.validate()?;

        if !self.repository.tools.exists(tool_id).await? {
            return Err(AppError::NotFound(format!("Tool {} not found", tool_id)));
        }

        let loan = self
            .repository
            .loans
            .create(&CreateLoan {
                user_id: borrower_id,
                tool_id,
                borrowed_on: today(),
                due_date,
            })
            .await?;

        tracing::info!(loan_id = loan.id, user_id = borrower_id, tool_id, "Loan submitted");
        self.audit
            .record(
                NewAuditEntry::new(Some(borrower_id), AuditAction::LoanSubmit)
                    .target(loan.id)
                    .details(json!({ "tool_id": tool_id, "due_date": due_date })),
            )
            .await;

        Ok(loan)
    }

    /// Approve a pending loan, taking one unit of the tool's stock
    pub async fn approve(&self, staff_id: i32, loan_id: i32) -> AppResult<Loan> {
        let (loan, stock) = self.repository.loans.approve(loan_id).await?;

        tracing::info!(loan_id, tool_id = loan.tool_id, stock, "Loan approved");
        self.audit
            .record(
                NewAuditEntry::new(Some(staff_id), AuditAction::LoanApprove)
                    .target(loan_id)
                    .details(json!({ "tool_id": loan.tool_id, "stock_after": stock })),
            )
            .await;

        Ok(loan)
    }

    /// Reject a pending loan
    pub async fn reject(&self, staff_id: i32, loan_id: i32) -> AppResult<Loan> {
        let loan = self.repository.loans.reject(loan_id).await?;

        tracing::info!(loan_id, "Loan rejected");
        self.audit
            .record(
                NewAuditEntry::new(Some(staff_id), AuditAction::LoanReject)
                    .target(loan_id)
                    .details(json!({ "tool_id": loan.tool_id })),
            )
            .await;

        Ok(loan)
    }

    /// Borrower asks staff to confirm the return of an approved loan
    pub async fn request_return(&self, borrower_id: i32, loan_id: i32) -> AppResult<Loan> {
        let loan = self.repository.loans.request_return(loan_id, borrower_id).await?;

        tracing::info!(loan_id, user_id = borrower_id, "Return requested");
        self.audit
            .record(
                NewAuditEntry::new(Some(borrower_id), AuditAction::LoanReturnRequest)
                    .target(loan_id)
                    .details(json!({ "tool_id": loan.tool_id })),
            )
            .await;

        Ok(loan)
    }

    /// Borrower returns their own approved loan directly
    pub async fn return_by_borrower(&self, borrower_id: i32, loan_id: i32) -> AppResult<ReturnOutcome> {
        self.complete_return(
            loan_id,
            ReturnLoan {
                initiated_by: ReturnInitiator::Borrower,
                processed_by: Some(borrower_id),
                owner_id: Some(borrower_id),
                returned_on: today(),
                late_fee_per_day: self.late_fee_per_day,
            },
        )
        .await
    }

    /// Staff confirms the return of an approved or pending_return loan
    pub async fn confirm_return(&self, staff_id: i32, loan_id: i32) -> AppResult<ReturnOutcome> {
        self.complete_return(
            loan_id,
            ReturnLoan {
                initiated_by: ReturnInitiator::Staff,
                processed_by: Some(staff_id),
                owner_id: None,
                returned_on: today(),
                late_fee_per_day: self.late_fee_per_day,
            },
        )
        .await
    }

    async fn complete_return(&self, loan_id: i32, params: ReturnLoan) -> AppResult<ReturnOutcome> {
        let outcome = self.repository.loans.complete_return(loan_id, &params).await?;
        let record: &LoanReturn = &outcome.record;
        let (days_late, late_fee) = (record.days_late, record.late_fee);

        tracing::info!(
            loan_id,
            initiated_by = %params.initiated_by,
            days_late,
            late_fee = %late_fee,
            stock = outcome.stock,
            "Loan returned"
        );
        self.audit
            .record(
                NewAuditEntry::new(params.processed_by, AuditAction::LoanReturn)
                    .target(loan_id)
                    .details(json!({
                        "tool_id": outcome.loan.tool_id,
                        "initiated_by": params.initiated_by.as_str(),
                        "returned_on": record.returned_on,
                        "days_late": days_late,
                        "late_fee": late_fee,
                        "stock_after": outcome.stock,
                    })),
            )
            .await;

        Ok(outcome)
    }

    /// Get one loan; borrowers only see their own
    pub async fn get(&self, claims: &UserClaims, loan_id: i32) -> AppResult<LoanDetails> {
        let loan = self.repository.loans.get_details(loan_id, today()).await?;
        if !claims.owns_or_staff(loan.user_id) {
            return Err(AppError::NotFound(format!("Loan with id {} not found", loan_id)));
        }
        Ok(loan)
    }

    /// List loans with filters (staff view)
    pub async fn list(&self, query: &LoanQuery) -> AppResult<(Vec<LoanDetails>, i64)> {
        self.repository.loans.list(query, today()).await
    }

    /// The caller's loans, newest first
    pub async fn list_mine(&self, user_id: i32) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_for_user(user_id, today()).await
    }

    /// Returns ledger, newest first
    pub async fn list_returns(&self, page: Option<i64>, per_page: Option<i64>) -> AppResult<(Vec<ReturnDetails>, i64)> {
        self.repository.returns.list(page, per_page).await
    }
}
