//! Loan lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        loan::{Loan, LoanDetails, LoanQuery},
        loan_return::LoanReturn,
    },
    repository::loans::ReturnOutcome,
    services::loans::LoanSubmission,
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Submit loan request
#[derive(Deserialize, ToSchema)]
pub struct SubmitLoanRequest {
    /// Tool to borrow
    pub tool_id: Option<i32>,
    /// Due date (YYYY-MM-DD)
    pub due_date: Option<String>,
}

/// Return response with the closed loan and its ledger entry
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub loan: Loan,
    #[serde(rename = "return")]
    pub record: LoanReturn,
    /// Tool stock after the unit was put back
    pub stock: i32,
}

impl From<ReturnOutcome> for ReturnResponse {
    fn from(outcome: ReturnOutcome) -> Self {
        Self {
            loan: outcome.loan,
            record: outcome.record,
            stock: outcome.stock,
        }
    }
}

/// Submit a loan request for the current user
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = SubmitLoanRequest,
    responses(
        (status = 201, description = "Loan submitted, pending approval", body = Loan),
        (status = 400, description = "Missing or malformed field", body = crate::error::ErrorResponse),
        (status = 404, description = "Tool not found")
    )
)]
pub async fn submit_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<SubmitLoanRequest>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let submission = LoanSubmission {
        tool_id: request.tool_id,
        due_date: request.due_date,
    };

    let loan = state.services.loans.submit(claims.user_id, submission).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// List all loans (staff)
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans", body = PaginatedResponse<LoanDetails>),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<PaginatedResponse<LoanDetails>>> {
    claims.require_staff()?;

    let (loans, total) = state.services.loans.list(&query).await?;
    Ok(Json(PaginatedResponse::new(loans, total, query.page, query.per_page)))
}

/// List the current user's loans
#[utoipa::path(
    get,
    path = "/loans/mine",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loans of the current user", body = Vec<LoanDetails>)
    )
)]
pub async fn my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.list_mine(claims.user_id).await?;
    Ok(Json(loans))
}

/// Get one loan
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.get(&claims, loan_id).await?;
    Ok(Json(loan))
}

/// Approve a pending loan
#[utoipa::path(
    post,
    path = "/loans/{id}/approve",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan approved", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan not pending or tool out of stock", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<Loan>> {
    claims.require_staff()?;

    let loan = state.services.loans.approve(claims.user_id, loan_id).await?;
    Ok(Json(loan))
}

/// Reject a pending loan
#[utoipa::path(
    post,
    path = "/loans/{id}/reject",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan rejected", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan not pending")
    )
)]
pub async fn reject_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<Loan>> {
    claims.require_staff()?;

    let loan = state.services.loans.reject(claims.user_id, loan_id).await?;
    Ok(Json(loan))
}

/// Ask staff to confirm the return of one of the caller's loans
#[utoipa::path(
    post,
    path = "/loans/{id}/request-return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Return requested", body = Loan),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan not approved")
    )
)]
pub async fn request_return(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.request_return(claims.user_id, loan_id).await?;
    Ok(Json(loan))
}

/// Return one of the caller's approved loans
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan returned", body = ReturnResponse),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan not approved")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    let outcome = state.services.loans.return_by_borrower(claims.user_id, loan_id).await?;
    Ok(Json(outcome.into()))
}

/// Confirm the return of an approved or pending_return loan
#[utoipa::path(
    post,
    path = "/loans/{id}/confirm-return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan returned", body = ReturnResponse),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan not out")
    )
)]
pub async fn confirm_return(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    claims.require_staff()?;

    let outcome = state.services.loans.confirm_return(claims.user_id, loan_id).await?;
    Ok(Json(outcome.into()))
}
