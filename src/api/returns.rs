//! Returns ledger endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{error::AppResult, models::loan_return::ReturnDetails};

use super::{AuthenticatedUser, PaginatedResponse};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReturnsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// List recorded returns, newest first
#[utoipa::path(
    get,
    path = "/returns",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(ReturnsQuery),
    responses(
        (status = 200, description = "Returns ledger", body = PaginatedResponse<ReturnDetails>),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_returns(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReturnsQuery>,
) -> AppResult<Json<PaginatedResponse<ReturnDetails>>> {
    claims.require_staff()?;

    let (returns, total) = state.services.loans.list_returns(query.page, query.per_page).await?;
    Ok(Json(PaginatedResponse::new(returns, total, query.page, query.per_page)))
}
