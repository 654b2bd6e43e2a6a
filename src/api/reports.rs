//! Reporting endpoints (staff)

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::report::{CategoryCount, DailyCount, Dashboard, DateRangeQuery},
};

use super::AuthenticatedUser;

/// Inventory and loan counters
#[utoipa::path(
    get,
    path = "/reports/dashboard",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard counters", body = Dashboard),
        (status = 403, description = "Staff only")
    )
)]
pub async fn dashboard(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Dashboard>> {
    claims.require_staff()?;

    let dashboard = state.services.reports.dashboard().await?;
    Ok(Json(dashboard))
}

/// Loans submitted per day
#[utoipa::path(
    get,
    path = "/reports/loans-by-day",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Daily loan counts", body = Vec<DailyCount>),
        (status = 400, description = "Invalid range")
    )
)]
pub async fn loans_by_day(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<DailyCount>>> {
    claims.require_staff()?;

    let rows = state.services.reports.loans_by_day(&query).await?;
    Ok(Json(rows))
}

/// Loans submitted per category
#[utoipa::path(
    get,
    path = "/reports/loans-by-category",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Loan counts per category", body = Vec<CategoryCount>),
        (status = 400, description = "Invalid range")
    )
)]
pub async fn loans_by_category(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<CategoryCount>>> {
    claims.require_staff()?;

    let rows = state.services.reports.loans_by_category(&query).await?;
    Ok(Json(rows))
}
