//! Audit log endpoint

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::audit_log::{AuditLogEntry, AuditLogQuery},
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List audit entries, newest first
#[utoipa::path(
    get,
    path = "/audit-logs",
    tag = "audit",
    security(("bearer_auth" = [])),
    params(AuditLogQuery),
    responses(
        (status = 200, description = "Audit entries", body = PaginatedResponse<AuditLogEntry>),
        (status = 403, description = "Administrators only")
    )
)]
pub async fn list_audit_logs(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AuditLogQuery>,
) -> AppResult<Json<PaginatedResponse<AuditLogEntry>>> {
    claims.require_admin()?;

    let (entries, total) = state.services.audit.list(&query).await?;
    Ok(Json(PaginatedResponse::new(entries, total, query.page, query.per_page)))
}
