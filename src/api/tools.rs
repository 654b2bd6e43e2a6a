//! Tool inventory endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::tool::{AdjustStock, CreateTool, Tool, ToolDetails, ToolQuery, UpdateTool},
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Stock after an adjustment
#[derive(Serialize, ToSchema)]
pub struct StockResponse {
    pub tool_id: i32,
    pub stock: i32,
}

/// List tools with filters and pagination
#[utoipa::path(
    get,
    path = "/tools",
    tag = "tools",
    security(("bearer_auth" = [])),
    params(ToolQuery),
    responses(
        (status = 200, description = "List of tools", body = PaginatedResponse<ToolDetails>)
    )
)]
pub async fn list_tools(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<ToolQuery>,
) -> AppResult<Json<PaginatedResponse<ToolDetails>>> {
    let (tools, total) = state.services.tools.list(&query).await?;
    Ok(Json(PaginatedResponse::new(tools, total, query.page, query.per_page)))
}

/// Get tool details
#[utoipa::path(
    get,
    path = "/tools/{id}",
    tag = "tools",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Tool ID")),
    responses(
        (status = 200, description = "Tool details", body = ToolDetails),
        (status = 404, description = "Tool not found")
    )
)]
pub async fn get_tool(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ToolDetails>> {
    let tool = state.services.tools.get(id).await?;
    Ok(Json(tool))
}

/// Create a tool
#[utoipa::path(
    post,
    path = "/tools",
    tag = "tools",
    security(("bearer_auth" = [])),
    request_body = CreateTool,
    responses(
        (status = 201, description = "Tool created", body = Tool),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn create_tool(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateTool>,
) -> AppResult<(StatusCode, Json<Tool>)> {
    claims.require_admin()?;
    let data = data.normalized();
    data.validate()?;

    let tool = state.services.tools.create(claims.user_id, data).await?;
    Ok((StatusCode::CREATED, Json(tool)))
}

/// Update a tool
#[utoipa::path(
    put,
    path = "/tools/{id}",
    tag = "tools",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Tool ID")),
    request_body = UpdateTool,
    responses(
        (status = 200, description = "Tool updated", body = Tool),
        (status = 404, description = "Tool or category not found")
    )
)]
pub async fn update_tool(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateTool>,
) -> AppResult<Json<Tool>> {
    claims.require_admin()?;
    let data = data.normalized();
    data.validate()?;

    let tool = state.services.tools.update(claims.user_id, id, data).await?;
    Ok(Json(tool))
}

/// Delete a tool without loan history
#[utoipa::path(
    delete,
    path = "/tools/{id}",
    tag = "tools",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Tool ID")),
    responses(
        (status = 204, description = "Tool deleted"),
        (status = 404, description = "Tool not found"),
        (status = 409, description = "Tool has loans on record")
    )
)]
pub async fn delete_tool(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.tools.delete(claims.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add or remove units of a tool
#[utoipa::path(
    post,
    path = "/tools/{id}/stock",
    tag = "tools",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Tool ID")),
    request_body = AdjustStock,
    responses(
        (status = 200, description = "Stock adjusted", body = StockResponse),
        (status = 400, description = "Zero delta"),
        (status = 404, description = "Tool not found"),
        (status = 409, description = "Stock would become negative")
    )
)]
pub async fn adjust_stock(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<AdjustStock>,
) -> AppResult<Json<StockResponse>> {
    claims.require_staff()?;

    let stock = state.services.tools.adjust_stock(claims.user_id, id, data.delta).await?;
    Ok(Json(StockResponse { tool_id: id, stock }))
}
