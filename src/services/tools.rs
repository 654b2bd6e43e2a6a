//! Tool inventory service

use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    models::{
        audit_log::{AuditAction, NewAuditEntry},
        tool::{CreateTool, Tool, ToolDetails, ToolQuery, UpdateTool},
    },
    repository::Repository,
    services::audit::AuditService,
};

#[derive(Clone)]
pub struct ToolsService {
    repository: Repository,
    audit: AuditService,
}

impl ToolsService {
    pub fn new(repository: Repository, audit: AuditService) -> Self {
        Self { repository, audit }
    }

    pub async fn list(&self, query: &ToolQuery) -> AppResult<(Vec<ToolDetails>, i64)> {
        self.repository.tools.list(query).await
    }

    pub async fn get(&self, id: i32) -> AppResult<ToolDetails> {
        self.repository.tools.get_details(id).await
    }

    pub async fn create(&self, actor_id: i32, data: CreateTool) -> AppResult<Tool> {
        if !self.repository.categories.exists(data.category_id).await? {
            return Err(AppError::NotFound(format!("Category {} not found", data.category_id)));
        }

        let tool = self.repository.tools.create(&data).await?;

        tracing::info!(tool_id = tool.id, stock = tool.stock, "Tool created");
        self.audit
            .record(
                NewAuditEntry::new(Some(actor_id), AuditAction::ToolCreate)
                    .target(tool.id)
                    .details(json!({
                        "name": tool.name,
                        "category_id": tool.category_id,
                        "stock": tool.stock,
                    })),
            )
            .await;

        Ok(tool)
    }

    /// Update a tool's descriptive fields. Stock only changes through
    /// `adjust_stock` and loan transitions.
    pub async fn update(&self, actor_id: i32, id: i32, data: UpdateTool) -> AppResult<Tool> {
        let tool = self.repository.tools.update(id, &data).await?;

        self.audit
            .record(
                NewAuditEntry::new(Some(actor_id), AuditAction::ToolUpdate)
                    .target(id)
                    .details(json!({
                        "name": tool.name,
                        "category_id": tool.category_id,
                        "description": tool.description,
                        "image_url": tool.image_url,
                    })),
            )
            .await;

        Ok(tool)
    }

    /// Delete a tool that has no loan history
    pub async fn delete(&self, actor_id: i32, id: i32) -> AppResult<()> {
        let tool = self.repository.tools.delete(id).await?;

        self.audit
            .record(
                NewAuditEntry::new(Some(actor_id), AuditAction::ToolDelete)
                    .target(id)
                    .details(json!({ "name": tool.name })),
            )
            .await;

        Ok(())
    }

    /// Add or remove units; stock never drops below zero
    pub async fn adjust_stock(&self, actor_id: i32, id: i32, delta: i32) -> AppResult<i32> {
        if delta == 0 {
            return Err(AppError::Validation("delta must not be zero".to_string()));
        }

        let stock = self.repository.tools.adjust_stock(id, delta).await?;

        tracing::info!(tool_id = id, delta, stock, "Tool stock adjusted");
        self.audit
            .record(
                NewAuditEntry::new(Some(actor_id), AuditAction::ToolStockAdjust)
                    .target(id)
                    .details(json!({ "delta": delta, "stock_after": stock })),
            )
            .await;

        Ok(stock)
    }
}
