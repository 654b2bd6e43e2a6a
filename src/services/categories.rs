//! Category management service

use serde_json::json;

use crate::{
    error::AppResult,
    models::{
        audit_log::{AuditAction, NewAuditEntry},
        category::{Category, CategoryInput, CategoryWithCount},
    },
    repository::Repository,
    services::audit::AuditService,
};

#[derive(Clone)]
pub struct CategoriesService {
    repository: Repository,
    audit: AuditService,
}

impl CategoriesService {
    pub fn new(repository: Repository, audit: AuditService) -> Self {
        Self { repository, audit }
    }

    pub async fn list(&self) -> AppResult<Vec<CategoryWithCount>> {
        self.repository.categories.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<Category> {
        self.repository.categories.get_by_id(id).await
    }

    pub async fn create(&self, actor_id: i32, data: CategoryInput) -> AppResult<Category> {
        let category = self.repository.categories.create(&data).await?;

        self.audit
            .record(
                NewAuditEntry::new(Some(actor_id), AuditAction::CategoryCreate)
                    .target(category.id)
                    .details(json!({ "name": category.name })),
            )
            .await;

        Ok(category)
    }

    pub async fn update(&self, actor_id: i32, id: i32, data: CategoryInput) -> AppResult<Category> {
        let before = self.repository.categories.get_by_id(id).await?;
        let category = self.repository.categories.update(id, &data).await?;

        self.audit
            .record(
                NewAuditEntry::new(Some(actor_id), AuditAction::CategoryUpdate)
                    .target(id)
                    .details(json!({ "name": category.name, "previous_name": before.name })),
            )
            .await;

        Ok(category)
    }

    /// Delete a category that no tool references
    pub async fn delete(&self, actor_id: i32, id: i32) -> AppResult<()> {
        let category = self.repository.categories.delete(id).await?;

        self.audit
            .record(
                NewAuditEntry::new(Some(actor_id), AuditAction::CategoryDelete)
                    .target(id)
                    .details(json!({ "name": category.name })),
            )
            .await;

        Ok(())
    }
}
