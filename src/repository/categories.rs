//! Categories repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::category::{Category, CategoryInput, CategoryWithCount},
};

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List categories with their tool counts
    pub async fn list(&self) -> AppResult<Vec<CategoryWithCount>> {
        let rows = sqlx::query_as::<_, CategoryWithCount>(
            r#"
            SELECT c.id, c.name, c.created_at, COUNT(t.id) AS tool_count
            FROM categories c
            LEFT JOIN tools t ON t.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get category by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Create a category
    pub async fn create(&self, data: &CategoryInput) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("INSERT INTO categories (name) VALUES ($1) RETURNING *")
            .bind(data.name.trim())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::on_unique(e, format!("Category '{}' already exists", data.name.trim())))
    }

    /// Rename a category
    pub async fn update(&self, id: i32, data: &CategoryInput) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("UPDATE categories SET name = $1 WHERE id = $2 RETURNING *")
            .bind(data.name.trim())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::on_unique(e, format!("Category '{}' already exists", data.name.trim())))?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    /// Delete a category that no tool references
    pub async fn delete(&self, id: i32) -> AppResult<Category> {
        let mut tx = self.pool.begin().await?;

        let tool_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tools WHERE category_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if tool_count > 0 {
            return Err(AppError::ReferentialConflict(format!(
                "Category {} still has {} tool(s)",
                id, tool_count
            )));
        }

        let deleted = sqlx::query_as::<_, Category>("DELETE FROM categories WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::on_foreign_key(e, format!("Category {} still has tools", id)))?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        tx.commit().await?;
        Ok(deleted)
    }
}
