//! Tools (inventory) repository

use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres};

use super::paginate;
use crate::{
    error::{AppError, AppResult},
    models::tool::{CreateTool, Tool, ToolDetails, ToolQuery, UpdateTool},
};

const DETAILS_SELECT: &str = r#"
    SELECT t.id, t.name, t.category_id, c.name AS category_name, t.stock,
           t.description, t.image_url, t.created_at, t.updated_at
    FROM tools t
    JOIN categories c ON c.id = t.category_id
"#;

#[derive(Clone)]
pub struct ToolsRepository {
    pool: Pool<Postgres>,
}

impl ToolsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List tools with optional filters and pagination
    pub async fn list(&self, query: &ToolQuery) -> AppResult<(Vec<ToolDetails>, i64)> {
        let (_, per_page, offset) = paginate(query.page, query.per_page);

        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.category_id.is_some() {
            conditions.push(format!("t.category_id = ${}", idx));
            idx += 1;
        }
        if query.search.is_some() {
            conditions.push(format!("t.name ILIKE ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let pattern = query.search.as_ref().map(|s| format!("%{}%", s.trim()));

        let count_q = format!("SELECT COUNT(*) FROM tools t {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(cid) = query.category_id { count_builder = count_builder.bind(cid); }
        if let Some(ref p) = pattern { count_builder = count_builder.bind(p); }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "{} {} ORDER BY t.name LIMIT {} OFFSET {}",
            DETAILS_SELECT, where_clause, per_page, offset
        );
        let mut builder = sqlx::query_as::<_, ToolDetails>(&select_q);
        if let Some(cid) = query.category_id { builder = builder.bind(cid); }
        if let Some(ref p) = pattern { builder = builder.bind(p); }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    /// Get tool with category name
    pub async fn get_details(&self, id: i32) -> AppResult<ToolDetails> {
        let q = format!("{} WHERE t.id = $1", DETAILS_SELECT);
        sqlx::query_as::<_, ToolDetails>(&q)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", id)))
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tools WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Create a tool
    pub async fn create(&self, data: &CreateTool) -> AppResult<Tool> {
        sqlx::query_as::<_, Tool>(
            r#"
            INSERT INTO tools (name, category_id, stock, description, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(data.category_id)
        .bind(data.stock.unwrap_or(0))
        .bind(&data.description)
        .bind(&data.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::NotFound(format!("Category {} not found", data.category_id))
            }
            _ => AppError::Database(e),
        })
    }

    /// Update a tool (only provided fields change)
    pub async fn update(&self, id: i32, data: &UpdateTool) -> AppResult<Tool> {
        let now = Utc::now();
        let mut sets = vec!["updated_at = $1".to_string()];
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.name, "name");
        add_field!(data.category_id, "category_id");
        add_field!(data.description, "description");
        add_field!(data.image_url, "image_url");

        let query = format!("UPDATE tools SET {} WHERE id = ${} RETURNING *", sets.join(", "), idx);

        let mut builder = sqlx::query_as::<_, Tool>(&query).bind(now);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.name);
        bind_field!(data.category_id);
        bind_field!(data.description);
        bind_field!(data.image_url);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    AppError::NotFound(format!(
                        "Category {} not found",
                        data.category_id.unwrap_or_default()
                    ))
                }
                _ => AppError::Database(e),
            })?
            .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", id)))
    }

    /// Delete a tool that no loan references
    pub async fn delete(&self, id: i32) -> AppResult<Tool> {
        let mut tx = self.pool.begin().await?;

        let has_loans: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE tool_id = $1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if has_loans {
            return Err(AppError::ReferentialConflict(format!(
                "Tool {} is referenced by loans and cannot be deleted",
                id
            )));
        }

        let deleted = sqlx::query_as::<_, Tool>("DELETE FROM tools WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::on_foreign_key(e, format!("Tool {} is referenced by loans", id)))?
            .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", id)))?;

        tx.commit().await?;
        Ok(deleted)
    }

    /// Apply `stock += delta` atomically, refusing to go below zero.
    /// Returns the new stock.
    pub async fn adjust_stock(&self, id: i32, delta: i32) -> AppResult<i32> {
        let stock: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE tools SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1 AND stock + $2 >= 0
            RETURNING stock
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        match stock {
            Some(stock) => Ok(stock),
            None if self.exists(id).await? => Err(AppError::InsufficientStock(format!(
                "Adjusting tool {} by {} would make its stock negative",
                id, delta
            ))),
            None => Err(AppError::NotFound(format!("Tool {} not found", id))),
        }
    }

    /// Take one unit out of stock inside the caller's transaction.
    /// Returns `None` when no unit is available.
    pub(crate) async fn take_unit(conn: &mut PgConnection, id: i32) -> AppResult<Option<i32>> {
        let stock = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE tools SET stock = stock - 1, updated_at = NOW()
            WHERE id = $1 AND stock >= 1
            RETURNING stock
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(stock)
    }

    /// Put one unit back into stock inside the caller's transaction
    pub(crate) async fn put_back_unit(conn: &mut PgConnection, id: i32) -> AppResult<i32> {
        let stock = sqlx::query_scalar::<_, i32>(
            "UPDATE tools SET stock = stock + 1, updated_at = NOW() WHERE id = $1 RETURNING stock",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", id)))?;
        Ok(stock)
    }
}
