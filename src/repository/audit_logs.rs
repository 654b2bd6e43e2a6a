//! Audit log repository (append-only)

use sqlx::{Pool, Postgres};

use super::paginate;
use crate::{
    error::AppResult,
    models::audit_log::{AuditLogEntry, AuditLogQuery, NewAuditEntry, SYSTEM_ACTOR},
};

#[derive(Clone)]
pub struct AuditLogsRepository {
    pool: Pool<Postgres>,
}

impl AuditLogsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append one entry, returning its id
    pub async fn insert(&self, entry: &NewAuditEntry) -> AppResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO audit_logs (actor_user_id, action, target_id, details)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(entry.actor_user_id)
        .bind(entry.action.as_str())
        .bind(&entry.target_id)
        .bind(&entry.details)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// List entries newest first. Entries whose actor is gone show as "System".
    pub async fn list(&self, query: &AuditLogQuery) -> AppResult<(Vec<AuditLogEntry>, i64)> {
        let (_, per_page, offset) = paginate(query.page, query.per_page);

        // Filters are numbered from `first`; the select reserves $1 for the placeholder name
        let where_clause = |first: usize| {
            let mut conditions = Vec::new();
            let mut idx = first;
            if query.action.is_some() {
                conditions.push(format!("a.action = ${}", idx));
                idx += 1;
            }
            if query.actor_id.is_some() {
                conditions.push(format!("a.actor_user_id = ${}", idx));
            }
            if conditions.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", conditions.join(" AND "))
            }
        };

        let count_q = format!("SELECT COUNT(*) FROM audit_logs a {}", where_clause(1));
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(ref action) = query.action { count_builder = count_builder.bind(action); }
        if let Some(actor) = query.actor_id { count_builder = count_builder.bind(actor); }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            r#"
            SELECT a.id, a.actor_user_id,
                   COALESCE(u.full_name, u.login, $1) AS actor_name,
                   a.action, a.target_id, a.details, a.created_at
            FROM audit_logs a
            LEFT JOIN users u ON u.id = a.actor_user_id
            {}
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT {} OFFSET {}
            "#,
            where_clause(2), per_page, offset
        );
        let mut builder = sqlx::query_as::<_, AuditLogEntry>(&select_q).bind(SYSTEM_ACTOR);
        if let Some(ref action) = query.action { builder = builder.bind(action); }
        if let Some(actor) = query.actor_id { builder = builder.bind(actor); }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok((rows, total))
    }
}
