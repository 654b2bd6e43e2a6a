//! Users repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use super::paginate;
use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, Role, UpdateUser, User, UserQuery, UserShort},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by login (case-insensitive)
    pub async fn get_by_login(&self, login: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(login) = LOWER($1)")
            .bind(login.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check whether a login is taken (optionally ignoring one user)
    pub async fn login_exists(&self, login: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE LOWER(login) = LOWER($1) AND ($2::int IS NULL OR id != $2)
            )
            "#,
        )
        .bind(login.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Count users holding a role
    pub async fn count_by_role(&self, role: Role) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Search users with pagination
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<UserShort>, i64)> {
        let (_, per_page, offset) = paginate(query.page, query.per_page);

        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.name.is_some() {
            conditions.push(format!(
                "(u.login ILIKE ${0} OR COALESCE(u.full_name, '') ILIKE ${0})",
                idx
            ));
            idx += 1;
        }
        if query.role.is_some() {
            conditions.push(format!("u.role = ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let pattern = query.name.as_ref().map(|n| format!("%{}%", n.trim()));

        let count_q = format!("SELECT COUNT(*) FROM users u {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(ref p) = pattern { count_builder = count_builder.bind(p); }
        if let Some(role) = query.role { count_builder = count_builder.bind(role); }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            r#"
            SELECT u.id, u.login, u.full_name, u.role,
                   (SELECT COUNT(*) FROM loans l
                    WHERE l.user_id = u.id AND l.status IN ('approved', 'pending_return')) AS nb_active_loans
            FROM users u
            {}
            ORDER BY u.login
            LIMIT {} OFFSET {}
            "#,
            where_clause, per_page, offset
        );
        let mut builder = sqlx::query_as::<_, UserShort>(&select_q);
        if let Some(ref p) = pattern { builder = builder.bind(p); }
        if let Some(role) = query.role { builder = builder.bind(role); }

        let users = builder.fetch_all(&self.pool).await?;
        Ok((users, total))
    }

    /// Create a new user with an already hashed password
    pub async fn create(&self, user: &CreateUser, password_hash: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (login, password, full_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user.login.trim())
        .bind(password_hash)
        .bind(&user.full_name)
        .bind(user.role.unwrap_or(Role::Peminjam))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::on_unique(e, "Login already exists"))
    }

    /// Update an existing user
    pub async fn update(&self, id: i32, user: &UpdateUser, password_hash: Option<String>) -> AppResult<User> {
        let now = Utc::now();

        let mut sets = vec!["updated_at = $1".to_string()];
        let mut param_idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, param_idx));
                    param_idx += 1;
                }
            };
        }

        add_field!(user.login, "login");
        add_field!(user.full_name, "full_name");
        add_field!(user.role, "role");
        add_field!(password_hash, "password");

        let query = format!(
            "UPDATE users SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            param_idx
        );

        let mut builder = sqlx::query_as::<_, User>(&query).bind(now);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(user.login);
        bind_field!(user.full_name);
        bind_field!(user.role);
        bind_field!(password_hash);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::on_unique(e, "Login already exists"))?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Delete a user. Users with loan history cannot be removed; audit entries
    /// they authored keep their history with the actor set to NULL.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let has_loans: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE user_id = $1)"
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if has_loans {
            return Err(AppError::ReferentialConflict(format!(
                "User {} has loan records and cannot be deleted",
                id
            )));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::on_foreign_key(e, format!("User {} is still referenced", id)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}
