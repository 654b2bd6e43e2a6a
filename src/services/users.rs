//! Authentication, sessions and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        audit_log::{AuditAction, NewAuditEntry},
        user::{CreateUser, Role, UpdateUser, User, UserClaims, UserQuery, UserShort},
    },
    repository::Repository,
    services::{audit::AuditService, redis::RedisService},
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    redis: RedisService,
    audit: AuditService,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig, redis: RedisService, audit: AuditService) -> Self {
        Self { repository, config, redis, audit }
    }

    /// Authenticate user by login and password, opening a session.
    /// Returns the JWT and the user.
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_login(login)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid login or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        }

        let token = self.open_session(&user).await?;
        tracing::info!(user_id = user.id, name = user.display_name(), role = %user.role, "User logged in");

        Ok((token, user))
    }

    /// Create the server-side session and its signed token
    async fn open_session(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let ttl = self.config.jwt_expiration_hours * 3600;
        let session_id = uuid::Uuid::new_v4().to_string();

        let claims = UserClaims {
            sub: user.login.clone(),
            user_id: user.id,
            role: user.role,
            sid: session_id.clone(),
            exp: now + ttl as i64,
            iat: now,
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        self.redis.create_session(&session_id, user.id, ttl).await?;

        Ok(token)
    }

    /// Resolve a bearer token into verified claims: signature, expiry and a
    /// live server-side session are all required
    pub async fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        let claims = UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        if !self.redis.session_matches(&claims.sid, claims.user_id).await? {
            return Err(AppError::Authentication("Session expired or revoked".to_string()));
        }

        Ok(claims)
    }

    /// Close the caller's session
    pub async fn logout(&self, claims: &UserClaims) -> AppResult<()> {
        self.redis.delete_session(&claims.sid).await
    }

    /// Create the configured administrator when no admin account exists yet
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let (Some(login), Some(password)) = (
            self.config.bootstrap_admin_login.as_ref(),
            self.config.bootstrap_admin_password.as_ref(),
        ) else {
            return Ok(());
        };

        if self.repository.users.count_by_role(Role::Admin).await? > 0 {
            return Ok(());
        }

        let hash = self.hash_password(password)?;
        let admin = CreateUser {
            login: login.clone(),
            password: password.clone(),
            full_name: Some("Administrator".to_string()),
            role: Some(Role::Admin),
        };
        let user = self.repository.users.create(&admin, &hash).await?;
        tracing::info!(user_id = user.id, login = %user.login, "Created bootstrap administrator");

        self.audit
            .record(
                NewAuditEntry::new(None, AuditAction::UserCreate)
                    .target(user.id)
                    .details(json!({ "login": user.login, "role": user.role, "bootstrap": true })),
            )
            .await;

        Ok(())
    }

    /// Verify user password
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        if let Some(ref hash) = user.password {
            let parsed_hash = PasswordHash::new(hash)
                .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
            return Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok());
        }

        Ok(false)
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        hash_password(password)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Search users
    pub async fn search_users(&self, query: &UserQuery) -> AppResult<(Vec<UserShort>, i64)> {
        self.repository.users.search(query).await
    }

    /// Create a new user
    pub async fn create_user(&self, actor_id: i32, user: CreateUser) -> AppResult<User> {
        if self.repository.users.login_exists(&user.login, None).await? {
            return Err(AppError::Conflict("Login already exists".to_string()));
        }

        let hash = self.hash_password(&user.password)?;
        let created = self.repository.users.create(&user, &hash).await?;

        self.audit
            .record(
                NewAuditEntry::new(Some(actor_id), AuditAction::UserCreate)
                    .target(created.id)
                    .details(json!({ "login": created.login, "role": created.role })),
            )
            .await;

        Ok(created)
    }

    /// Update an existing user. A role change revokes the user's sessions so
    /// the new role is picked up at next login.
    pub async fn update_user(&self, actor_id: i32, id: i32, user: UpdateUser) -> AppResult<User> {
        let before = self.repository.users.get_by_id(id).await?;

        if let Some(ref login) = user.login {
            if self.repository.users.login_exists(login, Some(id)).await? {
                return Err(AppError::Conflict("Login already exists".to_string()));
            }
        }

        let password = match user.password {
            Some(ref password) => Some(self.hash_password(password)?),
            None => None,
        };

        let updated = self.repository.users.update(id, &user, password).await?;

        let role_changed = updated.role != before.role;
        if role_changed || user.password.is_some() {
            self.redis.delete_user_sessions(id).await?;
        }

        self.audit
            .record(
                NewAuditEntry::new(Some(actor_id), AuditAction::UserUpdate)
                    .target(id)
                    .details(json!({
                        "login": updated.login,
                        "role": updated.role,
                        "previous_role": before.role,
                        "password_changed": user.password.is_some(),
                    })),
            )
            .await;

        Ok(updated)
    }

    /// Delete a user without loan history
    pub async fn delete_user(&self, actor_id: i32, id: i32) -> AppResult<()> {
        if actor_id == id {
            return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
        }

        let user = self.repository.users.get_by_id(id).await?;
        self.repository.users.delete(id).await?;
        self.redis.delete_user_sessions(id).await?;

        self.audit
            .record(
                NewAuditEntry::new(Some(actor_id), AuditAction::UserDelete)
                    .target(id)
                    .details(json!({ "login": user.login, "role": user.role })),
            )
            .await;

        Ok(())
    }
}

/// Hash a password using Argon2 with a random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}
