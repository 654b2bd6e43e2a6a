//! Redis service holding server-side login sessions

use redis::{AsyncCommands, Client};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

fn session_key(session_id: &str) -> String {
    format!("session:{}", session_id)
}

fn user_sessions_key(user_id: i32) -> String {
    format!("user_sessions:{}", user_id)
}

impl RedisService {
    /// Create a new Redis service
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }

    /// Store a session for a user, expiring with the token
    pub async fn create_session(&self, session_id: &str, user_id: i32, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.connection().await?;
        let index = user_sessions_key(user_id);
        redis::pipe()
            .atomic()
            .set_ex(session_key(session_id), user_id, ttl_seconds)
            .ignore()
            .sadd(&index, session_id)
            .ignore()
            .expire(&index, ttl_seconds as i64)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store session in Redis: {}", e)))?;
        Ok(())
    }

    /// Whether the session is still live and belongs to the user
    pub async fn session_matches(&self, session_id: &str, user_id: i32) -> AppResult<bool> {
        let mut conn = self.connection().await?;
        let stored: Option<i32> = conn
            .get(session_key(session_id))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read session from Redis: {}", e)))?;
        Ok(stored == Some(user_id))
    }

    /// Revoke a session
    pub async fn delete_session(&self, session_id: &str) -> AppResult<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(session_key(session_id))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete session from Redis: {}", e)))?;
        Ok(())
    }

    /// Revoke every session of a user (role change or account removal)
    pub async fn delete_user_sessions(&self, user_id: i32) -> AppResult<()> {
        let mut conn = self.connection().await?;
        let index = user_sessions_key(user_id);
        let sessions: Vec<String> = conn
            .smembers(&index)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to list sessions in Redis: {}", e)))?;

        let mut keys: Vec<String> = sessions.iter().map(|s| session_key(s)).collect();
        keys.push(index);
        conn.del::<_, ()>(keys)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete sessions from Redis: {}", e)))?;
        Ok(())
    }
}
