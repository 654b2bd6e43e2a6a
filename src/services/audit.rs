//! Audit log service
//!
//! Entries are appended after the business transaction has committed. A failed
//! write is reported to the operational log and never surfaces to the caller,
//! so at most one entry is written per mutation and some may be lost.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::audit_log::{AuditLogEntry, AuditLogQuery, NewAuditEntry},
    repository::{audit_logs::AuditLogsRepository, Repository},
};

/// Destination for audit entries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: &NewAuditEntry) -> AppResult<i64>;
}

#[async_trait]
impl AuditSink for AuditLogsRepository {
    async fn append(&self, entry: &NewAuditEntry) -> AppResult<i64> {
        self.insert(entry).await
    }
}

#[derive(Clone)]
pub struct AuditService {
    sink: Arc<dyn AuditSink>,
    repository: Repository,
}

impl AuditService {
    pub fn new(repository: Repository) -> Self {
        Self {
            sink: Arc::new(repository.audit_logs.clone()),
            repository,
        }
    }

    /// Use a custom sink for writes (reads still go to the repository)
    pub fn with_sink(repository: Repository, sink: Arc<dyn AuditSink>) -> Self {
        Self { sink, repository }
    }

    /// Append an entry; failures are logged and swallowed
    pub async fn record(&self, entry: NewAuditEntry) {
        match self.sink.append(&entry).await {
            Ok(id) => {
                tracing::debug!(audit_id = id, action = %entry.action, "Audit entry recorded");
            }
            Err(e) => {
                tracing::warn!(
                    action = %entry.action,
                    actor = ?entry.actor_user_id,
                    target = ?entry.target_id,
                    "Failed to record audit entry: {}",
                    e
                );
            }
        }
    }

    /// List entries newest first
    pub async fn list(&self, query: &AuditLogQuery) -> AppResult<(Vec<AuditLogEntry>, i64)> {
        self.repository.audit_logs.list(query).await
    }
}
