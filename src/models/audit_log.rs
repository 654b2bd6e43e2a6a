//! Audit log model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Placeholder shown when the actor is unknown or has been deleted
pub const SYSTEM_ACTOR: &str = "System";

/// Audited action tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    LoanSubmit,
    LoanApprove,
    LoanReject,
    LoanReturnRequest,
    LoanReturn,
    ToolCreate,
    ToolUpdate,
    ToolDelete,
    ToolStockAdjust,
    CategoryCreate,
    CategoryUpdate,
    CategoryDelete,
    UserCreate,
    UserUpdate,
    UserDelete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::LoanSubmit => "loan.submit",
            AuditAction::LoanApprove => "loan.approve",
            AuditAction::LoanReject => "loan.reject",
            AuditAction::LoanReturnRequest => "loan.return_request",
            AuditAction::LoanReturn => "loan.return",
            AuditAction::ToolCreate => "tool.create",
            AuditAction::ToolUpdate => "tool.update",
            AuditAction::ToolDelete => "tool.delete",
            AuditAction::ToolStockAdjust => "tool.stock_adjust",
            AuditAction::CategoryCreate => "category.create",
            AuditAction::CategoryUpdate => "category.update",
            AuditAction::CategoryDelete => "category.delete",
            AuditAction::UserCreate => "user.create",
            AuditAction::UserUpdate => "user.update",
            AuditAction::UserDelete => "user.delete",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Entry to append
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    /// `None` for system-initiated actions
    pub actor_user_id: Option<i32>,
    pub action: AuditAction,
    pub target_id: Option<String>,
    pub details: Option<Value>,
}

impl NewAuditEntry {
    pub fn new(actor_user_id: Option<i32>, action: AuditAction) -> Self {
        Self {
            actor_user_id,
            action,
            target_id: None,
            details: None,
        }
    }

    pub fn target(mut self, target_id: impl ToString) -> Self {
        self.target_id = Some(target_id.to_string());
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Stored audit entry joined with the actor display name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuditLogEntry {
    pub id: i64,
    pub actor_user_id: Option<i32>,
    /// Actor full name or login, "System" when absent
    pub actor_name: String,
    pub action: String,
    pub target_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Audit log query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AuditLogQuery {
    pub action: Option<String>,
    pub actor_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let entry = NewAuditEntry::new(Some(3), AuditAction::LoanApprove)
            .target(42)
            .details(json!({ "stock": 1 }));
        assert_eq!(entry.actor_user_id, Some(3));
        assert_eq!(entry.target_id.as_deref(), Some("42"));
        assert_eq!(entry.details, Some(json!({ "stock": 1 })));
        assert_eq!(entry.action.as_str(), "loan.approve");
    }

    #[test]
    fn test_system_entry_has_no_actor() {
        let entry = NewAuditEntry::new(None, AuditAction::UserCreate);
        assert!(entry.actor_user_id.is_none());
        assert!(entry.target_id.is_none());
    }
}
