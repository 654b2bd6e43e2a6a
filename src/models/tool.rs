//! Tool (inventory) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Tool record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tool {
    pub id: i32,
    pub name: String,
    pub category_id: i32,
    /// Units currently available for lending
    pub stock: i32,
    pub description: Option<String>,
    /// Image reference (URL or storage path)
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Tool joined with its category name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ToolDetails {
    pub id: i32,
    pub name: String,
    pub category_id: i32,
    pub category_name: String,
    pub stock: i32,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Tool query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ToolQuery {
    pub category_id: Option<i32>,
    /// Search by name
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create tool request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTool {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,
    pub category_id: i32,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl CreateTool {
    /// Trim the name so blank names fail validation
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}

/// Update tool request. Stock is not editable here, it only moves through
/// stock adjustments and loan transitions.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateTool {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: Option<String>,
    pub category_id: Option<i32>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl UpdateTool {
    /// Trim the name so blank names fail validation
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|name| name.trim().to_string());
        self
    }
}

/// Relative stock adjustment
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustStock {
    /// Units to add (positive) or remove (negative)
    pub delta: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_tool_name_rejected() {
        let create: CreateTool = serde_json::from_value(json!({ "name": "   ", "category_id": 1 })).unwrap();
        assert!(create.normalized().validate().is_err());

        let update: UpdateTool = serde_json::from_value(json!({ "name": " \t " })).unwrap();
        assert!(update.normalized().validate().is_err());
    }

    #[test]
    fn test_names_are_trimmed() {
        let create: CreateTool =
            serde_json::from_value(json!({ "name": "  Bor listrik ", "category_id": 1 })).unwrap();
        let create = create.normalized();
        assert!(create.validate().is_ok());
        assert_eq!(create.name, "Bor listrik");
    }

    #[test]
    fn test_update_cannot_set_stock() {
        let result = serde_json::from_value::<UpdateTool>(json!({ "name": "Gergaji", "stock": 10 }));
        assert!(result.is_err());

        let update: UpdateTool = serde_json::from_value(json!({ "description": "Baru" })).unwrap();
        assert!(update.name.is_none());
        assert!(update.normalized().validate().is_ok());
    }
}
