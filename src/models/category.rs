//! Tool category model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Category record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Category with the number of tools filed under it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CategoryWithCount {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub tool_count: i64,
}

/// Create or rename a category
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
}

impl CategoryInput {
    /// Trim the name so blank names fail validation
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_category_name_rejected() {
        let input = CategoryInput { name: "    ".to_string() }.normalized();
        assert!(input.validate().is_err());

        let input = CategoryInput { name: " Perkakas ".to_string() }.normalized();
        assert!(input.validate().is_ok());
        assert_eq!(input.name, "Perkakas");
    }
}
