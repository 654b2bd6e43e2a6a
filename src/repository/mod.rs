//! Repository layer for database operations

pub mod audit_logs;
pub mod categories;
pub mod loans;
pub mod reports;
pub mod returns;
pub mod tools;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub categories: categories::CategoriesRepository,
    pub tools: tools::ToolsRepository,
    pub loans: loans::LoansRepository,
    pub returns: returns::ReturnsRepository,
    pub audit_logs: audit_logs::AuditLogsRepository,
    pub reports: reports::ReportsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            categories: categories::CategoriesRepository::new(pool.clone()),
            tools: tools::ToolsRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            returns: returns::ReturnsRepository::new(pool.clone()),
            audit_logs: audit_logs::AuditLogsRepository::new(pool.clone()),
            reports: reports::ReportsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Highest page number accepted from a query string
const MAX_PAGE: i64 = 1_000_000;

/// Clamp pagination parameters, returning (page, per_page, offset)
pub(crate) fn paginate(page: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let per_page = per_page.unwrap_or(20).clamp(1, 200);
    (page, per_page, (page - 1) * per_page)
}

#[cfg(test)]
mod tests {
    use super::paginate;

    #[test]
    fn test_paginate_defaults() {
        assert_eq!(paginate(None, None), (1, 20, 0));
    }

    #[test]
    fn test_paginate_clamps() {
        assert_eq!(paginate(Some(0), Some(1000)), (1, 200, 0));
        assert_eq!(paginate(Some(3), Some(10)), (3, 10, 20));
        assert_eq!(paginate(Some(-2), Some(-5)), (1, 1, 0));
    }

    #[test]
    fn test_paginate_huge_page_does_not_overflow() {
        let (page, per_page, offset) = paginate(Some(i64::MAX), Some(200));
        assert_eq!(page, 1_000_000);
        assert_eq!(per_page, 200);
        assert_eq!(offset, 999_999 * 200);
    }
}
