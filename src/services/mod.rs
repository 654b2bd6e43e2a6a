//! Business logic services

pub mod audit;
pub mod categories;
pub mod loans;
pub mod redis;
pub mod reports;
pub mod tools;
pub mod users;

use crate::{config::AppConfig, repository::Repository};

/// Current calendar date in server local time. Loan dates, late fees and
/// overdue flags are all computed against this one clock.
pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub categories: categories::CategoriesService,
    pub tools: tools::ToolsService,
    pub loans: loans::LoansService,
    pub reports: reports::ReportsService,
    pub audit: audit::AuditService,
    pub redis: redis::RedisService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig, redis_service: redis::RedisService) -> Self {
        let audit = audit::AuditService::new(repository.clone());

        Self {
            users: users::UsersService::new(
                repository.clone(),
                config.auth.clone(),
                redis_service.clone(),
                audit.clone(),
            ),
            categories: categories::CategoriesService::new(repository.clone(), audit.clone()),
            tools: tools::ToolsService::new(repository.clone(), audit.clone()),
            loans: loans::LoansService::new(
                repository.clone(),
                audit.clone(),
                config.loans.late_fee_per_day,
            ),
            reports: reports::ReportsService::new(repository.clone()),
            audit,
            redis: redis_service,
            repository,
        }
    }

    /// Database round trip for readiness probes
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.repository.ping().await
    }
}
