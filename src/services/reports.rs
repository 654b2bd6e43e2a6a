//! Reporting service

use chrono::{Duration, NaiveDate};

use crate::{
    error::{AppError, AppResult},
    models::report::{CategoryCount, DailyCount, Dashboard, DateRangeQuery},
    repository::Repository,
    services::today,
};

/// Window used when the caller gives no start date
const DEFAULT_RANGE_DAYS: i64 = 30;

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
}

/// Resolve an optional range against `today`, inclusive on both ends
pub fn resolve_range(query: &DateRangeQuery, today: NaiveDate) -> AppResult<(NaiveDate, NaiveDate)> {
    let to = query.to.unwrap_or(today);
    let from = match query.from {
        Some(from) => from,
        None => to
            .checked_sub_signed(Duration::days(DEFAULT_RANGE_DAYS - 1))
            .ok_or_else(|| AppError::Validation(format!("Date {} is out of range", to)))?,
    };
    if from > to {
        return Err(AppError::Validation(format!(
            "Invalid range: {} is after {}",
            from, to
        )));
    }
    Ok((from, to))
}

impl ReportsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn dashboard(&self) -> AppResult<Dashboard> {
        self.repository.reports.dashboard(today()).await
    }

    pub async fn loans_by_day(&self, query: &DateRangeQuery) -> AppResult<Vec<DailyCount>> {
        let (from, to) = resolve_range(query, today())?;
        self.repository.reports.loans_by_day(from, to).await
    }

    pub async fn loans_by_category(&self, query: &DateRangeQuery) -> AppResult<Vec<CategoryCount>> {
        let (from, to) = resolve_range(query, today())?;
        self.repository.reports.loans_by_category(from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_range_is_last_30_days() {
        let (from, to) = resolve_range(&DateRangeQuery::default(), date(2025, 3, 30)).unwrap();
        assert_eq!(to, date(2025, 3, 30));
        assert_eq!(from, date(2025, 3, 1));
    }

    #[test]
    fn test_explicit_range() {
        let query = DateRangeQuery {
            from: Some(date(2025, 1, 1)),
            to: Some(date(2025, 1, 31)),
        };
        let range = tokio_test::assert_ok!(resolve_range(&query, date(2025, 6, 1)));
        assert_eq!(range, (date(2025, 1, 1), date(2025, 1, 31)));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let query = DateRangeQuery {
            from: Some(date(2025, 2, 1)),
            to: Some(date(2025, 1, 1)),
        };
        let err = tokio_test::assert_err!(resolve_range(&query, date(2025, 6, 1)));
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_default_start_before_min_date_rejected() {
        let query = DateRangeQuery {
            from: None,
            to: Some(NaiveDate::MIN),
        };
        let err = tokio_test::assert_err!(resolve_range(&query, date(2025, 6, 1)));
        assert!(matches!(err, AppError::Validation(_)));

        let query = DateRangeQuery {
            from: Some(NaiveDate::MIN),
            to: Some(NaiveDate::MIN),
        };
        tokio_test::assert_ok!(resolve_range(&query, date(2025, 6, 1)));
    }
}
