//! Return ledger model and late fee computation

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::loan::LoanStatus;

/// Who closed the loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReturnInitiator {
    Borrower,
    Staff,
}

impl ReturnInitiator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnInitiator::Borrower => "borrower",
            ReturnInitiator::Staff => "staff",
        }
    }

    /// Borrowers hand back approved loans directly; staff also confirm
    /// loans whose return was requested.
    pub fn accepts(&self, status: LoanStatus) -> bool {
        match self {
            ReturnInitiator::Borrower => status == LoanStatus::Approved,
            ReturnInitiator::Staff => status.holds_stock(),
        }
    }
}

impl std::fmt::Display for ReturnInitiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReturnInitiator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "borrower" => Ok(ReturnInitiator::Borrower),
            "staff" => Ok(ReturnInitiator::Staff),
            _ => Err(format!("Invalid return initiator: {}", s)),
        }
    }
}

text_enum_sqlx!(ReturnInitiator);

/// Return record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanReturn {
    pub id: i32,
    pub loan_id: i32,
    pub returned_on: NaiveDate,
    pub days_late: i32,
    pub late_fee: Decimal,
    pub initiated_by: ReturnInitiator,
    pub processed_by: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Return record joined with loan, tool and borrower
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReturnDetails {
    pub id: i32,
    pub loan_id: i32,
    pub user_id: i32,
    pub user_login: String,
    pub tool_id: i32,
    pub tool_name: String,
    pub borrowed_on: NaiveDate,
    pub due_date: NaiveDate,
    pub returned_on: NaiveDate,
    pub days_late: i32,
    pub late_fee: Decimal,
    pub initiated_by: ReturnInitiator,
    pub processed_by: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Whole days between the due date and the return, zero when on time
pub fn days_late(due_date: NaiveDate, returned_on: NaiveDate) -> i64 {
    (returned_on - due_date).num_days().max(0)
}

/// `max(0, returned_on - due_date) * per_day_rate`
pub fn late_fee(due_date: NaiveDate, returned_on: NaiveDate, per_day_rate: Decimal) -> Decimal {
    Decimal::from(days_late(due_date, returned_on)) * per_day_rate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_three_days_late() {
        let fee = late_fee(date(2025, 5, 10), date(2025, 5, 13), Decimal::from(5000));
        assert_eq!(fee, Decimal::from(15000));
    }

    #[test]
    fn test_on_time_and_early_returns_are_free() {
        let rate = Decimal::from(5000);
        assert_eq!(late_fee(date(2025, 5, 10), date(2025, 5, 10), rate), Decimal::ZERO);
        assert_eq!(late_fee(date(2025, 5, 10), date(2025, 5, 2), rate), Decimal::ZERO);
        assert_eq!(days_late(date(2025, 5, 10), date(2025, 5, 2)), 0);
    }

    #[test]
    fn test_late_fee_across_month_boundary() {
        assert_eq!(days_late(date(2025, 1, 30), date(2025, 2, 4)), 5);
        assert_eq!(
            late_fee(date(2025, 1, 30), date(2025, 2, 4), Decimal::from(5000)),
            Decimal::from(25000)
        );
    }

    #[test]
    fn test_fractional_rate() {
        let rate = Decimal::new(250, 2);
        assert_eq!(late_fee(date(2025, 5, 1), date(2025, 5, 3), rate), Decimal::new(500, 2));
    }

    #[test]
    fn test_initiator_accepted_states() {
        use LoanStatus::*;
        assert!(ReturnInitiator::Borrower.accepts(Approved));
        assert!(!ReturnInitiator::Borrower.accepts(PendingReturn));
        assert!(ReturnInitiator::Staff.accepts(Approved));
        assert!(ReturnInitiator::Staff.accepts(PendingReturn));
        for status in [Pending, Rejected, Returned] {
            assert!(!ReturnInitiator::Borrower.accepts(status));
            assert!(!ReturnInitiator::Staff.accepts(status));
        }
    }
}
