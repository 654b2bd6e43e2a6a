//! Loan model and lifecycle states

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;

/// Loan lifecycle status
///
/// ```text
/// pending ──approve──> approved ──return──────────────> returned
///    │                    └──request return──> pending_return ──┘
///    └──reject──> rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    PendingReturn,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
            LoanStatus::PendingReturn => "pending_return",
            LoanStatus::Returned => "returned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Rejected | LoanStatus::Returned)
    }

    /// Whether the tool unit is out of the inventory in this state
    pub fn holds_stock(&self) -> bool {
        matches!(self, LoanStatus::Approved | LoanStatus::PendingReturn)
    }

    pub fn can_transition_to(&self, next: LoanStatus) -> bool {
        use LoanStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, PendingReturn)
                | (Approved, Returned)
                | (PendingReturn, Returned)
        )
    }

    /// Fail with `InvalidState` naming the current status when `next` is not reachable
    pub fn ensure_transition(&self, loan_id: i32, next: LoanStatus) -> Result<(), AppError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::InvalidState(format!(
                "Loan {} cannot become {} from status {}",
                loan_id, next, self
            )))
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    /// Accepts the canonical labels and the legacy Indonesian ones, ignoring
    /// case and surrounding whitespace
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "pending" | "menunggu" => Ok(LoanStatus::Pending),
            "approved" | "disetujui" | "dipinjam" => Ok(LoanStatus::Approved),
            "rejected" | "ditolak" => Ok(LoanStatus::Rejected),
            "pending_return" | "pending_kembali" => Ok(LoanStatus::PendingReturn),
            "returned" | "kembali" | "dikembalikan" => Ok(LoanStatus::Returned),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

text_enum_sqlx!(LoanStatus);

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub tool_id: i32,
    pub borrowed_on: NaiveDate,
    pub due_date: NaiveDate,
    pub returned_on: Option<NaiveDate>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Loan with borrower, tool and return details for display
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub user_id: i32,
    pub user_login: String,
    pub user_full_name: Option<String>,
    pub tool_id: i32,
    pub tool_name: String,
    pub category_name: String,
    pub borrowed_on: NaiveDate,
    pub due_date: NaiveDate,
    pub returned_on: Option<NaiveDate>,
    pub status: LoanStatus,
    /// Recorded once the loan is returned
    pub late_fee: Option<Decimal>,
    pub is_overdue: bool,
    pub created_at: DateTime<Utc>,
}

/// Loan query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    pub status: Option<LoanStatus>,
    pub user_id: Option<i32>,
    pub tool_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// New loan request, validated
#[derive(Debug, Clone)]
pub struct CreateLoan {
    pub user_id: i32,
    pub tool_id: i32,
    pub borrowed_on: NaiveDate,
    pub due_date: NaiveDate,
}

/// Parse a submitted due date (`YYYY-MM-DD`, surrounding whitespace ignored)
pub fn parse_due_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid due_date '{}', expected YYYY-MM-DD", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use LoanStatus::*;

    const ALL: [LoanStatus; 5] = [Pending, Approved, Rejected, PendingReturn, Returned];

    #[test]
    fn test_legacy_labels_normalize() {
        assert_eq!("disetujui".parse::<LoanStatus>(), Ok(Approved));
        assert_eq!(" Disetujui ".parse::<LoanStatus>(), Ok(Approved));
        assert_eq!("ditolak".parse::<LoanStatus>(), Ok(Rejected));
        assert_eq!("pending_kembali".parse::<LoanStatus>(), Ok(PendingReturn));
        assert_eq!("pending kembali".parse::<LoanStatus>(), Ok(PendingReturn));
        assert_eq!("KEMBALI".parse::<LoanStatus>(), Ok(Returned));
        assert_eq!("menunggu".parse::<LoanStatus>(), Ok(Pending));
        assert!("lost".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn test_canonical_labels_round_trip() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<LoanStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_approved_only_reachable_from_pending() {
        for status in ALL {
            assert_eq!(status.can_transition_to(Approved), status == Pending);
        }
    }

    #[test]
    fn test_pending_never_skips_to_returned() {
        assert!(!Pending.can_transition_to(Returned));
        assert!(!Pending.can_transition_to(PendingReturn));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in [Rejected, Returned] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn test_invalid_transition_echoes_current_status() {
        let err = Returned.ensure_transition(12, Returned).unwrap_err();
        match err {
            AppError::InvalidState(msg) => {
                assert!(msg.contains("returned"));
                assert!(msg.contains("12"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(Approved.ensure_transition(12, Returned).is_ok());
    }

    #[test]
    fn test_holds_stock() {
        assert!(Approved.holds_stock());
        assert!(PendingReturn.holds_stock());
        assert!(!Pending.holds_stock());
        assert!(!Returned.holds_stock());
    }

    #[test]
    fn test_parse_due_date() {
        assert_eq!(
            parse_due_date(" 2025-03-14 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
        );
        assert!(matches!(parse_due_date("14/03/2025"), Err(AppError::Validation(_))));
        assert!(matches!(parse_due_date("2025-02-30"), Err(AppError::Validation(_))));
    }
}
