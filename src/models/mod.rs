//! Data models for Pinjam

/// Store a closed enum as TEXT, parsing (and normalizing) through `FromStr`
/// on the way out of the database and writing `as_str()` on the way in.
macro_rules! text_enum_sqlx {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = sqlx::Decode::<sqlx::Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

pub mod audit_log;
pub mod category;
pub mod loan;
pub mod loan_return;
pub mod report;
pub mod tool;
pub mod user;

// Re-export commonly used types
pub use audit_log::{AuditAction, AuditLogEntry, NewAuditEntry};
pub use category::{Category, CategoryWithCount};
pub use loan::{Loan, LoanDetails, LoanStatus};
pub use loan_return::{LoanReturn, ReturnDetails, ReturnInitiator};
pub use tool::{Tool, ToolDetails};
pub use user::{Role, User, UserClaims, UserShort};
