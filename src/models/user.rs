//! User model, roles and token claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    /// Staff
    Petugas,
    /// Borrower
    #[serde(alias = "user")]
    Peminjam,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Petugas => "petugas",
            Role::Peminjam => "peminjam",
        }
    }

    /// Admin and staff may process loans
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Petugas)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "petugas" | "staff" => Ok(Role::Petugas),
            "peminjam" | "user" | "borrower" => Ok(Role::Peminjam),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

text_enum_sqlx!(Role);

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub login: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name shown in lists and audit entries
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.login)
    }
}

/// Short user representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserShort {
    pub id: i32,
    pub login: String,
    pub full_name: Option<String>,
    pub role: Role,
    /// Loans currently out (approved or awaiting return confirmation)
    pub nb_active_loans: i64,
}

/// User query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// Search by login or full name
    pub name: Option<String>,
    pub role: Option<Role>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 3, message = "Login must be at least 3 characters"))]
    pub login: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
    pub full_name: Option<String>,
    /// Defaults to peminjam
    pub role: Option<Role>,
}

/// Update user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 3, message = "Login must be at least 3 characters"))]
    pub login: Option<String>,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    /// Server-side session id, checked on every request
    pub sid: String,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Require staff (petugas) or admin privileges
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization("Staff privileges required".to_string()))
        }
    }

    /// Whether the caller owns the record or is staff
    pub fn owns_or_staff(&self, owner_id: i32) -> bool {
        self.user_id == owner_id || self.is_staff()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: "budi".to_string(),
            user_id: 7,
            role,
            sid: "session".to_string(),
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn test_role_normalization() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" Petugas ".parse::<Role>(), Ok(Role::Petugas));
        assert_eq!("user".parse::<Role>(), Ok(Role::Peminjam));
        assert_eq!("PEMINJAM".parse::<Role>(), Ok(Role::Peminjam));
        assert!("guest".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_accepts_legacy_user_label() {
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::Peminjam);
        assert_eq!(serde_json::to_string(&Role::Petugas).unwrap(), "\"petugas\"");
    }

    #[test]
    fn test_staff_checks() {
        assert!(claims(Role::Admin).require_staff().is_ok());
        assert!(claims(Role::Petugas).require_staff().is_ok());
        assert!(claims(Role::Peminjam).require_staff().is_err());
        assert!(claims(Role::Petugas).require_admin().is_err());
    }

    #[test]
    fn test_owner_or_staff() {
        let borrower = claims(Role::Peminjam);
        assert!(borrower.owns_or_staff(7));
        assert!(!borrower.owns_or_staff(8));
        assert!(claims(Role::Petugas).owns_or_staff(8));
    }

    #[test]
    fn test_token_round_trip() {
        let original = claims(Role::Petugas);
        let token = original.create_token("secret").unwrap();
        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.user_id, 7);
        assert_eq!(decoded.role, Role::Petugas);
        assert_eq!(decoded.sid, "session");

        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }
}
