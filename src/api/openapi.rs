//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{audit_logs, auth, categories, health, loans, reports, returns, tools, users};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pinjam API",
        version = "1.0.0",
        description = "Equipment Lending REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::logout,
        auth::me,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Categories
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        // Tools
        tools::list_tools,
        tools::get_tool,
        tools::create_tool,
        tools::update_tool,
        tools::delete_tool,
        tools::adjust_stock,
        // Loans
        loans::submit_loan,
        loans::list_loans,
        loans::my_loans,
        loans::get_loan,
        loans::approve_loan,
        loans::reject_loan,
        loans::request_return,
        loans::return_loan,
        loans::confirm_return,
        returns::list_returns,
        // Audit
        audit_logs::list_audit_logs,
        // Reports
        reports::dashboard,
        reports::loans_by_day,
        reports::loans_by_category,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            // Users
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            // Inventory
            crate::models::category::Category,
            crate::models::category::CategoryWithCount,
            crate::models::category::CategoryInput,
            crate::models::tool::Tool,
            crate::models::tool::ToolDetails,
            crate::models::tool::CreateTool,
            crate::models::tool::UpdateTool,
            crate::models::tool::AdjustStock,
            tools::StockResponse,
            // Loans
            crate::models::loan::LoanStatus,
            crate::models::loan::Loan,
            crate::models::loan::LoanDetails,
            crate::models::loan_return::ReturnInitiator,
            crate::models::loan_return::LoanReturn,
            crate::models::loan_return::ReturnDetails,
            loans::SubmitLoanRequest,
            loans::ReturnResponse,
            // Audit
            crate::models::audit_log::AuditLogEntry,
            // Reports
            crate::models::report::Dashboard,
            crate::models::report::StatusCount,
            crate::models::report::DailyCount,
            crate::models::report::CategoryCount,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User management"),
        (name = "categories", description = "Tool categories"),
        (name = "tools", description = "Tool inventory"),
        (name = "loans", description = "Loan lifecycle and returns"),
        (name = "audit", description = "Audit log"),
        (name = "reports", description = "Reports")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_lifecycle_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/loans",
            "/loans/{id}/approve",
            "/loans/{id}/reject",
            "/loans/{id}/return",
            "/loans/{id}/confirm-return",
            "/loans/{id}/request-return",
            "/returns",
            "/audit-logs",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
