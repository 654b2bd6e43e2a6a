//! Pinjam Server - Equipment Lending
//!
//! REST API server for tool loans.

use anyhow::Context;
use axum::{
    routing::{get, post, put, delete},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use pinjam_server::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::{redis::RedisService, Services},
    AppState,
};

/// Initialize tracing. The returned guard must live as long as the process
/// when file logging is enabled.
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("pinjam_server={},tower_http=debug", logging.level).into());

    let stdout = match logging.format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().boxed(),
        _ => tracing_subscriber::fmt::layer().boxed(),
    };

    let (file, guard) = match logging.directory.as_deref() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "pinjam-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Pinjam Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let redis_service = RedisService::new(&config.redis.url)
        .await
        .context("Failed to connect to Redis")?;

    tracing::info!("Connected to Redis");

    let repository = Repository::new(pool);
    let services = Services::new(repository, &config, redis_service);

    services
        .users
        .ensure_admin()
        .await
        .context("Failed to create bootstrap administrator")?;

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/me", get(api::auth::me))
        // Users
        .route("/users", get(api::users::list_users).post(api::users::create_user))
        .route(
            "/users/:id",
            get(api::users::get_user)
                .put(api::users::update_user)
                .delete(api::users::delete_user),
        )
        // Categories
        .route(
            "/categories",
            get(api::categories::list_categories).post(api::categories::create_category),
        )
        .route("/categories/:id", get(api::categories::get_category))
        .route("/categories/:id", put(api::categories::update_category))
        .route("/categories/:id", delete(api::categories::delete_category))
        // Tools
        .route("/tools", get(api::tools::list_tools).post(api::tools::create_tool))
        .route("/tools/:id", get(api::tools::get_tool))
        .route("/tools/:id", put(api::tools::update_tool))
        .route("/tools/:id", delete(api::tools::delete_tool))
        .route("/tools/:id/stock", post(api::tools::adjust_stock))
        // Loans
        .route("/loans", get(api::loans::list_loans).post(api::loans::submit_loan))
        .route("/loans/mine", get(api::loans::my_loans))
        .route("/loans/:id", get(api::loans::get_loan))
        .route("/loans/:id/approve", post(api::loans::approve_loan))
        .route("/loans/:id/reject", post(api::loans::reject_loan))
        .route("/loans/:id/request-return", post(api::loans::request_return))
        .route("/loans/:id/return", post(api::loans::return_loan))
        .route("/loans/:id/confirm-return", post(api::loans::confirm_return))
        .route("/returns", get(api::returns::list_returns))
        // Audit
        .route("/audit-logs", get(api::audit_logs::list_audit_logs))
        // Reports
        .route("/reports/dashboard", get(api::reports::dashboard))
        .route("/reports/loans-by-day", get(api::reports::loans_by_day))
        .route("/reports/loans-by-category", get(api::reports::loans_by_category))
        .with_state(state);

    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}
