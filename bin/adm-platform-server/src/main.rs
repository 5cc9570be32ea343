//! Admissions Platform Server
//!
//! Production server for the admissions REST APIs:
//! - Auth APIs: register, login, me, teachers
//! - Student APIs: intake, role-scoped listing, updates, deletion,
//!   dashboard stats, decision notifications
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ADM_API_PORT` | `8080` | HTTP API port |
//! | `ADM_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `ADM_MONGO_DB` | `admissions` | MongoDB database name |
//! | `ADM_JWT_SECRET` | - | HMAC secret for access tokens (required) |
//! | `ADM_JWT_ISSUER` | `admissions-platform` | JWT issuer claim |
//! | `ADM_TOKEN_EXPIRY_SECS` | `2592000` | Access token lifetime |
//! | `ADM_SMTP_HOST` | - | SMTP relay; emails disabled when unset |
//! | `ADM_SMTP_USERNAME` | - | SMTP username |
//! | `ADM_SMTP_PASSWORD` | - | SMTP password |
//! | `ADM_MAIL_FROM` | `admissions@krmu.edu.in` | Notification sender address |
//! | `ADM_DEV_MODE` | - | `true` seeds default staff accounts |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use adm_platform::seed::DevDataSeeder;
use adm_platform::{
    auth_router, students_router, AppState, AuthConfig, AuthLayer, AuthService, AuthState,
    MailConfig, MailService, PasswordService, StudentRepository, StudentsState, UserRepository,
};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    adm_common::logging::init_logging("adm-platform-server");

    info!("Starting Admissions Platform Server");

    // Configuration from environment
    let api_port: u16 = env_or_parse("ADM_API_PORT", 8080);
    let mongo_url = env_or("ADM_MONGO_URL", "mongodb://localhost:27017");
    let mongo_db = env_or("ADM_MONGO_DB", "admissions");
    let jwt_issuer = env_or("ADM_JWT_ISSUER", "admissions-platform");
    let jwt_secret = std::env::var("ADM_JWT_SECRET").unwrap_or_else(|_| {
        warn!("ADM_JWT_SECRET not set; using an insecure development secret");
        "dev-secret-change-me".to_string()
    });

    // Connect to MongoDB once; the handle is shared for the process lifetime
    info!("Connecting to MongoDB: {}/{}", mongo_url, mongo_db);
    let mongo_client = mongodb::Client::with_uri_str(&mongo_url).await?;
    let db = mongo_client.database(&mongo_db);

    // Initialize repositories
    let user_repo = Arc::new(UserRepository::new(&db));
    let student_repo = Arc::new(StudentRepository::new(&db));
    info!("Repositories initialized");

    // Unique indexes back the application-level uniqueness checks
    if let Err(e) = user_repo.ensure_indexes().await {
        warn!("User index creation failed: {}", e);
    }
    if let Err(e) = student_repo.ensure_indexes().await {
        warn!("Student index creation failed: {}", e);
    }

    // Seed development data if in dev mode
    let dev_mode = std::env::var("ADM_DEV_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    if dev_mode {
        let seeder = DevDataSeeder::new(&db);
        if let Err(e) = seeder.seed().await {
            warn!("Dev data seeding skipped (data may already exist): {}", e);
        }
    }

    // Initialize services
    let auth_config = AuthConfig {
        secret_key: jwt_secret,
        issuer: jwt_issuer,
        token_expiry_secs: env_or_parse("ADM_TOKEN_EXPIRY_SECS", 86400 * 30),
    };
    let auth_service = Arc::new(AuthService::new(auth_config));
    let password_service = Arc::new(PasswordService::default());

    let mail_config = MailConfig {
        smtp_host: std::env::var("ADM_SMTP_HOST").ok(),
        smtp_username: env_or("ADM_SMTP_USERNAME", ""),
        smtp_password: env_or("ADM_SMTP_PASSWORD", ""),
        from_address: env_or("ADM_MAIL_FROM", "admissions@krmu.edu.in"),
    };
    let mail_service = Arc::new(MailService::new(mail_config)?);
    info!("Services initialized");

    // Gate state, injected into every request by AuthLayer
    let app_state = AppState {
        auth_service: auth_service.clone(),
        user_repo: user_repo.clone(),
    };

    let auth_state = AuthState {
        auth_service,
        user_repo: user_repo.clone(),
        password_service,
    };
    let students_state = StudentsState {
        student_repo,
        user_repo,
        mail_service,
    };

    // Build API router using OpenApiRouter for auto-collected OpenAPI paths
    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/api/auth", auth_router(auth_state))
        .nest("/api/students", students_router(students_state))
        .split_for_parts();

    openapi.info.title = "Admissions Platform API".to_string();
    openapi.info.version = "1.0.0".to_string();
    openapi.info.description =
        Some("REST APIs for staff accounts and applicant management".to_string());

    let app = Router::new()
        .merge(router)
        .route("/health", get(health_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(AuthLayer::new(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    // Start API server
    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let listener = TcpListener::bind(&api_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Admissions Platform Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
