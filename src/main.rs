use axum::extract::DefaultBodyLimit;
use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use docsight_api::config;
use docsight_api::database::manager::DatabaseManager;
use docsight_api::handlers;
use docsight_api::middleware::jwt_auth_middleware;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docsight_api=info,tower_http=info".into()),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting docsight API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("DOCSIGHT_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("docsight API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API (JWT required)
        .merge(protected_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use axum::routing::post;
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

fn protected_routes() -> Router {
    use axum::routing::{post, put};
    use handlers::protected::{analyses, analyze, auth, plans, roles, subscription, teams, usage, users};

    let upload_limit = config::config().api.max_upload_bytes + 64 * 1024; // multipart overhead

    Router::new()
        // Session
        .route("/api/auth/whoami", get(auth::whoami))
        // User management
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        // Teams and membership
        .route("/api/teams", get(teams::list_teams).post(teams::create_team))
        .route(
            "/api/teams/:id",
            get(teams::get_team).put(teams::update_team).delete(teams::delete_team),
        )
        .route(
            "/api/teams/:id/members",
            get(teams::list_members).post(teams::add_member),
        )
        .route(
            "/api/teams/:id/members/:user_id",
            put(teams::update_member).delete(teams::remove_member),
        )
        // Permission matrix
        .route("/api/roles", get(roles::list_roles).post(roles::create_role))
        .route("/api/roles/:id", put(roles::update_role).delete(roles::delete_role))
        // Plans and subscription
        .route("/api/plans", get(plans::list_plans))
        .route("/api/subscription/upgrade", post(subscription::upgrade))
        // Usage metering and document analysis
        .route("/api/usage", get(usage::get_usage))
        .route("/api/analyses", get(analyses::list_analyses))
        .route(
            "/api/analyze",
            post(analyze::analyze).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .layer(axum::middleware::from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "docsight API",
            "version": version,
            "description": "Admin dashboard backend with plan-gated document analysis",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/register, /auth/login (public - token acquisition)",
                "auth": "/api/auth/whoami (protected)",
                "users": "/api/users[/:id] (protected)",
                "teams": "/api/teams[/:id][/members[/:user_id]] (protected)",
                "roles": "/api/roles[/:id] (protected)",
                "plans": "/api/plans (protected)",
                "subscription": "/api/subscription/upgrade (protected)",
                "usage": "/api/usage (protected)",
                "analyses": "/api/analyses (protected)",
                "analyze": "/api/analyze (protected, multipart upload)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
