use anyhow::Context;
use axum::{
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod auth;
mod config;
mod database;
mod error;
mod handlers;
mod mentions;
mod middleware;
mod services;
mod state;

use crate::config::{AppConfig, Environment};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();
    tracing::info!("Starting calendar API in {:?} mode", config.environment);

    if config.environment == Environment::Production && config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in production");
    }

    let pool = database::create_pool(&config.database).await.context("database pool")?;
    database::run_migrations(&pool).await.context("migrations")?;

    let notifier = services::notification_service::build_notifier(&config);
    let port = config.server.port;
    let state = AppState::new(pool, config, notifier);

    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Calendar API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}

fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let timeout = TimeoutLayer::new(Duration::from_secs(state.config.server.request_timeout_secs));

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(post_routes())
        .merge(comment_routes())
        .merge(user_routes())
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(timeout)
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<axum::http::HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/signout", post(auth::sign_out))
        .route("/auth/me", get(auth::me))
}

fn post_routes() -> Router<AppState> {
    use handlers::posts;

    Router::new()
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/bulk", post(posts::bulk_action))
        .route("/posts/analytics/summary", get(posts::analytics_summary))
        .route(
            "/posts/:id",
            get(posts::get_post).patch(posts::update_post).delete(posts::delete_post),
        )
}

fn comment_routes() -> Router<AppState> {
    use handlers::comments;

    Router::new()
        .route("/comments", post(comments::create_comment))
        .route(
            "/comments/:id",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route("/users", get(users::list_users))
        .route("/users/me", patch(users::update_me))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/role", patch(users::update_role))
}

async fn root() -> axum::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::Json(json!({
        "name": "Calendar API",
        "version": version,
        "endpoints": {
            "health": "/health (public)",
            "auth": "/auth/login|signup|signin (public), /auth/signout, /auth/me",
            "posts": "/posts, /posts/:id, /posts/bulk, /posts/analytics/summary",
            "comments": "/comments, /comments/:id",
            "users": "/users, /users/:id, /users/me, /users/:id/role",
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
