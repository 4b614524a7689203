#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod services;

use crate::auth::{attach_auth_service, AuthConfig, AuthRouterExt, AuthService};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::entities::Role;
use crate::services::AppServices;
use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub auth: Arc<AuthService>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config), db.clone()));
        let services = AppServices::new(db.clone());
        Self {
            db,
            config,
            auth,
            services,
        }
    }
}

/// All `/api` routes, grouped by required access level.
pub fn api_routes() -> Router<AppState> {
    public_routes()
        .merge(read_routes())
        .merge(write_routes())
        .merge(self_service_routes())
        .merge(admin_routes())
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/register", post(handlers::auth::register))
}

/// Reads: any authenticated user.
fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(handlers::suppliers::list))
        .route("/suppliers/:id", get(handlers::suppliers::get))
        .route("/customers", get(handlers::customers::list))
        .route("/customers/:id", get(handlers::customers::get))
        .route("/products", get(handlers::products::list))
        .route("/products/:id", get(handlers::products::get))
        .route("/milk-purchases", get(handlers::milk_purchases::list))
        .route("/milk-purchases/:id", get(handlers::milk_purchases::get))
        .route("/sales", get(handlers::sales::list))
        .route("/sales/:id", get(handlers::sales::get))
        .route("/dashboard", get(handlers::dashboard::range))
        .route("/dashboard/summary", get(handlers::dashboard::summary))
        .route("/dashboard/all-time", get(handlers::dashboard::all_time))
        .with_auth()
}

/// Writes to business records: MANAGER and above.
fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", post(handlers::suppliers::create))
        .route(
            "/suppliers/:id",
            put(handlers::suppliers::update).delete(handlers::suppliers::delete),
        )
        .route("/customers", post(handlers::customers::create))
        .route(
            "/customers/:id",
            put(handlers::customers::update).delete(handlers::customers::delete),
        )
        .route("/products", post(handlers::products::create))
        .route(
            "/products/:id",
            put(handlers::products::update).delete(handlers::products::delete),
        )
        .route("/milk-purchases", post(handlers::milk_purchases::create))
        .route(
            "/milk-purchases/:id",
            put(handlers::milk_purchases::update).delete(handlers::milk_purchases::delete),
        )
        .route("/sales", post(handlers::sales::create))
        .route(
            "/sales/:id",
            put(handlers::sales::update).delete(handlers::sales::delete),
        )
        .with_role(Role::Manager)
}

/// Endpoints any authenticated user may call about themselves. The
/// password handler itself enforces admin-or-self.
fn self_service_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(handlers::users::me))
        .route("/users/:id/password", put(handlers::users::update_password))
        .with_auth()
}

/// User and session administration: ADMIN only.
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::users::list))
        .route(
            "/users/:id",
            get(handlers::users::get).delete(handlers::users::delete),
        )
        .route("/users/:id/role", put(handlers::users::update_role))
        .route("/session-logs", get(handlers::sessions::list))
        .route("/session-logs/:token", delete(handlers::sessions::delete))
        .with_role(Role::Admin)
}

/// Builds the full application router, including the unauthenticated
/// status endpoints and the auth-service extension layer.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/health", get(health))
        .nest("/api", api_routes())
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            attach_auth_service,
        ))
        .with_state(state)
}

async fn status() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl IntoResponse {
    match db::check_connection(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "database": "connected" })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy", "database": "unreachable" })),
        ),
    }
}
