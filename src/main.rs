//! Escola Backend - School Management Information System
//! Relational ledger + fund balance reports behind a token-protected API.

mod api;
mod auth;
mod balance;
mod ledger;
mod middleware;
mod models;
mod roster;

use anyhow::{Context, Result};
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api::{routes::health_check, AppState},
    auth::{api as auth_api, api::AuthState, auth_middleware, JwtHandler, UserStore},
    ledger::{seed::seed_demo_data, LedgerStore},
    roster::{seed_demo_roster, RosterStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    info!("Escola backend starting");

    // Authentication system
    let auth_db_path = resolve_data_path(env::var("AUTH_DB_PATH").ok(), "escola_auth.db");
    let jwt_secret = env::var("JWT_SECRET")
        .unwrap_or_else(|_| "dev-secret-change-in-production-minimum-32-characters".to_string());

    let user_store = Arc::new(UserStore::new(&auth_db_path)?);
    let jwt_handler = Arc::new(JwtHandler::new(jwt_secret));
    let auth_state = AuthState::new(user_store.clone(), jwt_handler.clone());

    info!("Authentication initialized at: {}", auth_db_path);

    // Ledger + roster stores
    let ledger_db_path = resolve_data_path(env::var("ESCOLA_DB_PATH").ok(), "escola_ledger.db");
    let ledger = Arc::new(LedgerStore::new(&ledger_db_path)?);
    let roster = Arc::new(RosterStore::new(&ledger_db_path)?);

    info!("Ledger initialized at: {}", ledger_db_path);

    let seed_enabled = env::var("SEED_DEMO_DATA")
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(false);
    if seed_enabled {
        seed_demo_data(&ledger).await?;
        seed_demo_roster(&roster).await?;
    }

    let app_state = AppState { ledger, roster };

    // Auth routes (separate router with auth state)
    let auth_router = Router::new()
        .route("/api/auth/login", post(auth_api::login))
        .with_state(auth_state.clone());

    // Admin routes and /me need both claims middleware and auth state
    let admin_router = Router::new()
        .route(
            "/api/admin/users",
            get(auth_api::list_users).post(auth_api::create_user),
        )
        .route("/api/admin/users/:id", delete(auth_api::delete_user))
        .route("/api/auth/me", get(auth_api::get_current_user))
        .route_layer(axum_middleware::from_fn_with_state(
            jwt_handler.clone(),
            auth_middleware,
        ))
        .with_state(auth_state);

    // Protected API routes
    let protected_routes = api::create_router(app_state).route_layer(
        axum_middleware::from_fn_with_state(jwt_handler.clone(), auth_middleware),
    );

    // Public routes
    let public_routes = Router::new().route("/health", get(health_check));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_router)
        .merge(auth_router)
        .layer(axum_middleware::from_fn(
            crate::middleware::request_logging,
        ))
        .layer(CorsLayer::permissive());

    // Start server
    let port = env::var("API_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Initialize tracing with env-filter overrides
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "escola_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_data_path(filename: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(filename)
        .to_string_lossy()
        .to_string()
}

fn resolve_data_path(env_value: Option<String>, default_filename: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let Some(raw) = env_value.filter(|v| !v.trim().is_empty()) else {
        return default_data_path(default_filename);
    };

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    // Treat relative paths as relative to the crate dir, not the caller's cwd.
    base.join(p).to_string_lossy().to_string()
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try crate-dir .env (common when running with --manifest-path)
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let candidates = [manifest_dir.join(".env"), manifest_dir.join("../.env")];

    for p in candidates {
        if p.exists() {
            let _ = dotenv::from_path(&p);
        }
    }
}
