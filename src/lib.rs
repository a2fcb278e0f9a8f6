pub mod auth;
pub mod browse;
pub mod db;
pub mod error;
pub mod profile;
pub mod ratings;
pub mod skills;
pub mod swaps;

use std::path::PathBuf;

use axum::{Router, extract::FromRef};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, services::ServeDir};

use auth::token::JwtKeys;
pub use error::{ApiError, ApiResult};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub keys: JwtKeys,
    pub upload_dir: UploadDir,
}

#[derive(Clone)]
pub struct UploadDir(pub PathBuf);

pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/profile", profile::router())
        .nest("/api/skills", skills::router())
        .nest("/api/user/skills", skills::listings::router())
        .nest("/api/users", browse::router())
        .nest("/api/swap-requests", swaps::router())
        .nest("/api/ratings", ratings::router())
        .nest_service("/uploads", ServeDir::new(state.upload_dir.0.clone()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
