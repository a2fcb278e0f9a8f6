use std::path::PathBuf;

use skillswap::{AppState, UploadDir, app, auth::token::JwtKeys, db};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("skillswap=info,tower_http=info")),
        )
        .init();

    let database_url =
        dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://skillswap.db".to_string());
    let db_pool = db::connect(&database_url).await?;
    db::init_schema(&db_pool).await?;

    let upload_dir = PathBuf::from(dotenv::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()));
    tokio::fs::create_dir_all(&upload_dir).await?;

    let secret = dotenv::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".to_string());
    let state = AppState {
        db_pool,
        keys: JwtKeys::new(&secret),
        upload_dir: UploadDir(upload_dir),
    };

    let addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
