pub mod password;
pub mod token;

use axum::{Json, Router, debug_handler, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    profile::{UserProfile, fetch_profile},
};
use token::JwtKeys;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[derive(Deserialize)]
pub(crate) struct RegisterBody {
    name: String,
    email: String,
    password: String,
    location: Option<String>,
    availability: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct LoginBody {
    email: String,
    password: String,
}

#[derive(Serialize)]
pub(crate) struct AuthResponse {
    token: String,
    user: UserProfile,
}

#[debug_handler(state = AppState)]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    State(keys): State<JwtKeys>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::validation("email and password are required"));
    }

    let taken = sqlx::query_as::<_, (i64,)>("SELECT 1 FROM users WHERE email = ?")
        .bind(&body.email)
        .fetch_optional(&db_pool)
        .await?
        .is_some();
    if taken {
        return Err(ApiError::validation("user already exists"));
    }

    let id = Uuid::now_v7();
    let password_hash = password::hash(&body.password)?;
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, location, availability) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(&body.name)
    .bind(&body.email)
    .bind(&password_hash)
    .bind(&body.location)
    .bind(&body.availability)
    .execute(&db_pool)
    .await
    .map_err(|err| ApiError::or_conflict(err, "user already exists"))?;

    let user = fetch_profile(&db_pool, &id.to_string())
        .await?
        .ok_or(ApiError::NotFound)?;
    let token = keys.mint(id, &body.email)?;
    info!(user_id = %id, "registered user");

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    State(keys): State<JwtKeys>,
    Json(body): Json<LoginBody>,
) -> ApiResult<Json<AuthResponse>> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE email = ?")
            .bind(&body.email)
            .fetch_optional(&db_pool)
            .await?;

    // Unknown email and wrong password answer identically.
    let Some((id, password_hash)) = row else {
        return Err(ApiError::validation("invalid credentials"));
    };
    if !password::verify(&body.password, &password_hash)? {
        return Err(ApiError::validation("invalid credentials"));
    }

    let user = fetch_profile(&db_pool, &id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let user_id = Uuid::parse_str(&id).map_err(anyhow::Error::from)?;
    let token = keys.mint(user_id, &body.email)?;

    Ok(Json(AuthResponse { token, user }))
}
