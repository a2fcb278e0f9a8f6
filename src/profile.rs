use std::path::Path;

use axum::{
    Json, Router, debug_handler,
    extract::{Multipart, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    AppState, UploadDir,
    auth::token::AuthUser,
    error::{ApiError, ApiResult},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile).put(update_profile))
        .route("/photo", post(upload_photo))
}

/// The projection handed to clients. The password hash stays in the store.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub location: Option<String>,
    pub profile_photo: Option<String>,
    pub availability: Option<String>,
    pub is_public: bool,
}

pub(crate) async fn fetch_profile(
    pool: &SqlitePool,
    user_id: &str,
) -> ApiResult<Option<UserProfile>> {
    let profile = sqlx::query_as::<_, UserProfile>(
        "SELECT id, name, email, location, profile_photo, availability, is_public \
         FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(profile)
}

#[debug_handler(state = AppState)]
pub(crate) async fn get_profile(
    State(db_pool): State<SqlitePool>,
    AuthUser { user_id }: AuthUser,
) -> ApiResult<Json<UserProfile>> {
    let profile = fetch_profile(&db_pool, &user_id.to_string())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(profile))
}

#[derive(Deserialize)]
pub(crate) struct UpdateProfileBody {
    name: String,
    location: Option<String>,
    availability: Option<String>,
    is_public: bool,
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_profile(
    State(db_pool): State<SqlitePool>,
    AuthUser { user_id }: AuthUser,
    Json(body): Json<UpdateProfileBody>,
) -> ApiResult<Json<UserProfile>> {
    if body.name.trim().is_empty() {
        return Err(ApiError::validation("name is required"));
    }

    sqlx::query(
        "UPDATE users SET name = ?, location = ?, availability = ?, is_public = ?, \
         updated_at = datetime('now') WHERE id = ?",
    )
    .bind(&body.name)
    .bind(&body.location)
    .bind(&body.availability)
    .bind(body.is_public)
    .bind(user_id.to_string())
    .execute(&db_pool)
    .await?;

    let profile = fetch_profile(&db_pool, &user_id.to_string())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(profile))
}

#[debug_handler(state = AppState)]
pub(crate) async fn upload_photo(
    State(db_pool): State<SqlitePool>,
    State(UploadDir(upload_dir)): State<UploadDir>,
    AuthUser { user_id }: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::validation(err.to_string()))?
    {
        if field.name() != Some("photo") {
            continue;
        }

        let extension = field
            .file_name()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let filename = format!("{}{extension}", Uuid::now_v7());

        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::validation(err.to_string()))?;
        tokio::fs::write(upload_dir.join(&filename), &bytes)
            .await
            .map_err(|err| ApiError::Internal(err.into()))?;

        let photo_url = format!("/uploads/{filename}");
        sqlx::query(
            "UPDATE users SET profile_photo = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(&photo_url)
        .bind(user_id.to_string())
        .execute(&db_pool)
        .await?;

        return Ok(Json(json!({ "profile_photo": photo_url })));
    }

    Err(ApiError::validation("no file uploaded"))
}
