use anyhow::anyhow;
use axum::{Json, debug_handler, extract::State};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    AppState,
    auth::token::AuthUser,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub category: String,
}

async fn fetch_by_name(pool: &SqlitePool, name: &str) -> ApiResult<Option<Skill>> {
    // Exact, case-sensitive match; "Guitar" and "guitar" are distinct entries.
    let skill = sqlx::query_as::<_, Skill>("SELECT id, name, category FROM skills WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(skill)
}

/// Returns the existing row for the name, inserting it first if absent.
/// Two concurrent calls for a new name both land on the same row: the
/// UNIQUE(name) index makes the loser's insert a no-op and the re-select
/// picks up the winner's row.
pub(crate) async fn find_or_create(
    pool: &SqlitePool,
    name: &str,
    category: Option<&str>,
) -> ApiResult<Skill> {
    if let Some(skill) = fetch_by_name(pool, name).await? {
        return Ok(skill);
    }

    sqlx::query("INSERT INTO skills (id, name, category) VALUES (?, ?, ?) ON CONFLICT(name) DO NOTHING")
        .bind(Uuid::now_v7().to_string())
        .bind(name)
        .bind(category.unwrap_or("Other"))
        .execute(pool)
        .await?;

    fetch_by_name(pool, name)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow!("skill missing after insert")))
}

#[debug_handler(state = AppState)]
pub(crate) async fn list_skills(State(db_pool): State<SqlitePool>) -> ApiResult<Json<Vec<Skill>>> {
    let skills = sqlx::query_as::<_, Skill>("SELECT id, name, category FROM skills ORDER BY name")
        .fetch_all(&db_pool)
        .await?;
    Ok(Json(skills))
}

#[derive(Deserialize)]
pub(crate) struct CreateSkillBody {
    name: String,
    category: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn create_skill(
    State(db_pool): State<SqlitePool>,
    _user: AuthUser,
    Json(body): Json<CreateSkillBody>,
) -> ApiResult<Json<Skill>> {
    if body.name.trim().is_empty() {
        return Err(ApiError::validation("skill name is required"));
    }

    let skill = find_or_create(&db_pool, &body.name, body.category.as_deref()).await?;
    Ok(Json(skill))
}
