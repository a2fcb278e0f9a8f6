use axum::{
    Json, Router, debug_handler,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    AppState,
    auth::token::AuthUser,
    error::{ApiError, ApiResult},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/offered", get(list_offered).post(add_offered))
        .route("/wanted", get(list_wanted).post(add_wanted))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Proficiency {
    pub fn parse(s: &str) -> Option<Proficiency> {
        use Proficiency::*;
        match s {
            "beginner" => Some(Beginner),
            "intermediate" => Some(Intermediate),
            "advanced" => Some(Advanced),
            "expert" => Some(Expert),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        use Proficiency::*;
        match self {
            Beginner => "beginner",
            Intermediate => "intermediate",
            Advanced => "advanced",
            Expert => "expert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Low,
    Medium,
    High,
    Urgent,
}

impl Urgency {
    pub fn parse(s: &str) -> Option<Urgency> {
        use Urgency::*;
        match s {
            "low" => Some(Low),
            "medium" => Some(Medium),
            "high" => Some(High),
            "urgent" => Some(Urgent),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        use Urgency::*;
        match self {
            Low => "low",
            Medium => "medium",
            High => "high",
            Urgent => "urgent",
        }
    }
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OfferedListing {
    pub id: String,
    pub skill_id: String,
    pub proficiency_level: String,
    pub description: Option<String>,
    pub skill_name: String,
    pub category: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct WantedListing {
    pub id: String,
    pub skill_id: String,
    pub urgency_level: String,
    pub description: Option<String>,
    pub skill_name: String,
    pub category: String,
    pub created_at: String,
}

async fn skill_exists(pool: &SqlitePool, skill_id: &str) -> ApiResult<bool> {
    let found = sqlx::query_as::<_, (i64,)>("SELECT 1 FROM skills WHERE id = ?")
        .bind(skill_id)
        .fetch_optional(pool)
        .await?
        .is_some();
    Ok(found)
}

#[debug_handler(state = AppState)]
pub(crate) async fn list_offered(
    State(db_pool): State<SqlitePool>,
    AuthUser { user_id }: AuthUser,
) -> ApiResult<Json<Vec<OfferedListing>>> {
    let listings = sqlx::query_as::<_, OfferedListing>(
        "SELECT o.id, o.skill_id, o.proficiency_level, o.description, \
                s.name AS skill_name, s.category, o.created_at \
         FROM user_skills_offered o \
         JOIN skills s ON s.id = o.skill_id \
         WHERE o.user_id = ?",
    )
    .bind(user_id.to_string())
    .fetch_all(&db_pool)
    .await?;
    Ok(Json(listings))
}

#[derive(Deserialize)]
pub(crate) struct AddOfferedBody {
    skill_id: String,
    proficiency_level: String,
    description: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn add_offered(
    State(db_pool): State<SqlitePool>,
    AuthUser { user_id }: AuthUser,
    Json(body): Json<AddOfferedBody>,
) -> ApiResult<(StatusCode, Json<OfferedListing>)> {
    let Some(level) = Proficiency::parse(&body.proficiency_level) else {
        return Err(ApiError::validation("invalid proficiency level"));
    };
    if !skill_exists(&db_pool, &body.skill_id).await? {
        return Err(ApiError::validation("skill does not exist"));
    }

    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO user_skills_offered (id, user_id, skill_id, proficiency_level, description) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(&body.skill_id)
    .bind(level.as_str())
    .bind(&body.description)
    .execute(&db_pool)
    .await
    .map_err(|err| ApiError::or_conflict(err, "skill is already listed as offered"))?;

    let listing = sqlx::query_as::<_, OfferedListing>(
        "SELECT o.id, o.skill_id, o.proficiency_level, o.description, \
                s.name AS skill_name, s.category, o.created_at \
         FROM user_skills_offered o \
         JOIN skills s ON s.id = o.skill_id \
         WHERE o.id = ?",
    )
    .bind(id.to_string())
    .fetch_one(&db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(listing)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn list_wanted(
    State(db_pool): State<SqlitePool>,
    AuthUser { user_id }: AuthUser,
) -> ApiResult<Json<Vec<WantedListing>>> {
    let listings = sqlx::query_as::<_, WantedListing>(
        "SELECT w.id, w.skill_id, w.urgency_level, w.description, \
                s.name AS skill_name, s.category, w.created_at \
         FROM user_skills_wanted w \
         JOIN skills s ON s.id = w.skill_id \
         WHERE w.user_id = ?",
    )
    .bind(user_id.to_string())
    .fetch_all(&db_pool)
    .await?;
    Ok(Json(listings))
}

#[derive(Deserialize)]
pub(crate) struct AddWantedBody {
    skill_id: String,
    urgency_level: String,
    description: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn add_wanted(
    State(db_pool): State<SqlitePool>,
    AuthUser { user_id }: AuthUser,
    Json(body): Json<AddWantedBody>,
) -> ApiResult<(StatusCode, Json<WantedListing>)> {
    let Some(level) = Urgency::parse(&body.urgency_level) else {
        return Err(ApiError::validation("invalid urgency level"));
    };
    if !skill_exists(&db_pool, &body.skill_id).await? {
        return Err(ApiError::validation("skill does not exist"));
    }

    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO user_skills_wanted (id, user_id, skill_id, urgency_level, description) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(&body.skill_id)
    .bind(level.as_str())
    .bind(&body.description)
    .execute(&db_pool)
    .await
    .map_err(|err| ApiError::or_conflict(err, "skill is already listed as wanted"))?;

    let listing = sqlx::query_as::<_, WantedListing>(
        "SELECT w.id, w.skill_id, w.urgency_level, w.description, \
                s.name AS skill_name, s.category, w.created_at \
         FROM user_skills_wanted w \
         JOIN skills s ON s.id = w.skill_id \
         WHERE w.id = ?",
    )
    .bind(id.to_string())
    .fetch_one(&db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(listing)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_round_trip() {
        for s in ["beginner", "intermediate", "advanced", "expert"] {
            assert_eq!(Proficiency::parse(s).unwrap().as_str(), s);
        }
        for s in ["low", "medium", "high", "urgent"] {
            assert_eq!(Urgency::parse(s).unwrap().as_str(), s);
        }
        assert!(Proficiency::parse("guru").is_none());
        assert!(Urgency::parse("asap").is_none());
    }
}
