use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    AppState,
    auth::token::AuthUser,
    error::{ApiError, ApiResult},
    swaps::lifecycle::SwapStatus,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_rating))
        .route("/user/{user_id}", get(rating_summary))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Rating {
    pub id: String,
    pub swap_request_id: String,
    pub rater_id: String,
    pub rated_id: String,
    pub rating: i64,
    pub feedback: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RatedEntry {
    pub id: String,
    pub swap_request_id: String,
    pub rater_id: String,
    pub rated_id: String,
    pub rating: i64,
    pub feedback: Option<String>,
    pub created_at: String,
    pub rater_name: String,
}

#[derive(Debug, Serialize)]
pub struct RatingSummary {
    pub ratings: Vec<RatedEntry>,
    pub average_rating: f64,
    pub total_ratings: i64,
}

#[derive(Deserialize)]
pub(crate) struct CreateRatingBody {
    swap_request_id: String,
    rated_id: String,
    rating: i64,
    feedback: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn create_rating(
    State(db_pool): State<SqlitePool>,
    AuthUser { user_id }: AuthUser,
    Json(body): Json<CreateRatingBody>,
) -> ApiResult<(StatusCode, Json<Rating>)> {
    if !(1..=5).contains(&body.rating) {
        return Err(ApiError::validation("rating must be between 1 and 5"));
    }

    let swap: Option<(String, String, String)> =
        sqlx::query_as("SELECT requester_id, provider_id, status FROM swap_requests WHERE id = ?")
            .bind(&body.swap_request_id)
            .fetch_optional(&db_pool)
            .await?;
    let Some((requester_id, provider_id, status)) = swap else {
        return Err(ApiError::NotFound);
    };

    let rater_id = user_id.to_string();
    let counterpart = if rater_id == requester_id {
        &provider_id
    } else if rater_id == provider_id {
        &requester_id
    } else {
        return Err(ApiError::NotFound);
    };
    if &body.rated_id != counterpart {
        return Err(ApiError::validation(
            "rated user must be the other party to the swap",
        ));
    }

    match SwapStatus::parse(&status) {
        Some(SwapStatus::Accepted) | Some(SwapStatus::Completed) => {}
        _ => {
            return Err(ApiError::validation(
                "swap must be accepted before it can be rated",
            ));
        }
    }

    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO ratings (id, swap_request_id, rater_id, rated_id, rating, feedback) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(&body.swap_request_id)
    .bind(&rater_id)
    .bind(&body.rated_id)
    .bind(body.rating)
    .bind(&body.feedback)
    .execute(&db_pool)
    .await
    .map_err(|err| ApiError::or_conflict(err, "swap already rated"))?;

    let rating = sqlx::query_as::<_, Rating>(
        "SELECT id, swap_request_id, rater_id, rated_id, rating, feedback, created_at \
         FROM ratings WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_one(&db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(rating)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn rating_summary(
    State(db_pool): State<SqlitePool>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<RatingSummary>> {
    let ratings = sqlx::query_as::<_, RatedEntry>(
        "SELECT r.id, r.swap_request_id, r.rater_id, r.rated_id, r.rating, r.feedback, \
                r.created_at, u.name AS rater_name \
         FROM ratings r \
         JOIN users u ON u.id = r.rater_id \
         WHERE r.rated_id = ? \
         ORDER BY r.created_at DESC, r.id DESC",
    )
    .bind(&user_id)
    .fetch_all(&db_pool)
    .await?;

    let (average, total): (Option<f64>, i64) =
        sqlx::query_as("SELECT AVG(rating), COUNT(*) FROM ratings WHERE rated_id = ?")
            .bind(&user_id)
            .fetch_one(&db_pool)
            .await?;

    Ok(Json(RatingSummary {
        ratings,
        average_rating: average.unwrap_or(0.0),
        total_ratings: total,
    }))
}
