pub mod lifecycle;

use anyhow::anyhow;
use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    auth::token::AuthUser,
    error::{ApiError, ApiResult},
};
use lifecycle::{Role, SwapStatus};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_swaps).post(create_swap))
        .route("/{id}", put(update_swap).delete(delete_swap))
}

/// A swap request as clients see it: the raw row plus the counterpart and
/// skill names resolved at read time.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SwapRequestView {
    pub id: String,
    pub requester_id: String,
    pub provider_id: String,
    pub requested_skill_id: String,
    pub offered_skill_id: Option<String>,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub requester_name: String,
    pub provider_name: String,
    pub requested_skill_name: Option<String>,
    pub offered_skill_name: Option<String>,
}

const ENRICHED_SELECT: &str = "SELECT sr.id, sr.requester_id, sr.provider_id, \
        sr.requested_skill_id, sr.offered_skill_id, sr.message, sr.status, \
        sr.created_at, sr.updated_at, \
        u_req.name AS requester_name, u_prov.name AS provider_name, \
        s_req.name AS requested_skill_name, s_off.name AS offered_skill_name \
     FROM swap_requests sr \
     JOIN users u_req ON u_req.id = sr.requester_id \
     JOIN users u_prov ON u_prov.id = sr.provider_id \
     LEFT JOIN skills s_req ON s_req.id = sr.requested_skill_id \
     LEFT JOIN skills s_off ON s_off.id = sr.offered_skill_id";

async fn fetch_view(pool: &SqlitePool, id: &str) -> ApiResult<SwapRequestView> {
    let sql = format!("{ENRICHED_SELECT} WHERE sr.id = ?");
    let view = sqlx::query_as::<_, SwapRequestView>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(view)
}

/// Requester/provider membership for a request, or NotFound. Absent row and
/// foreign row answer identically.
async fn fetch_membership(
    pool: &SqlitePool,
    id: &str,
    actor: &str,
) -> ApiResult<(Role, SwapStatus)> {
    let row: Option<(String, String, String)> =
        sqlx::query_as("SELECT requester_id, provider_id, status FROM swap_requests WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    let Some((requester_id, provider_id, status)) = row else {
        return Err(ApiError::NotFound);
    };

    let role = if actor == requester_id {
        Role::Requester
    } else if actor == provider_id {
        Role::Provider
    } else {
        return Err(ApiError::NotFound);
    };
    let status = SwapStatus::parse(&status)
        .ok_or_else(|| ApiError::Internal(anyhow!("corrupt swap status {status:?}")))?;
    Ok((role, status))
}

#[debug_handler(state = AppState)]
pub(crate) async fn list_swaps(
    State(db_pool): State<SqlitePool>,
    AuthUser { user_id }: AuthUser,
) -> ApiResult<Json<Vec<SwapRequestView>>> {
    let sql = format!(
        "{ENRICHED_SELECT} WHERE sr.requester_id = ? OR sr.provider_id = ? \
         ORDER BY sr.created_at DESC, sr.id DESC"
    );
    let swaps = sqlx::query_as::<_, SwapRequestView>(&sql)
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&db_pool)
        .await?;
    Ok(Json(swaps))
}

#[derive(Deserialize)]
pub(crate) struct CreateSwapBody {
    provider_id: String,
    requested_skill_id: String,
    offered_skill_id: Option<String>,
    message: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn create_swap(
    State(db_pool): State<SqlitePool>,
    AuthUser { user_id }: AuthUser,
    Json(body): Json<CreateSwapBody>,
) -> ApiResult<(StatusCode, Json<SwapRequestView>)> {
    let requester_id = user_id.to_string();
    if body.provider_id == requester_id {
        return Err(ApiError::validation("cannot request a swap with yourself"));
    }

    let provider_known = sqlx::query_as::<_, (i64,)>("SELECT 1 FROM users WHERE id = ?")
        .bind(&body.provider_id)
        .fetch_optional(&db_pool)
        .await?
        .is_some();
    if !provider_known {
        return Err(ApiError::validation("provider does not exist"));
    }

    for (skill_id, label) in [
        (Some(&body.requested_skill_id), "requested"),
        (body.offered_skill_id.as_ref(), "offered"),
    ] {
        let Some(skill_id) = skill_id else { continue };
        let known = sqlx::query_as::<_, (i64,)>("SELECT 1 FROM skills WHERE id = ?")
            .bind(skill_id)
            .fetch_optional(&db_pool)
            .await?
            .is_some();
        if !known {
            return Err(ApiError::validation(format!("{label} skill does not exist")));
        }
    }

    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO swap_requests (id, requester_id, provider_id, requested_skill_id, \
         offered_skill_id, message) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(&requester_id)
    .bind(&body.provider_id)
    .bind(&body.requested_skill_id)
    .bind(&body.offered_skill_id)
    .bind(&body.message)
    .execute(&db_pool)
    .await?;
    info!(swap_id = %id, "created swap request");

    let view = fetch_view(&db_pool, &id.to_string()).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[derive(Deserialize)]
pub(crate) struct UpdateSwapBody {
    status: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_swap(
    State(db_pool): State<SqlitePool>,
    AuthUser { user_id }: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateSwapBody>,
) -> ApiResult<Json<SwapRequestView>> {
    let id = id.to_string();
    let (role, current) = fetch_membership(&db_pool, &id, &user_id.to_string()).await?;

    let Some(next) = SwapStatus::parse(&body.status) else {
        return Err(ApiError::validation(format!(
            "unknown status {:?}",
            body.status
        )));
    };
    if !current.can_transition(role, next) {
        return Err(ApiError::validation(format!(
            "cannot move a {current} request to {next}"
        )));
    }

    // Guarding on the old status makes a lost race surface as NotFound
    // instead of clobbering a concurrent transition.
    let result = sqlx::query(
        "UPDATE swap_requests SET status = ?, updated_at = datetime('now') \
         WHERE id = ? AND status = ?",
    )
    .bind(next.as_str())
    .bind(&id)
    .bind(current.as_str())
    .execute(&db_pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }
    info!(swap_id = %id, from = %current, to = %next, "swap transition");

    let view = fetch_view(&db_pool, &id).await?;
    Ok(Json(view))
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete_swap(
    State(db_pool): State<SqlitePool>,
    AuthUser { user_id }: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let id = id.to_string();
    let (role, status) = fetch_membership(&db_pool, &id, &user_id.to_string()).await?;

    // The provider never deletes, and is not told whether the row exists.
    if role != Role::Requester {
        return Err(ApiError::NotFound);
    }
    if !status.is_deletable() {
        return Err(ApiError::validation(format!(
            "cannot delete a {status} request"
        )));
    }

    sqlx::query("DELETE FROM swap_requests WHERE id = ? AND requester_id = ?")
        .bind(&id)
        .bind(user_id.to_string())
        .execute(&db_pool)
        .await?;
    info!(swap_id = %id, "deleted swap request");

    Ok(Json(json!({ "message": "swap request deleted" })))
}
