use axum::{
    Json, Router, debug_handler,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{AppState, auth::token::AuthUser, error::ApiResult};

pub fn router() -> Router<AppState> {
    Router::new().route("/browse", get(browse))
}

#[derive(Deserialize)]
pub(crate) struct BrowseQuery {
    skill: Option<String>,
    search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BrowseUser {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub profile_photo: Option<String>,
    pub availability: Option<String>,
    pub offered_skills: Vec<String>,
    pub wanted_skills: Vec<String>,
}

type BrowseRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn split_names(concatenated: Option<String>) -> Vec<String> {
    concatenated
        .map(|names| names.split(',').map(str::to_owned).collect())
        .unwrap_or_default()
}

#[debug_handler(state = AppState)]
pub(crate) async fn browse(
    State(db_pool): State<SqlitePool>,
    AuthUser { user_id }: AuthUser,
    Query(BrowseQuery { skill, search }): Query<BrowseQuery>,
) -> ApiResult<Json<Vec<BrowseUser>>> {
    let skill = skill.filter(|s| !s.is_empty());
    let search = search.filter(|s| !s.is_empty());

    let mut sql = String::from(
        "SELECT u.id, u.name, u.location, u.profile_photo, u.availability, \
                GROUP_CONCAT(DISTINCT so.name), GROUP_CONCAT(DISTINCT sw.name) \
         FROM users u \
         LEFT JOIN user_skills_offered uso ON uso.user_id = u.id \
         LEFT JOIN skills so ON so.id = uso.skill_id \
         LEFT JOIN user_skills_wanted usw ON usw.user_id = u.id \
         LEFT JOIN skills sw ON sw.id = usw.skill_id \
         WHERE u.is_public = 1 AND u.id <> ?",
    );
    // LIKE is case-insensitive for ASCII, matching the substring semantics
    // the client expects from its search boxes.
    if skill.is_some() {
        sql.push_str(" AND (so.name LIKE '%' || ? || '%' OR sw.name LIKE '%' || ? || '%')");
    }
    if search.is_some() {
        sql.push_str(" AND (u.name LIKE '%' || ? || '%' OR u.location LIKE '%' || ? || '%')");
    }
    sql.push_str(
        " GROUP BY u.id, u.name, u.location, u.profile_photo, u.availability ORDER BY u.name",
    );

    let mut query = sqlx::query_as::<_, BrowseRow>(&sql).bind(user_id.to_string());
    if let Some(skill) = &skill {
        query = query.bind(skill).bind(skill);
    }
    if let Some(search) = &search {
        query = query.bind(search).bind(search);
    }

    let rows = query.fetch_all(&db_pool).await?;
    let users = rows
        .into_iter()
        .map(
            |(id, name, location, profile_photo, availability, offered, wanted)| BrowseUser {
                id,
                name,
                location,
                profile_photo,
                availability,
                offered_skills: split_names(offered),
                wanted_skills: split_names(wanted),
            },
        )
        .collect();

    Ok(Json(users))
}
