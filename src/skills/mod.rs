pub mod catalog;
pub mod listings;

use axum::{Router, routing::get};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(catalog::list_skills).post(catalog::create_skill))
}
