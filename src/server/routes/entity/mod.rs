//! Generic CRUD resource mounted once for every catalog entity.
//!
//! The `{resource}` segment selects the entity; unknown segments answer 404.

use crate::server::router::CurationState;
use axum::{Router, routing::get};

pub mod extract;
pub mod handlers;
pub mod respond;

pub fn router() -> Router<CurationState> {
    Router::new()
        .route(
            "/api/{resource}",
            get(handlers::list_entities).post(handlers::create_entity),
        )
        .route("/api/{resource}/count", get(handlers::count_entities))
        .route("/api/{resource}/search", get(handlers::search_entities))
        .route(
            "/api/{resource}/{id}",
            get(handlers::get_entity)
                .put(handlers::update_entity)
                .patch(handlers::patch_entity)
                .delete(handlers::delete_entity),
        )
}
