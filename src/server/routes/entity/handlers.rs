use super::extract::{EntityBody, QueryPairs, Resource, ResourceId};
use super::respond;
use crate::error::CurationError;
use crate::server::router::CurationState;
use axum::{
    Json,
    extract::State,
    http::Uri,
    response::{IntoResponse, Response},
};
use curation_schema::{Criteria, PageRequest};

pub(super) async fn list_entities(
    State(state): State<CurationState>,
    Resource(kind): Resource,
    uri: Uri,
    params: QueryPairs,
) -> Result<Response, CurationError> {
    let def = kind.def();
    let criteria = Criteria::parse(def, params.iter())?;
    let page = PageRequest::parse(def, params.iter(), state.paging)?;

    let (rows, meta) = state
        .service
        .find_page(kind, criteria, page, params.eager())
        .await?;
    Ok(respond::page(&uri, &meta, rows))
}

pub(super) async fn create_entity(
    State(state): State<CurationState>,
    Resource(kind): Resource,
    EntityBody(body): EntityBody,
) -> Result<Response, CurationError> {
    let created = state.service.create(kind, body).await?;
    Ok(respond::created(kind.def(), created))
}

pub(super) async fn count_entities(
    State(state): State<CurationState>,
    Resource(kind): Resource,
    params: QueryPairs,
) -> Result<Json<u64>, CurationError> {
    let criteria = Criteria::parse(kind.def(), params.iter())?;
    Ok(Json(state.service.count(kind, criteria).await?))
}

pub(super) async fn search_entities(
    State(state): State<CurationState>,
    Resource(kind): Resource,
    uri: Uri,
    params: QueryPairs,
) -> Result<Response, CurationError> {
    let needle = params
        .get("query")
        .ok_or_else(|| CurationError::InvalidQuery("missing `query` parameter".to_string()))?;
    // Ranking fixes the order; only `page` and `size` apply.
    let page = PageRequest::parse(
        kind.def(),
        params.iter().filter(|(key, _)| *key != "sort"),
        state.paging,
    )?;

    let (rows, meta) = state.service.search(kind, needle, page).await?;
    Ok(respond::page(&uri, &meta, rows))
}

pub(super) async fn get_entity(
    State(state): State<CurationState>,
    ResourceId(kind, id): ResourceId,
) -> Result<impl IntoResponse, CurationError> {
    Ok(Json(state.service.find_one(kind, id).await?))
}

pub(super) async fn update_entity(
    State(state): State<CurationState>,
    ResourceId(kind, id): ResourceId,
    EntityBody(body): EntityBody,
) -> Result<Response, CurationError> {
    let updated = state.service.update(kind, id, body).await?;
    Ok(respond::updated(kind.def(), updated))
}

pub(super) async fn patch_entity(
    State(state): State<CurationState>,
    ResourceId(kind, id): ResourceId,
    EntityBody(body): EntityBody,
) -> Result<Response, CurationError> {
    let updated = state.service.partial_update(kind, id, body).await?;
    Ok(respond::updated(kind.def(), updated))
}

pub(super) async fn delete_entity(
    State(state): State<CurationState>,
    ResourceId(kind, id): ResourceId,
) -> Result<Response, CurationError> {
    state.service.delete(kind, id).await?;
    Ok(respond::deleted(kind.def(), id))
}
