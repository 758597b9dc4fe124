use crate::error::CurationError;
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use curation_schema::EntityKind;
use serde_json::Value;

fn path_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

async fn resolve<S>(parts: &mut Parts, state: &S) -> Result<(EntityKind, Vec<(String, String)>), CurationError>
where
    S: Send + Sync,
{
    let Path(params) = Path::<Vec<(String, String)>>::from_request_parts(parts, state)
        .await
        .map_err(|e| CurationError::InvalidPath(e.body_text()))?;

    let segment = path_param(&params, "resource").unwrap_or_default();
    let kind = EntityKind::from_path(segment)
        .ok_or_else(|| CurationError::UnknownResource(segment.to_string()))?;
    Ok((kind, params))
}

/// `/api/{resource}`: the entity addressed by the path segment; unknown segments are 404.
pub(crate) struct Resource(pub(crate) EntityKind);

impl<S> FromRequestParts<S> for Resource
where
    S: Send + Sync,
{
    type Rejection = CurationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let (kind, _) = resolve(parts, state).await?;
        Ok(Resource(kind))
    }
}

/// `/api/{resource}/{id}`.
pub(crate) struct ResourceId(pub(crate) EntityKind, pub(crate) i64);

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = CurationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let (kind, params) = resolve(parts, state).await?;
        let raw = path_param(&params, "id").unwrap_or_default();
        let id = raw
            .parse::<i64>()
            .map_err(|_| CurationError::InvalidPath(format!("`{raw}` is not a valid id")))?;
        Ok(ResourceId(kind, id))
    }
}

/// Decoded query-string pairs, in request order (`sort` may repeat).
pub(crate) struct QueryPairs(pub(crate) Vec<(String, String)>);

impl QueryPairs {
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// `eagerload=true` asks list endpoints for full related rows.
    pub(crate) fn eager(&self) -> bool {
        self.get("eagerload")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

impl<S> FromRequestParts<S> for QueryPairs
where
    S: Send + Sync,
{
    type Rejection = CurationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state).await?;
        Ok(QueryPairs(pairs))
    }
}

/// JSON request body; accepts `application/json` and `application/merge-patch+json`.
pub(crate) struct EntityBody(pub(crate) Value);

impl<S> FromRequest<S> for EntityBody
where
    S: Send + Sync,
{
    type Rejection = CurationError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, &()).await?;
        Ok(EntityBody(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eagerload_is_read_case_insensitively() {
        let pairs = QueryPairs(vec![
            ("page".to_string(), "0".to_string()),
            ("eagerload".to_string(), "TRUE".to_string()),
        ]);
        assert!(pairs.eager());
        assert_eq!(pairs.get("page"), Some("0"));

        let pairs = QueryPairs(vec![("eagerload".to_string(), "no".to_string())]);
        assert!(!pairs.eager());
    }
}
