use crate::error::{ALERT_HEADER, PARAMS_HEADER};
use crate::server::router::X_TOTAL_COUNT;
use axum::{
    Json,
    http::{
        HeaderMap, HeaderValue, StatusCode, Uri,
        header::{LINK, LOCATION},
    },
    response::{IntoResponse, Response},
};
use curation_schema::{EntityDef, PageMeta};
use serde_json::Value;

const APP_NAME: &str = "oncokbCurationApp";

#[derive(Debug, Clone, Copy)]
pub(crate) enum Action {
    Created,
    Updated,
    Deleted,
}

impl Action {
    const fn as_str(self) -> &'static str {
        match self {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Deleted => "deleted",
        }
    }
}

fn alert_headers(def: &EntityDef, action: Action, id: i64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format!("{APP_NAME}.{}.{}", def.name, action.as_str()))
    {
        headers.insert(ALERT_HEADER, value);
    }
    headers.insert(PARAMS_HEADER, HeaderValue::from(id));
    headers
}

fn body_id(body: &Value) -> i64 {
    body.get("id").and_then(Value::as_i64).unwrap_or_default()
}

pub(super) fn created(def: &EntityDef, body: Value) -> Response {
    let id = body_id(&body);
    let mut headers = alert_headers(def, Action::Created, id);
    if let Ok(location) = HeaderValue::from_str(&format!("/api/{}/{id}", def.path)) {
        headers.insert(LOCATION, location);
    }
    (StatusCode::CREATED, headers, Json(body)).into_response()
}

pub(super) fn updated(def: &EntityDef, body: Value) -> Response {
    let id = body_id(&body);
    (StatusCode::OK, alert_headers(def, Action::Updated, id), Json(body)).into_response()
}

pub(super) fn deleted(def: &EntityDef, id: i64) -> Response {
    (StatusCode::NO_CONTENT, alert_headers(def, Action::Deleted, id)).into_response()
}

pub(super) fn page(uri: &Uri, meta: &PageMeta, rows: Vec<Value>) -> Response {
    (StatusCode::OK, pagination_headers(uri, meta), Json(rows)).into_response()
}

/// `X-Total-Count` plus an RFC 5988 `Link` header (`next`, `prev`, `last`, `first`).
///
/// Other query parameters of the request are carried over unchanged.
pub(super) fn pagination_headers(uri: &Uri, meta: &PageMeta) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(X_TOTAL_COUNT, HeaderValue::from(meta.total));

    let kept: Vec<&str> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            !pair.is_empty() && key != "page" && key != "size"
        })
        .collect();
    let link_to = |page: u64| {
        let mut query = kept.join("&");
        if !query.is_empty() {
            query.push('&');
        }
        format!("<{}?{query}page={page}&size={}>", uri.path(), meta.size)
    };

    let last = meta.total_pages().saturating_sub(1);
    let mut links = Vec::with_capacity(4);
    if meta.has_next() {
        links.push(format!("{}; rel=\"next\"", link_to(u64::from(meta.page) + 1)));
    }
    if meta.has_previous() {
        links.push(format!("{}; rel=\"prev\"", link_to(u64::from(meta.page) - 1)));
    }
    links.push(format!("{}; rel=\"last\"", link_to(last)));
    links.push(format!("{}; rel=\"first\"", link_to(0)));

    if let Ok(value) = HeaderValue::from_str(&links.join(",")) {
        headers.insert(LINK, value);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use curation_schema::catalog::GENE;

    fn header<'a>(headers: &'a HeaderMap, name: &axum::http::HeaderName) -> &'a str {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .expect("header present")
    }

    #[test]
    fn link_header_on_a_middle_page() {
        let uri: Uri = "/api/genes?hugoSymbol.contains=BR&page=1&size=2&sort=id,desc"
            .parse()
            .expect("uri");
        let meta = PageMeta {
            page: 1,
            size: 2,
            total: 5,
        };
        let headers = pagination_headers(&uri, &meta);
        assert_eq!(header(&headers, &X_TOTAL_COUNT), "5");
        assert_eq!(
            header(&headers, &LINK),
            "</api/genes?hugoSymbol.contains=BR&sort=id,desc&page=2&size=2>; rel=\"next\",\
             </api/genes?hugoSymbol.contains=BR&sort=id,desc&page=0&size=2>; rel=\"prev\",\
             </api/genes?hugoSymbol.contains=BR&sort=id,desc&page=2&size=2>; rel=\"last\",\
             </api/genes?hugoSymbol.contains=BR&sort=id,desc&page=0&size=2>; rel=\"first\""
        );
    }

    #[test]
    fn link_header_for_an_empty_result() {
        let uri: Uri = "/api/genes".parse().expect("uri");
        let meta = PageMeta {
            page: 0,
            size: 20,
            total: 0,
        };
        let headers = pagination_headers(&uri, &meta);
        assert_eq!(header(&headers, &X_TOTAL_COUNT), "0");
        assert_eq!(
            header(&headers, &LINK),
            "</api/genes?page=0&size=20>; rel=\"last\",</api/genes?page=0&size=20>; rel=\"first\""
        );
    }

    #[test]
    fn created_sets_location_and_alert() {
        let resp = created(&GENE, serde_json::json!({ "id": 12, "hugoSymbol": "BRAF" }));
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(header(resp.headers(), &LOCATION), "/api/genes/12");
        assert_eq!(
            header(resp.headers(), &ALERT_HEADER),
            "oncokbCurationApp.gene.created"
        );
        assert_eq!(header(resp.headers(), &PARAMS_HEADER), "12");
    }
}
