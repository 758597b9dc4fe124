use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
};
use curation_schema::CriteriaError;
use serde::Serialize;
use serde_json::{Value, json};
use sqlx::error::ErrorKind;
use thiserror::Error as ThisError;
use tracing::{debug, error};

pub const ALERT_HEADER: HeaderName = HeaderName::from_static("x-oncokbcurationapp-alert");
pub const ERROR_HEADER: HeaderName = HeaderName::from_static("x-oncokbcurationapp-error");
pub const PARAMS_HEADER: HeaderName = HeaderName::from_static("x-oncokbcurationapp-params");

/// Id rules checked before a write reaches the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdRule {
    /// Create payload already carries an id.
    Exists,
    /// Update payload without an id.
    Null,
    /// Payload id differs from the path id.
    Invalid,
    /// No row with the path id.
    NotFound,
}

impl IdRule {
    pub const fn key(self) -> &'static str {
        match self {
            IdRule::Exists => "idexists",
            IdRule::Null => "idnull",
            IdRule::Invalid => "idinvalid",
            IdRule::NotFound => "idnotfound",
        }
    }

    const fn code(self) -> &'static str {
        match self {
            IdRule::Exists => "ID_EXISTS",
            IdRule::Null => "ID_NULL",
            IdRule::Invalid => "ID_INVALID",
            IdRule::NotFound => "ID_NOT_FOUND",
        }
    }

    const fn message(self) -> &'static str {
        match self {
            IdRule::Exists => "A new entity cannot already have an ID",
            IdRule::Null => "Invalid id",
            IdRule::Invalid => "Invalid ID",
            IdRule::NotFound => "Entity not found",
        }
    }
}

#[derive(Debug, ThisError)]
pub enum CurationError {
    #[error("{entity}: {}", .rule.message())]
    BadId { entity: &'static str, rule: IdRule },

    #[error("Missing required field `{field}` on {entity}")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("Invalid value for `{field}` on {entity}: {reason}")]
    InvalidField {
        entity: &'static str,
        field: String,
        reason: String,
    },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Criteria(#[from] CriteriaError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Unknown resource `{0}`")]
    UnknownResource(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for CurationError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            match db.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    return CurationError::Constraint(db.message().to_string());
                }
                _ => {}
            }
        }
        CurationError::DatabaseError(err)
    }
}

impl From<JsonRejection> for CurationError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::BytesRejection(e) => {
                CurationError::UnexpectedError(format!("Failed to read request body: {e}"))
            }
            other => CurationError::InvalidBody(other.body_text()),
        }
    }
}

impl From<QueryRejection> for CurationError {
    fn from(rejection: QueryRejection) -> Self {
        CurationError::InvalidQuery(rejection.body_text())
    }
}

impl CurationError {
    fn entity(&self) -> Option<&'static str> {
        match self {
            CurationError::BadId { entity, .. }
            | CurationError::MissingField { entity, .. }
            | CurationError::InvalidField { entity, .. }
            | CurationError::NotFound { entity, .. } => Some(*entity),
            _ => None,
        }
    }

    /// Message key surfaced in the error alert header.
    fn error_key(&self) -> &'static str {
        match self {
            CurationError::BadId { rule, .. } => rule.key(),
            CurationError::MissingField { .. } | CurationError::InvalidField { .. } => {
                "validation"
            }
            CurationError::InvalidBody(_) | CurationError::InvalidPath(_) => "http.400",
            CurationError::InvalidQuery(_) | CurationError::Criteria(_) => "criteria",
            CurationError::NotFound { .. } | CurationError::UnknownResource(_) => "http.404",
            CurationError::Constraint(_) => "constraint",
            CurationError::UnexpectedError(_)
            | CurationError::RactorError(_)
            | CurationError::DatabaseError(_) => "http.500",
        }
    }
}

impl IntoResponse for CurationError {
    fn into_response(self) -> axum::response::Response {
        let entity = self.entity();
        let error_key = self.error_key();

        let (status, error_body) = match &self {
            CurationError::DatabaseError(_)
            | CurationError::RactorError(_)
            | CurationError::UnexpectedError(_) => {
                error!(error = %self, "request failed");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = ApiErrorObject {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                    details: None,
                };
                (status, body)
            }

            CurationError::BadId { rule, .. } => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: rule.code().to_string(),
                    message: self.to_string(),
                    details: None,
                },
            ),

            CurationError::MissingField { field, .. } => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "MISSING_FIELD".to_string(),
                    message: self.to_string(),
                    details: Some(json!({ "field": field })),
                },
            ),

            CurationError::InvalidField { field, .. } => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "INVALID_FIELD".to_string(),
                    message: self.to_string(),
                    details: Some(json!({ "field": field })),
                },
            ),

            CurationError::InvalidBody(_) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "INVALID_BODY".to_string(),
                    message: self.to_string(),
                    details: None,
                },
            ),

            CurationError::InvalidPath(_) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "INVALID_PATH".to_string(),
                    message: self.to_string(),
                    details: None,
                },
            ),

            CurationError::InvalidQuery(_) | CurationError::Criteria(_) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "INVALID_CRITERIA".to_string(),
                    message: self.to_string(),
                    details: None,
                },
            ),

            CurationError::Constraint(_) => {
                debug!(error = %self, "write rejected by constraint");
                (
                    StatusCode::BAD_REQUEST,
                    ApiErrorObject {
                        code: "CONSTRAINT_VIOLATION".to_string(),
                        message: self.to_string(),
                        details: None,
                    },
                )
            }

            CurationError::NotFound { id, .. } => (
                StatusCode::NOT_FOUND,
                ApiErrorObject {
                    code: "NOT_FOUND".to_string(),
                    message: self.to_string(),
                    details: Some(json!({ "id": id })),
                },
            ),

            CurationError::UnknownResource(_) => (
                StatusCode::NOT_FOUND,
                ApiErrorObject {
                    code: "NOT_FOUND".to_string(),
                    message: self.to_string(),
                    details: None,
                },
            ),
        };

        let mut resp = (status, Json(ApiErrorBody { inner: error_body })).into_response();
        let headers = resp.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&format!("error.{error_key}")) {
            headers.insert(ERROR_HEADER, value);
        }
        if let Some(value) = entity.and_then(|e| HeaderValue::from_str(e).ok()) {
            headers.insert(PARAMS_HEADER, value);
        }
        resp
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_rules_render_bad_request_with_alert_headers() {
        let resp = CurationError::BadId {
            entity: "gene",
            rule: IdRule::Null,
        }
        .into_response();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get(ERROR_HEADER).and_then(|v| v.to_str().ok()),
            Some("error.idnull")
        );
        assert_eq!(
            resp.headers().get(PARAMS_HEADER).and_then(|v| v.to_str().ok()),
            Some("gene")
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let resp = CurationError::RactorError("mailbox closed".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.headers().get(PARAMS_HEADER).is_none());
    }

    #[test]
    fn criteria_errors_are_client_errors() {
        let err: CurationError = CriteriaError::UnknownSortField("nope".to_string()).into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_rows_are_not_found() {
        let resp = CurationError::NotFound {
            entity: "drug",
            id: 7,
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
