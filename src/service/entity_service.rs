use crate::db::{DbActorHandle, EntityPatch, EntityWrite};
use crate::error::{CurationError, IdRule};
use crate::utils::logging::with_pretty_json_debug;
use curation_schema::{Criteria, EntityDef, EntityKind, PageMeta, PageRequest};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Resource rules shared by every entity: id checks, validation, paging.
#[derive(Clone)]
pub struct EntityService {
    db: DbActorHandle,
}

fn into_object(def: &EntityDef, body: Value) -> Result<Map<String, Value>, CurationError> {
    with_pretty_json_debug(&body, |pretty_body| {
        debug!(entity = def.name, body = %pretty_body, "entity payload");
    });
    match body {
        Value::Object(obj) => Ok(obj),
        other => Err(CurationError::InvalidBody(format!(
            "expected a JSON object for {}, got {}",
            def.name,
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The body id of an update must be present and equal to the path id.
fn check_body_id(
    def: &EntityDef,
    path_id: i64,
    body: &Map<String, Value>,
) -> Result<(), CurationError> {
    let rule = match body.get("id") {
        None | Some(Value::Null) => Some(IdRule::Null),
        Some(v) if v.as_i64() != Some(path_id) => Some(IdRule::Invalid),
        Some(_) => None,
    };
    match rule {
        Some(rule) => Err(CurationError::BadId {
            entity: def.name,
            rule,
        }),
        None => Ok(()),
    }
}

impl EntityService {
    pub fn new(db: DbActorHandle) -> Self {
        Self { db }
    }

    pub async fn create(&self, kind: EntityKind, body: Value) -> Result<Value, CurationError> {
        let def = kind.def();
        let body = into_object(def, body)?;
        if body.get("id").is_some_and(|v| !v.is_null()) {
            return Err(CurationError::BadId {
                entity: def.name,
                rule: IdRule::Exists,
            });
        }

        let mut write = EntityWrite::from_json(kind, &body)?;
        write.fill_generated();
        write.check_required()?;

        let id = self.db.insert(write).await?;
        info!(entity = def.name, id, "entity created");
        self.reload(kind, id).await
    }

    pub async fn update(
        &self,
        kind: EntityKind,
        id: i64,
        body: Value,
    ) -> Result<Value, CurationError> {
        let def = kind.def();
        let body = into_object(def, body)?;
        check_body_id(def, id, &body)?;
        self.ensure_exists(def, id).await?;

        let write = EntityWrite::from_json(kind, &body)?;
        write.check_required()?;

        if !self.db.replace(id, write).await? {
            return Err(CurationError::NotFound {
                entity: def.name,
                id,
            });
        }
        info!(entity = def.name, id, "entity updated");
        self.reload(kind, id).await
    }

    pub async fn partial_update(
        &self,
        kind: EntityKind,
        id: i64,
        body: Value,
    ) -> Result<Value, CurationError> {
        let def = kind.def();
        let body = into_object(def, body)?;
        check_body_id(def, id, &body)?;
        self.ensure_exists(def, id).await?;

        let patch = EntityPatch::from_json(kind, id, &body)?;
        if !self.db.patch(patch).await? {
            return Err(CurationError::NotFound {
                entity: def.name,
                id,
            });
        }
        info!(entity = def.name, id, "entity partially updated");
        self.reload(kind, id).await
    }

    pub async fn find_one(&self, kind: EntityKind, id: i64) -> Result<Value, CurationError> {
        self.db
            .find_one(kind, id)
            .await?
            .ok_or(CurationError::NotFound {
                entity: kind.def().name,
                id,
            })
    }

    pub async fn find_page(
        &self,
        kind: EntityKind,
        criteria: Criteria,
        page: PageRequest,
        eager: bool,
    ) -> Result<(Vec<Value>, PageMeta), CurationError> {
        let (page_no, size) = (page.page, page.size);
        let (rows, total) = self.db.find_page(kind, criteria, page, eager).await?;
        Ok((
            rows,
            PageMeta {
                page: page_no,
                size,
                total,
            },
        ))
    }

    pub async fn count(&self, kind: EntityKind, criteria: Criteria) -> Result<u64, CurationError> {
        self.db.count(kind, criteria).await
    }

    /// Deleting a missing row is not an error.
    pub async fn delete(&self, kind: EntityKind, id: i64) -> Result<(), CurationError> {
        let deleted = self.db.delete(kind, id).await?;
        info!(entity = kind.def().name, id, deleted, "entity delete requested");
        Ok(())
    }

    pub async fn search(
        &self,
        kind: EntityKind,
        query: &str,
        page: PageRequest,
    ) -> Result<(Vec<Value>, PageMeta), CurationError> {
        let def = kind.def();
        let needle = query.trim();
        if needle.is_empty() {
            return Err(CurationError::InvalidQuery(
                "`query` must not be empty".to_string(),
            ));
        }

        let (page_no, size) = (page.page, page.size);
        let Some((rows, total)) = self.db.search(kind, needle.to_string(), page).await? else {
            return Err(CurationError::InvalidQuery(format!(
                "{} does not support search",
                def.name
            )));
        };
        debug!(entity = def.name, needle, total, "search executed");
        Ok((
            rows,
            PageMeta {
                page: page_no,
                size,
                total,
            },
        ))
    }

    pub async fn health(&self) -> Result<(), CurationError> {
        self.db.ping().await
    }

    async fn ensure_exists(&self, def: &EntityDef, id: i64) -> Result<(), CurationError> {
        if self.db.exists(def.kind, id).await? {
            Ok(())
        } else {
            Err(CurationError::BadId {
                entity: def.name,
                rule: IdRule::NotFound,
            })
        }
    }

    async fn reload(&self, kind: EntityKind, id: i64) -> Result<Value, CurationError> {
        self.db.find_one(kind, id).await?.ok_or_else(|| {
            CurationError::UnexpectedError(format!(
                "{} {id} vanished right after being written",
                kind.def().name
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curation_schema::catalog::GENE;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn body_id_rules() {
        assert!(matches!(
            check_body_id(&GENE, 1, &obj(json!({ "hugoSymbol": "BRAF" }))),
            Err(CurationError::BadId {
                rule: IdRule::Null,
                ..
            })
        ));
        assert!(matches!(
            check_body_id(&GENE, 1, &obj(json!({ "id": null }))),
            Err(CurationError::BadId {
                rule: IdRule::Null,
                ..
            })
        ));
        assert!(matches!(
            check_body_id(&GENE, 1, &obj(json!({ "id": 2 }))),
            Err(CurationError::BadId {
                rule: IdRule::Invalid,
                ..
            })
        ));
        assert!(matches!(
            check_body_id(&GENE, 1, &obj(json!({ "id": "1" }))),
            Err(CurationError::BadId {
                rule: IdRule::Invalid,
                ..
            })
        ));
        assert!(check_body_id(&GENE, 1, &obj(json!({ "id": 1 }))).is_ok());
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert!(matches!(
            into_object(&GENE, json!([1, 2])),
            Err(CurationError::InvalidBody(_))
        ));
        assert!(into_object(&GENE, json!({})).is_ok());
    }
}
