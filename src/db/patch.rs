//! Typed write payloads decoded from JSON bodies.
//!
//! - [`EntityWrite`]: every column and owned relation (create / full update)
//! - [`EntityPatch`]: only what the body carries with a non-null value
//!
//! Both are applied through [`DbPatchable`] inside the caller's transaction.

use async_trait::async_trait;
use curation_schema::{EntityDef, EntityKind, FieldDef, RelationDef, RelationKind, ScalarValue};
use serde_json::{Map, Value};
use sqlx::SqliteConnection;
use tracing::debug;

use super::query::{SqliteQuery, push_bind_optional};
use super::schema::q;
use crate::error::CurationError;

/// New value for an owned relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationWrite {
    /// Many-to-one: the referenced id, or `None` to unlink.
    One(Option<i64>),
    /// Many-to-many: the full set of linked ids.
    Many(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityWrite {
    pub kind: EntityKind,
    pub values: Vec<(&'static FieldDef, Option<ScalarValue>)>,
    pub relations: Vec<(&'static RelationDef, RelationWrite)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityPatch {
    pub kind: EntityKind,
    pub id: i64,
    pub values: Vec<(&'static FieldDef, ScalarValue)>,
    pub relations: Vec<(&'static RelationDef, RelationWrite)>,
}

#[async_trait]
pub trait DbPatchable {
    /// Apply to row `id`; `Ok(false)` when the row does not exist.
    async fn apply_patch(&self, conn: &mut SqliteConnection, id: i64)
    -> Result<bool, CurationError>;
}

fn invalid(def: &EntityDef, field: &str, reason: impl Into<String>) -> CurationError {
    CurationError::InvalidField {
        entity: def.name,
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn decode_scalar(
    def: &EntityDef,
    field: &FieldDef,
    value: &Value,
) -> Result<ScalarValue, CurationError> {
    field
        .kind
        .from_json(value)
        .ok_or_else(|| invalid(def, field.name, format!("expected {}", field.kind.describe())))
}

fn decode_ref(def: &EntityDef, relation: &RelationDef, value: &Value) -> Result<i64, CurationError> {
    value
        .as_object()
        .and_then(|obj| obj.get("id"))
        .and_then(Value::as_i64)
        .ok_or_else(|| invalid(def, relation.name, "expected an object with a numeric id"))
}

fn decode_relation(
    def: &EntityDef,
    relation: &RelationDef,
    value: &Value,
) -> Result<RelationWrite, CurationError> {
    match relation.kind {
        RelationKind::ManyToOne { .. } => match value {
            Value::Null => Ok(RelationWrite::One(None)),
            v => decode_ref(def, relation, v).map(|id| RelationWrite::One(Some(id))),
        },
        RelationKind::ManyToMany(_) => match value {
            Value::Null => Ok(RelationWrite::Many(Vec::new())),
            Value::Array(items) => {
                let mut ids = Vec::with_capacity(items.len());
                let mut seen = ahash::AHashSet::with_capacity(items.len());
                for item in items {
                    let id = decode_ref(def, relation, item)?;
                    if seen.insert(id) {
                        ids.push(id);
                    }
                }
                Ok(RelationWrite::Many(ids))
            }
            _ => Err(invalid(def, relation.name, "expected an array of objects")),
        },
        RelationKind::InverseManyToMany(_) | RelationKind::OneToMany { .. } => {
            Err(CurationError::UnexpectedError(format!(
                "{} is not written through {}",
                relation.name, def.name
            )))
        }
    }
}

impl EntityWrite {
    /// Decode a full representation; absent or null keys clear the column or relation.
    ///
    /// Keys that are not fields or owned relations (including `id`) are ignored.
    pub fn from_json(kind: EntityKind, body: &Map<String, Value>) -> Result<Self, CurationError> {
        let def = kind.def();

        let values = def
            .fields
            .iter()
            .map(|field| match body.get(field.name) {
                None | Some(Value::Null) => Ok((field, None)),
                Some(v) => decode_scalar(def, field, v).map(|s| (field, Some(s))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let relations = def
            .owned_relations()
            .map(|relation| {
                decode_relation(def, relation, body.get(relation.name).unwrap_or(&Value::Null))
                    .map(|w| (relation, w))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            kind,
            values,
            relations,
        })
    }

    /// Fill generated fields (UUIDs) left empty by the client.
    pub fn fill_generated(&mut self) {
        for (field, value) in &mut self.values {
            if field.generated && value.is_none() {
                *value = Some(ScalarValue::Text(uuid::Uuid::new_v4().to_string()));
            }
        }
    }

    pub fn check_required(&self) -> Result<(), CurationError> {
        match self
            .values
            .iter()
            .find(|(field, value)| field.required && value.is_none())
        {
            Some((field, _)) => Err(CurationError::MissingField {
                entity: self.kind.def().name,
                field: field.name,
            }),
            None => Ok(()),
        }
    }

    /// Insert a new row plus its association rows; returns the new id.
    pub async fn insert(&self, conn: &mut SqliteConnection) -> Result<i64, CurationError> {
        let def = self.kind.def();
        let columns = self.assigned_columns();

        let mut qb = SqliteQuery::new(format!("INSERT INTO {} ", q(def.table)));
        if columns.is_empty() {
            qb.push("DEFAULT VALUES");
        } else {
            qb.push("(")
                .push(
                    columns
                        .iter()
                        .map(|(column, _)| q(column))
                        .collect::<Vec<_>>()
                        .join(", "),
                )
                .push(") VALUES (");
            for (i, (_, value)) in columns.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                push_bind_optional(&mut qb, value.as_ref());
            }
            qb.push(")");
        }
        qb.push(format!(" RETURNING {}", q("id")));

        let id = qb.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;
        for (relation, write) in &self.relations {
            if let RelationWrite::Many(ids) = write {
                replace_links(conn, relation, id, ids).await?;
            }
        }

        debug!(entity = def.name, id, "db insert applied");
        Ok(id)
    }

    /// Scalar columns and many-to-one foreign keys, in catalog order.
    fn assigned_columns(&self) -> Vec<(&'static str, Option<ScalarValue>)> {
        let mut columns: Vec<(&'static str, Option<ScalarValue>)> = self
            .values
            .iter()
            .map(|(field, value)| (field.column, value.clone()))
            .collect();
        columns.extend(self.relations.iter().filter_map(|(relation, write)| {
            match (relation.kind, write) {
                (RelationKind::ManyToOne { column }, RelationWrite::One(id)) => {
                    Some((column, id.map(ScalarValue::Integer)))
                }
                _ => None,
            }
        }));
        columns
    }
}

impl EntityPatch {
    /// Decode a merge-patch body; null and absent keys leave the stored value alone.
    pub fn from_json(
        kind: EntityKind,
        id: i64,
        body: &Map<String, Value>,
    ) -> Result<Self, CurationError> {
        let def = kind.def();

        let mut values = Vec::new();
        for field in def.fields {
            match body.get(field.name) {
                None | Some(Value::Null) => {}
                Some(v) => values.push((field, decode_scalar(def, field, v)?)),
            }
        }

        let mut relations = Vec::new();
        for relation in def.owned_relations() {
            match body.get(relation.name) {
                None | Some(Value::Null) => {}
                Some(v) => relations.push((relation, decode_relation(def, relation, v)?)),
            }
        }

        Ok(Self {
            kind,
            id,
            values,
            relations,
        })
    }
}

/// Replace the association rows of `owner` for one many-to-many relation.
async fn replace_links(
    conn: &mut SqliteConnection,
    relation: &RelationDef,
    owner: i64,
    ids: &[i64],
) -> Result<(), CurationError> {
    let RelationKind::ManyToMany(join) = relation.kind else {
        return Ok(());
    };

    let mut qb = SqliteQuery::new(format!(
        "DELETE FROM {} WHERE {} = ",
        q(join.table),
        q(join.self_column)
    ));
    qb.push_bind(owner);
    qb.build().execute(&mut *conn).await?;

    if ids.is_empty() {
        return Ok(());
    }

    let mut qb = SqliteQuery::new(format!(
        "INSERT INTO {} ({}, {}) ",
        q(join.table),
        q(join.self_column),
        q(join.target_column)
    ));
    qb.push_values(ids, |mut row, target| {
        row.push_bind(owner).push_bind(*target);
    });
    qb.build().execute(&mut *conn).await?;
    Ok(())
}

/// `UPDATE ... SET` for the given columns; returns whether the row exists.
async fn update_columns(
    conn: &mut SqliteConnection,
    def: &EntityDef,
    id: i64,
    columns: &[(&'static str, Option<ScalarValue>)],
) -> Result<bool, CurationError> {
    if columns.is_empty() {
        let mut qb = SqliteQuery::new(format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ",
            q(def.table),
            q("id")
        ));
        qb.push_bind(id);
        let n = qb.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;
        return Ok(n > 0);
    }

    let mut qb = SqliteQuery::new(format!("UPDATE {} SET ", q(def.table)));
    for (i, (column, value)) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(q(column)).push(" = ");
        push_bind_optional(&mut qb, value.as_ref());
    }
    qb.push(format!(" WHERE {} = ", q("id"))).push_bind(id);

    let affected = qb.build().execute(&mut *conn).await?.rows_affected();
    Ok(affected > 0)
}

#[async_trait]
impl DbPatchable for EntityWrite {
    async fn apply_patch(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<bool, CurationError> {
        let def = self.kind.def();
        if !update_columns(conn, def, id, &self.assigned_columns()).await? {
            return Ok(false);
        }
        for (relation, write) in &self.relations {
            if let RelationWrite::Many(ids) = write {
                replace_links(conn, relation, id, ids).await?;
            }
        }
        debug!(entity = def.name, id, "db replace applied");
        Ok(true)
    }
}

#[async_trait]
impl DbPatchable for EntityPatch {
    async fn apply_patch(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<bool, CurationError> {
        let def = self.kind.def();

        let mut columns: Vec<(&'static str, Option<ScalarValue>)> = self
            .values
            .iter()
            .map(|(field, value)| (field.column, Some(value.clone())))
            .collect();
        for (relation, write) in &self.relations {
            if let (RelationKind::ManyToOne { column }, RelationWrite::One(target)) =
                (relation.kind, write)
            {
                columns.push((column, target.map(ScalarValue::Integer)));
            }
        }

        if !update_columns(conn, def, id, &columns).await? {
            return Ok(false);
        }
        for (relation, write) in &self.relations {
            if let RelationWrite::Many(ids) = write {
                replace_links(conn, relation, id, ids).await?;
            }
        }

        debug!(
            entity = def.name,
            id,
            fields_set = self.values.len(),
            relations_set = self.relations.len(),
            "db patch applied"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn write_decodes_fields_and_relations() {
        let body = obj(json!({
            "id": 99,
            "name": "Dabrafenib",
            "nciThesaurus": { "id": 4 },
            "flags": [{ "id": 1 }, { "id": 2 }, { "id": 1 }],
            "unknown": true
        }));
        let write = EntityWrite::from_json(EntityKind::Drug, &body).expect("decode");

        assert_eq!(write.values.len(), 2);
        assert_eq!(write.values[0].1, None);
        assert_eq!(
            write.values[1].1,
            Some(ScalarValue::Text("Dabrafenib".to_string()))
        );
        assert_eq!(write.relations[0].1, RelationWrite::One(Some(4)));
        assert_eq!(write.relations[1].1, RelationWrite::Many(vec![1, 2]));
    }

    #[test]
    fn generated_uuid_satisfies_required() {
        let body = obj(json!({ "name": "Trametinib" }));
        let mut write = EntityWrite::from_json(EntityKind::Drug, &body).expect("decode");
        assert!(matches!(
            write.check_required(),
            Err(CurationError::MissingField { field: "uuid", .. })
        ));
        write.fill_generated();
        assert!(write.check_required().is_ok());
        let Some(ScalarValue::Text(uuid)) = &write.values[0].1 else {
            panic!("uuid should be generated");
        };
        assert_eq!(uuid.len(), 36);
    }

    #[test]
    fn wrong_json_types_are_rejected() {
        let body = obj(json!({ "name": 12 }));
        assert!(matches!(
            EntityWrite::from_json(EntityKind::Drug, &body),
            Err(CurationError::InvalidField { .. })
        ));

        let body = obj(json!({ "flags": { "id": 1 } }));
        assert!(EntityWrite::from_json(EntityKind::Drug, &body).is_err());

        let body = obj(json!({ "nciThesaurus": 5 }));
        assert!(EntityWrite::from_json(EntityKind::Drug, &body).is_err());
    }

    #[test]
    fn patch_skips_null_and_absent_keys() {
        let body = obj(json!({ "name": null, "flags": [{ "id": 3 }] }));
        let patch = EntityPatch::from_json(EntityKind::Drug, 7, &body).expect("decode");
        assert!(patch.values.is_empty());
        assert_eq!(patch.relations.len(), 1);
        assert_eq!(patch.relations[0].1, RelationWrite::Many(vec![3]));
    }

    #[test]
    fn patch_ignores_inverse_relations() {
        let body = obj(json!({ "treatment": [{ "id": 1 }] }));
        let patch = EntityPatch::from_json(EntityKind::Drug, 1, &body).expect("decode");
        assert!(patch.relations.is_empty());
    }
}
