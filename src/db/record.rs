//! Row decoding and JSON rendering.
//!
//! Owned relations render as `{"id": n}` stubs (many-to-one) or arrays of
//! stubs (many-to-many). With `eager` the related rows are loaded in full,
//! one statement per relation for the whole batch of rows.

use ahash::{AHashMap, AHashSet};
use chrono::{NaiveDateTime, Utc};
use curation_schema::{
    EntityDef, FieldDef, FieldKind, JoinTable, RelationDef, RelationKind, ScalarValue,
    field::INSTANT_STORAGE_FORMAT,
};
use serde_json::{Map, Value, json};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use super::query::{SqliteQuery, select_by_ids};
use super::schema::q;

const OWNER_COLUMN: &str = "__owner_id";

/// One decoded row of an entity table.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow {
    pub id: i64,
    pub values: Vec<(&'static FieldDef, Option<ScalarValue>)>,
    /// Many-to-one foreign keys held on the row.
    pub refs: Vec<(&'static RelationDef, Option<i64>)>,
}

/// Column list selected for `def`, qualified with `alias`.
pub(crate) fn select_columns(def: &EntityDef, alias: &str) -> String {
    let mut columns = vec![format!("{alias}.{}", q("id"))];
    columns.extend(
        def.fields
            .iter()
            .map(|f| format!("{alias}.{}", q(f.column))),
    );
    columns.extend(def.relations.iter().filter_map(|r| match r.kind {
        RelationKind::ManyToOne { column } => Some(format!("{alias}.{}", q(column))),
        _ => None,
    }));
    columns.join(", ")
}

impl EntityRow {
    pub fn decode(def: &EntityDef, row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;

        let values = def
            .fields
            .iter()
            .map(|field| decode_field(field, row).map(|v| (field, v)))
            .collect::<Result<Vec<_>, _>>()?;

        let refs = def
            .relations
            .iter()
            .filter_map(|relation| match relation.kind {
                RelationKind::ManyToOne { column } => Some(
                    row.try_get::<Option<i64>, _>(column)
                        .map(|id| (relation, id)),
                ),
                _ => None,
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { id, values, refs })
    }

    /// Scalars plus many-to-one references rendered as `{"id": n}` stubs.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut obj = Map::new();
        obj.insert("id".to_string(), Value::from(self.id));
        for (field, value) in &self.values {
            obj.insert(
                field.name.to_string(),
                value.as_ref().map(ScalarValue::to_json).unwrap_or(Value::Null),
            );
        }
        for (relation, id) in &self.refs {
            obj.insert(relation.name.to_string(), id_stub(*id));
        }
        obj
    }
}

pub(crate) fn id_stub(id: Option<i64>) -> Value {
    match id {
        Some(id) => json!({ "id": id }),
        None => Value::Null,
    }
}

fn decode_field(field: &FieldDef, row: &SqliteRow) -> Result<Option<ScalarValue>, sqlx::Error> {
    let column = field.column;
    let value = match field.kind {
        FieldKind::Text | FieldKind::Enum(_) => row
            .try_get::<Option<String>, _>(column)?
            .map(ScalarValue::Text),
        FieldKind::Integer | FieldKind::Long => row
            .try_get::<Option<i64>, _>(column)?
            .map(ScalarValue::Integer),
        FieldKind::Boolean => row
            .try_get::<Option<bool>, _>(column)?
            .map(ScalarValue::Boolean),
        FieldKind::Instant => match row.try_get::<Option<String>, _>(column)? {
            Some(raw) => {
                let parsed = NaiveDateTime::parse_from_str(&raw, INSTANT_STORAGE_FORMAT)
                    .map_err(|e| sqlx::Error::ColumnDecode {
                        index: column.to_string(),
                        source: Box::new(e),
                    })?;
                Some(ScalarValue::Instant(parsed.and_utc()))
            }
            None => None,
        },
    };
    Ok(value)
}

/// Render `rows` of `def` with their owned relations attached.
pub(crate) async fn render_rows(
    pool: &SqlitePool,
    def: &EntityDef,
    rows: &[EntityRow],
    eager: bool,
) -> Result<Vec<Value>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let owners: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut objects: Vec<Map<String, Value>> = rows.iter().map(EntityRow::to_json).collect();

    for relation in def.owned_relations() {
        match relation.kind {
            RelationKind::ManyToOne { .. } if eager => {
                let targets: AHashSet<i64> = rows
                    .iter()
                    .flat_map(|row| row.refs.iter())
                    .filter(|(r, _)| r.name == relation.name)
                    .filter_map(|(_, id)| *id)
                    .collect();
                let loaded = load_by_ids(pool, relation.target.def(), targets).await?;
                for obj in &mut objects {
                    let linked = obj
                        .get(relation.name)
                        .and_then(|v| v.get("id"))
                        .and_then(Value::as_i64)
                        .and_then(|id| loaded.get(&id));
                    if let Some(full) = linked.cloned() {
                        obj.insert(relation.name.to_string(), full);
                    }
                }
            }
            RelationKind::ManyToMany(join) => {
                let mut grouped = load_links(pool, relation, join, &owners, eager).await?;
                for (obj, owner) in objects.iter_mut().zip(&owners) {
                    let linked = grouped.remove(owner).unwrap_or_default();
                    obj.insert(relation.name.to_string(), Value::Array(linked));
                }
            }
            _ => {}
        }
    }

    Ok(objects.into_iter().map(Value::Object).collect())
}

async fn load_by_ids(
    pool: &SqlitePool,
    def: &EntityDef,
    ids: AHashSet<i64>,
) -> Result<AHashMap<i64, Value>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(AHashMap::new());
    }
    let ids: Vec<i64> = ids.into_iter().collect();
    let mut qb = select_by_ids(def, &ids);
    let rows = qb.build().fetch_all(pool).await?;

    let mut loaded = AHashMap::with_capacity(rows.len());
    for row in &rows {
        let decoded = EntityRow::decode(def, row)?;
        loaded.insert(decoded.id, Value::Object(decoded.to_json()));
    }
    Ok(loaded)
}

/// Linked targets of each owner, in target id order.
async fn load_links(
    pool: &SqlitePool,
    relation: &RelationDef,
    join: JoinTable,
    owners: &[i64],
    eager: bool,
) -> Result<AHashMap<i64, Vec<Value>>, sqlx::Error> {
    let target = relation.target.def();
    let mut qb = if eager {
        SqliteQuery::new(format!(
            "SELECT j.{own} AS {owner}, {cols} FROM {join} AS j JOIN {target} AS t ON t.{id} = j.{tgt} WHERE j.{own} IN (",
            own = q(join.self_column),
            owner = q(OWNER_COLUMN),
            cols = select_columns(target, "t"),
            join = q(join.table),
            target = q(target.table),
            id = q("id"),
            tgt = q(join.target_column),
        ))
    } else {
        SqliteQuery::new(format!(
            "SELECT j.{own} AS {owner}, j.{tgt} AS {id} FROM {join} AS j WHERE j.{own} IN (",
            own = q(join.self_column),
            owner = q(OWNER_COLUMN),
            tgt = q(join.target_column),
            id = q("id"),
            join = q(join.table),
        ))
    };
    let mut sep = qb.separated(", ");
    for owner in owners {
        sep.push_bind(*owner);
    }
    qb.push(format!(") ORDER BY {}", q("id")));

    let rows = qb.build().fetch_all(pool).await?;
    let mut grouped: AHashMap<i64, Vec<Value>> = AHashMap::new();
    for row in &rows {
        let owner: i64 = row.try_get(OWNER_COLUMN)?;
        let value = if eager {
            Value::Object(EntityRow::decode(target, row)?.to_json())
        } else {
            id_stub(Some(row.try_get("id")?))
        };
        grouped.entry(owner).or_default().push(value);
    }
    Ok(grouped)
}

/// Bound value for an instant column.
pub(crate) fn instant_storage(value: &chrono::DateTime<Utc>) -> String {
    value.format(INSTANT_STORAGE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use curation_schema::catalog::{DRUG, FLAG};

    #[test]
    fn instant_storage_round_trips_through_the_fixed_format() {
        let t = Utc
            .with_ymd_and_hms(2024, 2, 29, 23, 59, 1)
            .single()
            .expect("valid date");
        let stored = instant_storage(&t);
        assert_eq!(stored, "2024-02-29T23:59:01.000000Z");
        let back = NaiveDateTime::parse_from_str(&stored, INSTANT_STORAGE_FORMAT)
            .expect("parse")
            .and_utc();
        assert_eq!(back, t);
    }

    #[test]
    fn select_columns_lists_foreign_keys_after_fields() {
        let cols = select_columns(&DRUG, "t");
        assert_eq!(cols, "t.\"id\", t.\"uuid\", t.\"name\", t.\"nci_thesaurus_id\"");
        assert!(!select_columns(&FLAG, "t").contains("_id\""));
    }

    #[test]
    fn to_json_renders_null_references() {
        let row = EntityRow {
            id: 3,
            values: vec![(&DRUG.fields[1], Some(ScalarValue::Text("Dabrafenib".into())))],
            refs: vec![(&DRUG.relations[0], None)],
        };
        let obj = row.to_json();
        assert_eq!(obj["id"], json!(3));
        assert_eq!(obj["name"], json!("Dabrafenib"));
        assert_eq!(obj["nciThesaurus"], Value::Null);

        let linked = EntityRow {
            refs: vec![(&DRUG.relations[0], Some(9))],
            ..row
        };
        assert_eq!(linked.to_json()["nciThesaurus"], json!({ "id": 9 }));
    }
}
