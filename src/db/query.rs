//! Criteria, paging and search rendered into SQLite statements.
//!
//! Every statement selects from the entity table aliased as `t`. Relation
//! conditions become `t."id" IN (subquery)` against the association table or
//! the child table, so a row never appears twice regardless of `distinct`.

use curation_schema::{
    Condition, Criteria, EntityDef, PageRequest, Predicate, RelationKind, ScalarValue, SortKey,
    Target,
};
use sqlx::{QueryBuilder, Sqlite};

use super::record::{instant_storage, select_columns};
use super::schema::q;

pub(crate) type SqliteQuery = QueryBuilder<'static, Sqlite>;

pub(crate) fn push_bind_scalar(qb: &mut SqliteQuery, value: &ScalarValue) {
    match value {
        ScalarValue::Text(s) => qb.push_bind(s.clone()),
        ScalarValue::Integer(n) => qb.push_bind(*n),
        ScalarValue::Boolean(b) => qb.push_bind(*b),
        ScalarValue::Instant(t) => qb.push_bind(instant_storage(t)),
    };
}

pub(crate) fn push_bind_optional(qb: &mut SqliteQuery, value: Option<&ScalarValue>) {
    match value {
        Some(v) => push_bind_scalar(qb, v),
        None => {
            qb.push_bind(Option::<String>::None);
        }
    }
}

fn push_list(qb: &mut SqliteQuery, values: &[ScalarValue]) {
    qb.push("(");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_bind_scalar(qb, value);
    }
    qb.push(")");
}

fn push_contains(qb: &mut SqliteQuery, column: &str, needle: &str) {
    qb.push("instr(lower(")
        .push(column)
        .push("), lower(")
        .push_bind(needle.to_string())
        .push(")) > 0");
}

/// `column <op> value` for a plain (nullable) column expression.
fn push_predicate(qb: &mut SqliteQuery, column: &str, predicate: &Predicate) {
    match predicate {
        Predicate::Equals(v) => {
            qb.push(column).push(" = ");
            push_bind_scalar(qb, v);
        }
        Predicate::NotEquals(v) => {
            qb.push(column).push(" <> ");
            push_bind_scalar(qb, v);
        }
        Predicate::In(vs) => {
            qb.push(column).push(" IN ");
            push_list(qb, vs);
        }
        Predicate::NotIn(vs) => {
            qb.push(column).push(" NOT IN ");
            push_list(qb, vs);
        }
        Predicate::Specified(true) => {
            qb.push(column).push(" IS NOT NULL");
        }
        Predicate::Specified(false) => {
            qb.push(column).push(" IS NULL");
        }
        Predicate::Contains(s) => push_contains(qb, column, s),
        Predicate::DoesNotContain(s) => {
            qb.push("NOT (");
            push_contains(qb, column, s);
            qb.push(")");
        }
        Predicate::GreaterThan(v) => {
            qb.push(column).push(" > ");
            push_bind_scalar(qb, v);
        }
        Predicate::GreaterThanOrEqual(v) => {
            qb.push(column).push(" >= ");
            push_bind_scalar(qb, v);
        }
        Predicate::LessThan(v) => {
            qb.push(column).push(" < ");
            push_bind_scalar(qb, v);
        }
        Predicate::LessThanOrEqual(v) => {
            qb.push(column).push(" <= ");
            push_bind_scalar(qb, v);
        }
    }
}

fn push_condition(qb: &mut SqliteQuery, condition: &Condition) {
    let predicate = &condition.predicate;
    match condition.target {
        Target::Id => push_predicate(qb, &format!("t.{}", q("id")), predicate),
        Target::Field(field) => push_predicate(qb, &format!("t.{}", q(field.column)), predicate),
        Target::Relation(relation) => match relation.kind {
            RelationKind::ManyToOne { column } => {
                push_predicate(qb, &format!("t.{}", q(column)), predicate)
            }
            RelationKind::ManyToMany(join) | RelationKind::InverseManyToMany(join) => {
                qb.push(format!("t.{}", q("id")));
                match predicate {
                    Predicate::Specified(specified) => {
                        qb.push(if *specified { " IN " } else { " NOT IN " });
                        qb.push(format!(
                            "(SELECT {} FROM {})",
                            q(join.self_column),
                            q(join.table)
                        ));
                    }
                    _ => {
                        qb.push(format!(
                            " IN (SELECT j.{} FROM {} AS j WHERE ",
                            q(join.self_column),
                            q(join.table)
                        ));
                        push_predicate(qb, &format!("j.{}", q(join.target_column)), predicate);
                        qb.push(")");
                    }
                }
            }
            RelationKind::OneToMany { column } => {
                let child = relation.target.def().table;
                qb.push(format!("t.{}", q("id")));
                match predicate {
                    Predicate::Specified(specified) => {
                        qb.push(if *specified { " IN " } else { " NOT IN " });
                        qb.push(format!(
                            "(SELECT {col} FROM {child} WHERE {col} IS NOT NULL)",
                            col = q(column),
                            child = q(child)
                        ));
                    }
                    _ => {
                        qb.push(format!(
                            " IN (SELECT c.{col} FROM {child} AS c WHERE c.{col} IS NOT NULL AND ",
                            col = q(column),
                            child = q(child)
                        ));
                        push_predicate(qb, &format!("c.{}", q("id")), predicate);
                        qb.push(")");
                    }
                }
            }
        },
    }
}

/// Append ` WHERE a AND b ...`; nothing when there are no conditions.
pub(crate) fn push_where(qb: &mut SqliteQuery, criteria: &Criteria) {
    for (i, condition) in criteria.conditions.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        push_condition(qb, condition);
    }
}

fn push_order_and_limit(qb: &mut SqliteQuery, page: &PageRequest) {
    let mut terms: Vec<String> = page
        .sort
        .iter()
        .map(|order| {
            format!(
                "t.{} {}",
                q(order.key.column()),
                if order.descending { "DESC" } else { "ASC" }
            )
        })
        .collect();
    // Paging needs a total order.
    if !page.sort.iter().any(|o| o.key == SortKey::Id) {
        terms.push(format!("t.{} ASC", q("id")));
    }
    qb.push(" ORDER BY ")
        .push(terms.join(", "))
        .push(" LIMIT ")
        .push_bind(i64::from(page.size))
        .push(" OFFSET ")
        .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
}

pub(crate) fn select_page(def: &EntityDef, criteria: &Criteria, page: &PageRequest) -> SqliteQuery {
    let mut qb = SqliteQuery::new(if criteria.distinct {
        "SELECT DISTINCT "
    } else {
        "SELECT "
    });
    qb.push(select_columns(def, "t"))
        .push(format!(" FROM {} AS t", q(def.table)));
    push_where(&mut qb, criteria);
    push_order_and_limit(&mut qb, page);
    qb
}

pub(crate) fn count(def: &EntityDef, criteria: &Criteria) -> SqliteQuery {
    let mut qb = SqliteQuery::new(format!(
        "SELECT COUNT({}t.{}) FROM {} AS t",
        if criteria.distinct { "DISTINCT " } else { "" },
        q("id"),
        q(def.table)
    ));
    push_where(&mut qb, criteria);
    qb
}

pub(crate) fn select_by_id(def: &EntityDef, id: i64) -> SqliteQuery {
    let mut qb = SqliteQuery::new(format!(
        "SELECT {} FROM {} AS t WHERE t.{} = ",
        select_columns(def, "t"),
        q(def.table),
        q("id")
    ));
    qb.push_bind(id);
    qb
}

pub(crate) fn select_by_ids(def: &EntityDef, ids: &[i64]) -> SqliteQuery {
    let mut qb = SqliteQuery::new(format!(
        "SELECT {} FROM {} AS t WHERE t.{} IN (",
        select_columns(def, "t"),
        q(def.table),
        q("id")
    ));
    let mut sep = qb.separated(", ");
    for id in ids {
        sep.push_bind(*id);
    }
    qb.push(format!(") ORDER BY t.{}", q("id")));
    qb
}

fn search_columns(def: &EntityDef) -> Vec<String> {
    def.search_columns()
        .map(|f| format!("t.{}", q(f.column)))
        .collect()
}

fn push_search_where(qb: &mut SqliteQuery, columns: &[String], needle: &str) {
    qb.push(" WHERE (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        push_contains(qb, column, needle);
    }
    qb.push(")");
}

/// Rows whose search columns contain `needle` (case-insensitive), ranked on
/// the first search column: exact match, then earliest match position, then
/// alphabetically, then id.
///
/// Returns `None` when the entity declares no search columns.
pub(crate) fn select_search(def: &EntityDef, needle: &str, page: &PageRequest) -> Option<SqliteQuery> {
    let columns = search_columns(def);
    let primary = columns.first()?.clone();

    let mut qb = SqliteQuery::new("SELECT ");
    qb.push(select_columns(def, "t"))
        .push(format!(" FROM {} AS t", q(def.table)));
    push_search_where(&mut qb, &columns, needle);

    qb.push(format!(" ORDER BY CASE WHEN lower({primary}) = lower("))
        .push_bind(needle.to_string())
        .push(format!(
            ") THEN 0 ELSE 1 END, CASE WHEN instr(lower({primary}), lower("
        ))
        .push_bind(needle.to_string())
        .push(format!(")) > 0 THEN instr(lower({primary}), lower("))
        .push_bind(needle.to_string())
        .push(format!(
            ")) ELSE {} END, {primary} IS NULL, lower({primary}), t.{} ASC",
            i64::MAX,
            q("id")
        ))
        .push(" LIMIT ")
        .push_bind(i64::from(page.size))
        .push(" OFFSET ")
        .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
    Some(qb)
}

pub(crate) fn count_search(def: &EntityDef, needle: &str) -> Option<SqliteQuery> {
    let columns = search_columns(def);
    if columns.is_empty() {
        return None;
    }
    let mut qb = SqliteQuery::new(format!(
        "SELECT COUNT(t.{}) FROM {} AS t",
        q("id"),
        q(def.table)
    ));
    push_search_where(&mut qb, &columns, needle);
    Some(qb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curation_schema::PageDefaults;
    use curation_schema::catalog::{CANCER_TYPE, DRUG, GENOME_FRAGMENT, HISTORY};

    fn criteria(def: &EntityDef, pairs: &[(&str, &str)]) -> Criteria {
        Criteria::parse(def, pairs.iter().copied()).expect("criteria")
    }

    fn page(def: &EntityDef, pairs: &[(&str, &str)]) -> PageRequest {
        PageRequest::parse(def, pairs.iter().copied(), PageDefaults::default()).expect("page")
    }

    #[test]
    fn scalar_conditions_are_joined_with_and() {
        let c = criteria(
            &HISTORY,
            &[("type.contains", "AAA"), ("entityId.notIn", "1,2")],
        );
        let sql = count(&HISTORY, &c).into_sql();
        assert_eq!(
            sql,
            "SELECT COUNT(t.\"id\") FROM \"history\" AS t WHERE instr(lower(t.\"type\"), lower(?)) > 0 AND t.\"entity_id\" NOT IN (?, ?)"
        );
    }

    #[test]
    fn does_not_contain_negates_the_substring_test() {
        let c = criteria(&HISTORY, &[("updatedBy.doesNotContain", "bot")]);
        let sql = count(&HISTORY, &c).into_sql();
        assert!(sql.ends_with("WHERE NOT (instr(lower(t.\"updated_by\"), lower(?)) > 0)"));
    }

    #[test]
    fn many_to_many_filters_go_through_the_join_table() {
        let c = criteria(&DRUG, &[("flagId.equals", "4")]);
        let sql = count(&DRUG, &c).into_sql();
        assert!(sql.ends_with(
            "WHERE t.\"id\" IN (SELECT j.\"drug_id\" FROM \"rel_drug__flag\" AS j WHERE j.\"flag_id\" = ?)"
        ));

        let c = criteria(&DRUG, &[("treatmentId.specified", "false")]);
        let sql = count(&DRUG, &c).into_sql();
        assert!(sql.ends_with(
            "WHERE t.\"id\" NOT IN (SELECT \"drug_id\" FROM \"rel_treatment__drug\")"
        ));
    }

    #[test]
    fn one_to_many_filters_go_through_the_child_table() {
        let c = criteria(&DRUG, &[("fdaDrugId.in", "1,2")]);
        let sql = count(&DRUG, &c).into_sql();
        assert!(sql.ends_with(
            "WHERE t.\"id\" IN (SELECT c.\"drug_id\" FROM \"fda_drug\" AS c WHERE c.\"drug_id\" IS NOT NULL AND c.\"id\" IN (?, ?))"
        ));
    }

    #[test]
    fn many_to_one_filters_use_the_foreign_key() {
        let c = criteria(&CANCER_TYPE, &[("parentId.specified", "true")]);
        let sql = count(&CANCER_TYPE, &c).into_sql();
        assert!(sql.ends_with("WHERE t.\"parent_id\" IS NOT NULL"));
    }

    #[test]
    fn page_orders_by_requested_keys_then_id() {
        let c = Criteria::default();
        let p = page(&GENOME_FRAGMENT, &[("sort", "end,desc"), ("size", "5")]);
        let sql = select_page(&GENOME_FRAGMENT, &c, &p).into_sql();
        assert!(sql.ends_with("ORDER BY t.\"end\" DESC, t.\"id\" ASC LIMIT ? OFFSET ?"));

        let p = page(&GENOME_FRAGMENT, &[("sort", "id,desc")]);
        let sql = select_page(&GENOME_FRAGMENT, &c, &p).into_sql();
        assert!(sql.ends_with("ORDER BY t.\"id\" DESC LIMIT ? OFFSET ?"));
    }

    #[test]
    fn distinct_selects_distinct_rows() {
        let c = criteria(&DRUG, &[("distinct", "true")]);
        let sql = select_page(&DRUG, &c, &PageRequest::first(20)).into_sql();
        assert!(sql.starts_with("SELECT DISTINCT t.\"id\""));
    }

    #[test]
    fn search_requires_search_columns() {
        let p = PageRequest::first(20);
        assert!(select_search(&GENOME_FRAGMENT, "x", &p).is_none());
        assert!(count_search(&GENOME_FRAGMENT, "x").is_none());

        let sql = count_search(&DRUG, "braf")
            .expect("drug is searchable")
            .into_sql();
        assert!(sql.ends_with("WHERE (instr(lower(t.\"name\"), lower(?)) > 0)"));
    }

    #[test]
    fn search_ranks_on_the_first_search_column() {
        let p = PageRequest::first(20);
        let sql = select_search(&HISTORY, "curator", &p)
            .expect("history is searchable")
            .into_sql();
        assert!(sql.contains(
            "WHERE (instr(lower(t.\"entity_name\"), lower(?)) > 0 OR instr(lower(t.\"updated_by\"), lower(?)) > 0)"
        ));
        assert!(sql.contains("ORDER BY CASE WHEN lower(t.\"entity_name\") = lower(?) THEN 0 ELSE 1 END"));
        assert!(sql.ends_with("lower(t.\"entity_name\"), t.\"id\" ASC LIMIT ? OFFSET ?"));
    }
}
