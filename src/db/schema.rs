//! SQL DDL for initializing the database schema.
//!
//! Generated from the entity catalog so the tables always agree with the
//! columns the query layer reads and writes:
//! - one table per entity (`id` autoincrement, scalar columns, foreign keys)
//! - one association table per owning many-to-many relation
//! - an index per foreign key / association column

use curation_schema::{EntityDef, EntityKind, RelationKind};
use std::fmt::Write as _;
use std::sync::LazyLock;

pub static SQLITE_INIT: LazyLock<String> = LazyLock::new(sqlite_init);

/// Quote an identifier; several columns (`end`, `type`, `number`) are keywords.
pub(crate) fn q(ident: &str) -> String {
    format!("\"{ident}\"")
}

pub fn sqlite_init() -> String {
    let mut ddl = String::new();
    for kind in EntityKind::ALL {
        push_entity_table(&mut ddl, kind.def());
    }
    for kind in EntityKind::ALL {
        push_join_tables(&mut ddl, kind.def());
    }
    ddl
}

fn push_entity_table(ddl: &mut String, def: &EntityDef) {
    let mut columns = vec![format!("    {} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL", q("id"))];

    for field in def.fields {
        let mut column = format!(
            "    {} {} {}",
            q(field.column),
            field.kind.sql_type(),
            if field.required { "NOT NULL" } else { "NULL" }
        );
        if field.unique {
            column.push_str(" UNIQUE");
        }
        columns.push(column);
    }

    let mut indices = Vec::new();
    for relation in def.relations {
        if let RelationKind::ManyToOne { column } = relation.kind {
            columns.push(format!(
                "    {} INTEGER NULL REFERENCES {}({}) ON DELETE SET NULL",
                q(column),
                q(relation.target.def().table),
                q("id")
            ));
            indices.push(column);
        }
    }

    let _ = writeln!(
        ddl,
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        q(def.table),
        columns.join(",\n")
    );
    for column in indices {
        push_index(ddl, def.table, column);
    }
    ddl.push('\n');
}

fn push_join_tables(ddl: &mut String, def: &EntityDef) {
    for relation in def.relations {
        let RelationKind::ManyToMany(join) = relation.kind else {
            continue;
        };
        let _ = writeln!(
            ddl,
            "CREATE TABLE IF NOT EXISTS {table} (\n    {own} INTEGER NOT NULL REFERENCES {own_table}({id}) ON DELETE CASCADE,\n    {target} INTEGER NOT NULL REFERENCES {target_table}({id}) ON DELETE CASCADE,\n    PRIMARY KEY ({own}, {target})\n);",
            table = q(join.table),
            own = q(join.self_column),
            own_table = q(def.table),
            target = q(join.target_column),
            target_table = q(relation.target.def().table),
            id = q("id"),
        );
        push_index(ddl, join.table, join.target_column);
        ddl.push('\n');
    }
}

fn push_index(ddl: &mut String, table: &str, column: &str) {
    let _ = writeln!(
        ddl,
        "CREATE INDEX IF NOT EXISTS {} ON {}({});",
        q(&format!("idx_{table}_{column}")),
        q(table),
        q(column)
    );
}
