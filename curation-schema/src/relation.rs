use crate::entity::EntityKind;

/// An association table seen from one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinTable {
    pub table: &'static str,
    /// Column referencing the entity that declares the relation.
    pub self_column: &'static str,
    /// Column referencing the related entity.
    pub target_column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Foreign key column on this entity's table.
    ManyToOne { column: &'static str },
    /// Owning side of an association table; written through this entity.
    ManyToMany(JoinTable),
    /// Mapped-by side of an association table owned by the target.
    InverseManyToMany(JoinTable),
    /// Foreign key column on the target table pointing back here.
    OneToMany { column: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDef {
    /// JSON key for owned relations.
    pub name: &'static str,
    /// Criteria prefix; the filter key is `<filter>Id`.
    pub filter: &'static str,
    pub target: EntityKind,
    pub kind: RelationKind,
}

impl RelationDef {
    pub const fn many_to_one(name: &'static str, target: EntityKind, column: &'static str) -> Self {
        Self {
            name,
            filter: name,
            target,
            kind: RelationKind::ManyToOne { column },
        }
    }

    pub const fn many_to_many(
        name: &'static str,
        filter: &'static str,
        target: EntityKind,
        table: &'static str,
        self_column: &'static str,
        target_column: &'static str,
    ) -> Self {
        Self {
            name,
            filter,
            target,
            kind: RelationKind::ManyToMany(JoinTable {
                table,
                self_column,
                target_column,
            }),
        }
    }

    pub const fn inverse(
        filter: &'static str,
        target: EntityKind,
        table: &'static str,
        self_column: &'static str,
        target_column: &'static str,
    ) -> Self {
        Self {
            name: filter,
            filter,
            target,
            kind: RelationKind::InverseManyToMany(JoinTable {
                table,
                self_column,
                target_column,
            }),
        }
    }

    pub const fn one_to_many(filter: &'static str, target: EntityKind, column: &'static str) -> Self {
        Self {
            name: filter,
            filter,
            target,
            kind: RelationKind::OneToMany { column },
        }
    }

    /// Owned relations are written from payloads and rendered in responses.
    pub const fn is_owned(&self) -> bool {
        matches!(
            self.kind,
            RelationKind::ManyToOne { .. } | RelationKind::ManyToMany(_)
        )
    }

    pub fn filter_key(&self) -> String {
        format!("{}Id", self.filter)
    }

    pub fn matches_filter_key(&self, key: &str) -> bool {
        key.strip_suffix("Id") == Some(self.filter)
    }
}
