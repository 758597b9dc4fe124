//! Per-field query filters (`name.contains=BRAF`, `geneId.in=1,2`, ...).
//!
//! Every condition in a [`Criteria`] must hold for a row to match.

use crate::entity::EntityDef;
use crate::error::CriteriaError;
use crate::field::{FieldDef, FieldKind, ScalarValue};
use crate::relation::RelationDef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equals,
    NotEquals,
    In,
    NotIn,
    Specified,
    Contains,
    DoesNotContain,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl FilterOp {
    pub fn parse(raw: &str) -> Option<Self> {
        let op = match raw {
            "equals" => FilterOp::Equals,
            "notEquals" => FilterOp::NotEquals,
            "in" => FilterOp::In,
            "notIn" => FilterOp::NotIn,
            "specified" => FilterOp::Specified,
            "contains" => FilterOp::Contains,
            "doesNotContain" => FilterOp::DoesNotContain,
            "greaterThan" => FilterOp::GreaterThan,
            "greaterThanOrEqual" => FilterOp::GreaterThanOrEqual,
            "lessThan" => FilterOp::LessThan,
            "lessThanOrEqual" => FilterOp::LessThanOrEqual,
            _ => return None,
        };
        Some(op)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            FilterOp::Equals => "equals",
            FilterOp::NotEquals => "notEquals",
            FilterOp::In => "in",
            FilterOp::NotIn => "notIn",
            FilterOp::Specified => "specified",
            FilterOp::Contains => "contains",
            FilterOp::DoesNotContain => "doesNotContain",
            FilterOp::GreaterThan => "greaterThan",
            FilterOp::GreaterThanOrEqual => "greaterThanOrEqual",
            FilterOp::LessThan => "lessThan",
            FilterOp::LessThanOrEqual => "lessThanOrEqual",
        }
    }
}

/// What a condition constrains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Id,
    Field(&'static FieldDef),
    /// Ids of related rows, through whichever table holds the link.
    Relation(&'static RelationDef),
}

impl Target {
    pub fn kind(&self) -> FieldKind {
        match self {
            Target::Id | Target::Relation(_) => FieldKind::Long,
            Target::Field(f) => f.kind,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Target::Id => "id".to_string(),
            Target::Field(f) => f.name.to_string(),
            Target::Relation(r) => r.filter_key(),
        }
    }

    fn resolve(def: &EntityDef, name: &str) -> Option<Self> {
        if name == "id" {
            return Some(Target::Id);
        }
        def.field(name)
            .map(Target::Field)
            .or_else(|| def.relation_by_filter_key(name).map(Target::Relation))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(ScalarValue),
    NotEquals(ScalarValue),
    In(Vec<ScalarValue>),
    NotIn(Vec<ScalarValue>),
    /// `true` => IS NOT NULL (or has any related row).
    Specified(bool),
    /// Case-insensitive substring.
    Contains(String),
    DoesNotContain(String),
    GreaterThan(ScalarValue),
    GreaterThanOrEqual(ScalarValue),
    LessThan(ScalarValue),
    LessThanOrEqual(ScalarValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub target: Target,
    pub predicate: Predicate,
}

impl Condition {
    pub fn parse(target: Target, op: FilterOp, raw: &str) -> Result<Self, CriteriaError> {
        let kind = target.kind();
        if !kind.supports(op) {
            return Err(CriteriaError::UnsupportedOperator {
                field: target.name(),
                op: op.as_str(),
            });
        }

        let invalid = || CriteriaError::InvalidValue {
            field: target.name(),
            value: raw.to_string(),
            expected: kind.describe(),
        };
        let one = |raw: &str| kind.parse_str(raw).ok_or_else(invalid);
        let many = |raw: &str| {
            raw.split(',')
                .map(|part| kind.parse_str(part).ok_or_else(invalid))
                .collect::<Result<Vec<_>, _>>()
        };

        let predicate = match op {
            FilterOp::Equals => Predicate::Equals(one(raw)?),
            FilterOp::NotEquals => Predicate::NotEquals(one(raw)?),
            FilterOp::In => Predicate::In(many(raw)?),
            FilterOp::NotIn => Predicate::NotIn(many(raw)?),
            FilterOp::Specified => match raw.trim() {
                "true" => Predicate::Specified(true),
                "false" => Predicate::Specified(false),
                _ => {
                    return Err(CriteriaError::InvalidValue {
                        field: target.name(),
                        value: raw.to_string(),
                        expected: FieldKind::Boolean.describe(),
                    });
                }
            },
            FilterOp::Contains => Predicate::Contains(raw.to_string()),
            FilterOp::DoesNotContain => Predicate::DoesNotContain(raw.to_string()),
            FilterOp::GreaterThan => Predicate::GreaterThan(one(raw)?),
            FilterOp::GreaterThanOrEqual => Predicate::GreaterThanOrEqual(one(raw)?),
            FilterOp::LessThan => Predicate::LessThan(one(raw)?),
            FilterOp::LessThanOrEqual => Predicate::LessThanOrEqual(one(raw)?),
        };

        Ok(Self { target, predicate })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub conditions: Vec<Condition>,
    pub distinct: bool,
}

impl Criteria {
    /// Build criteria from decoded query-string pairs.
    ///
    /// Keys that do not name a field or relation filter of `def` (paging,
    /// `eagerload`, cache busters) are skipped. A known field with an unknown
    /// operator, an operator the field kind does not support, or a value that
    /// does not parse is rejected.
    pub fn parse<'a, I>(def: &EntityDef, pairs: I) -> Result<Self, CriteriaError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut criteria = Criteria::default();
        for (key, raw) in pairs {
            if key == "distinct" {
                criteria.distinct = raw.trim() == "true";
                continue;
            }
            let Some((name, op)) = key.rsplit_once('.') else {
                continue;
            };
            let Some(target) = Target::resolve(def, name) else {
                continue;
            };
            let op = FilterOp::parse(op).ok_or_else(|| CriteriaError::UnknownOperator {
                key: key.to_string(),
            })?;
            criteria.conditions.push(Condition::parse(target, op, raw)?);
        }
        Ok(criteria)
    }
}
