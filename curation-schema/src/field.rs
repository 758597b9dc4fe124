use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::criteria::FilterOp;
use crate::enums::Enumeration;

/// Storage/wire kind of a scalar column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// 32-bit integer on the wire, INTEGER in SQLite.
    Integer,
    /// 64-bit integer (ids, foreign keys).
    Long,
    Boolean,
    /// RFC 3339 on the wire, fixed-width UTC text in SQLite so that text order is time order.
    Instant,
    Enum(Enumeration),
}

/// A typed value parsed from a query string or a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Instant(DateTime<Utc>),
}

/// Storage format for [`FieldKind::Instant`] columns.
pub const INSTANT_STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

impl ScalarValue {
    pub fn to_json(&self) -> Value {
        match self {
            ScalarValue::Text(s) => Value::String(s.clone()),
            ScalarValue::Integer(n) => Value::from(*n),
            ScalarValue::Boolean(b) => Value::Bool(*b),
            ScalarValue::Instant(t) => {
                Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
        }
    }
}

impl FieldKind {
    pub const fn sql_type(self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::Instant | FieldKind::Enum(_) => "TEXT",
            FieldKind::Integer | FieldKind::Long | FieldKind::Boolean => "INTEGER",
        }
    }

    pub const fn describe(self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::Integer => "a 32-bit integer",
            FieldKind::Long => "an integer",
            FieldKind::Boolean => "true or false",
            FieldKind::Instant => "an RFC 3339 instant",
            FieldKind::Enum(e) => e.name(),
        }
    }

    /// Whether the criteria grammar accepts `op` on a field of this kind.
    pub fn supports(self, op: FilterOp) -> bool {
        match op {
            FilterOp::Equals
            | FilterOp::NotEquals
            | FilterOp::In
            | FilterOp::NotIn
            | FilterOp::Specified => true,
            FilterOp::Contains | FilterOp::DoesNotContain => matches!(self, FieldKind::Text),
            FilterOp::GreaterThan
            | FilterOp::GreaterThanOrEqual
            | FilterOp::LessThan
            | FilterOp::LessThanOrEqual => matches!(
                self,
                FieldKind::Integer | FieldKind::Long | FieldKind::Instant
            ),
        }
    }

    /// Parse a raw query-string value.
    pub fn parse_str(self, raw: &str) -> Option<ScalarValue> {
        match self {
            FieldKind::Text => Some(ScalarValue::Text(raw.to_string())),
            FieldKind::Integer => raw
                .trim()
                .parse::<i32>()
                .ok()
                .map(|n| ScalarValue::Integer(i64::from(n))),
            FieldKind::Long => raw.trim().parse::<i64>().ok().map(ScalarValue::Integer),
            FieldKind::Boolean => match raw.trim() {
                "true" => Some(ScalarValue::Boolean(true)),
                "false" => Some(ScalarValue::Boolean(false)),
                _ => None,
            },
            FieldKind::Instant => DateTime::parse_from_rfc3339(raw.trim())
                .ok()
                .map(|t| ScalarValue::Instant(t.with_timezone(&Utc))),
            FieldKind::Enum(e) => e.parse(raw).map(|v| ScalarValue::Text(v.to_string())),
        }
    }

    /// Convert a non-null JSON value; `None` when the value does not fit the kind.
    pub fn from_json(self, value: &Value) -> Option<ScalarValue> {
        match (self, value) {
            (FieldKind::Text, Value::String(s)) => Some(ScalarValue::Text(s.clone())),
            (FieldKind::Integer, Value::Number(n)) => n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(|n| ScalarValue::Integer(i64::from(n))),
            (FieldKind::Long, Value::Number(n)) => n.as_i64().map(ScalarValue::Integer),
            (FieldKind::Boolean, Value::Bool(b)) => Some(ScalarValue::Boolean(*b)),
            (FieldKind::Instant, Value::String(s)) => self.parse_str(s),
            (FieldKind::Enum(e), Value::String(s)) => {
                e.parse(s).map(|v| ScalarValue::Text(v.to_string()))
            }
            _ => None,
        }
    }
}

/// A scalar attribute of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// camelCase JSON key and criteria filter name.
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
    /// NOT NULL; enforced before persistence.
    pub required: bool,
    pub unique: bool,
    /// Filled with a random UUID on create when the payload omits it.
    pub generated: bool,
}

impl FieldDef {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column,
            kind,
            required: false,
            unique: false,
            generated: false,
        }
    }

    pub const fn text(name: &'static str, column: &'static str) -> Self {
        Self::new(name, column, FieldKind::Text)
    }

    pub const fn integer(name: &'static str, column: &'static str) -> Self {
        Self::new(name, column, FieldKind::Integer)
    }

    pub const fn boolean(name: &'static str, column: &'static str) -> Self {
        Self::new(name, column, FieldKind::Boolean)
    }

    pub const fn instant(name: &'static str, column: &'static str) -> Self {
        Self::new(name, column, FieldKind::Instant)
    }

    pub const fn enumeration(name: &'static str, column: &'static str, e: Enumeration) -> Self {
        Self::new(name, column, FieldKind::Enum(e))
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }

    pub const fn generated(self) -> Self {
        Self {
            generated: true,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_rejects_values_outside_i32() {
        assert_eq!(FieldKind::Integer.parse_str("2147483648"), None);
        assert_eq!(
            FieldKind::Integer.parse_str("-5"),
            Some(ScalarValue::Integer(-5))
        );
        assert_eq!(FieldKind::Integer.from_json(&json!(3_000_000_000i64)), None);
        assert_eq!(
            FieldKind::Long.from_json(&json!(3_000_000_000i64)),
            Some(ScalarValue::Integer(3_000_000_000))
        );
    }

    #[test]
    fn instant_renders_as_utc_rfc3339() {
        let parsed = FieldKind::Instant
            .parse_str("1970-01-01T01:00:00+01:00")
            .expect("valid instant");
        assert_eq!(parsed.to_json(), json!("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn json_kind_mismatch_is_rejected() {
        assert_eq!(FieldKind::Text.from_json(&json!(1)), None);
        assert_eq!(FieldKind::Boolean.from_json(&json!("true")), None);
        assert_eq!(
            FieldKind::Enum(Enumeration::ArticleType).from_json(&json!("BOOK")),
            None
        );
    }

    #[test]
    fn only_text_supports_contains() {
        assert!(FieldKind::Text.supports(FilterOp::Contains));
        assert!(!FieldKind::Integer.supports(FilterOp::Contains));
        assert!(!FieldKind::Boolean.supports(FilterOp::GreaterThan));
        assert!(FieldKind::Instant.supports(FilterOp::LessThanOrEqual));
    }
}
