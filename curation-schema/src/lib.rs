//! Entity catalog and request grammar for the curation API.
//!
//! Nothing in this crate performs I/O: it describes the entities (fields,
//! column kinds, relations) and turns query-string pairs into typed
//! [`Criteria`] and [`PageRequest`] values that the store renders into SQL.

pub mod catalog;
pub mod criteria;
pub mod entity;
pub mod enums;
pub mod error;
pub mod field;
pub mod page;
pub mod relation;

pub use criteria::{Condition, Criteria, FilterOp, Predicate, Target};
pub use entity::{EntityDef, EntityKind};
pub use enums::Enumeration;
pub use error::CriteriaError;
pub use field::{FieldDef, FieldKind, ScalarValue};
pub use page::{PageDefaults, PageMeta, PageRequest, SortKey, SortOrder};
pub use relation::{JoinTable, RelationDef, RelationKind};
