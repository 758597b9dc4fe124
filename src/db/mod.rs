//! Database module: the SQLite store behind every entity resource.
//!
//! Layout:
//! - `schema.rs`: SQL DDL generated from the entity catalog
//! - `query.rs`: criteria / paging / search rendered with `sqlx::QueryBuilder`
//! - `record.rs`: row decoding and JSON rendering (relation stubs or eager rows)
//! - `patch.rs`: typed write payloads and the `DbPatchable` trait
//! - `actor.rs`: `DbActor` owning the pool; all access goes through its mailbox

pub mod actor;
pub mod patch;
pub mod record;
pub mod schema;

mod query;

pub use actor::{DbActorHandle, PageResult, spawn};
pub use patch::{DbPatchable, EntityPatch, EntityWrite, RelationWrite};
pub use record::EntityRow;
pub use schema::SQLITE_INIT;
