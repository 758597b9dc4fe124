use crate::db::patch::{DbPatchable, EntityPatch, EntityWrite};
use crate::db::query;
use crate::db::record::{EntityRow, render_rows};
use crate::db::schema::{SQLITE_INIT, q};
use crate::error::CurationError;
use curation_schema::{Criteria, EntityKind, PageRequest};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info};

/// A page of rendered rows plus the total number of matches.
pub type PageResult = (Vec<Value>, u64);

#[derive(Debug)]
pub enum DbActorMessage {
    /// Insert a new row (and its association rows); returns the new id.
    Insert(EntityWrite, RpcReplyPort<Result<i64, CurationError>>),

    /// Replace every column and owned relation of row `id`; `false` if it does not exist.
    Replace(i64, EntityWrite, RpcReplyPort<Result<bool, CurationError>>),

    /// Apply only the fields present in the patch; `false` if the row does not exist.
    Patch(EntityPatch, RpcReplyPort<Result<bool, CurationError>>),

    /// One row with relations loaded in full.
    FindOne(EntityKind, i64, RpcReplyPort<Result<Option<Value>, CurationError>>),

    /// Filtered, sorted page; relations loaded in full only when `eager`.
    FindPage(
        EntityKind,
        Criteria,
        PageRequest,
        bool,
        RpcReplyPort<Result<PageResult, CurationError>>,
    ),

    Count(EntityKind, Criteria, RpcReplyPort<Result<u64, CurationError>>),

    Exists(EntityKind, i64, RpcReplyPort<Result<bool, CurationError>>),

    /// Delete by id; `false` when nothing was deleted.
    Delete(EntityKind, i64, RpcReplyPort<Result<bool, CurationError>>),

    /// Ranked free-text search; `None` when the entity is not searchable.
    Search(
        EntityKind,
        String,
        PageRequest,
        RpcReplyPort<Result<Option<PageResult>, CurationError>>,
    ),

    /// Round-trip a trivial statement through the pool.
    Ping(RpcReplyPort<Result<(), CurationError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn insert(&self, write: EntityWrite) -> Result<i64, CurationError> {
        ractor::call!(self.actor, DbActorMessage::Insert, write)
            .map_err(|e| CurationError::RactorError(format!("DbActor Insert RPC failed: {e}")))?
    }

    pub async fn replace(&self, id: i64, write: EntityWrite) -> Result<bool, CurationError> {
        ractor::call!(self.actor, DbActorMessage::Replace, id, write)
            .map_err(|e| CurationError::RactorError(format!("DbActor Replace RPC failed: {e}")))?
    }

    pub async fn patch(&self, patch: EntityPatch) -> Result<bool, CurationError> {
        ractor::call!(self.actor, DbActorMessage::Patch, patch)
            .map_err(|e| CurationError::RactorError(format!("DbActor Patch RPC failed: {e}")))?
    }

    pub async fn find_one(&self, kind: EntityKind, id: i64) -> Result<Option<Value>, CurationError> {
        ractor::call!(self.actor, DbActorMessage::FindOne, kind, id)
            .map_err(|e| CurationError::RactorError(format!("DbActor FindOne RPC failed: {e}")))?
    }

    pub async fn find_page(
        &self,
        kind: EntityKind,
        criteria: Criteria,
        page: PageRequest,
        eager: bool,
    ) -> Result<PageResult, CurationError> {
        ractor::call!(self.actor, DbActorMessage::FindPage, kind, criteria, page, eager)
            .map_err(|e| CurationError::RactorError(format!("DbActor FindPage RPC failed: {e}")))?
    }

    pub async fn count(&self, kind: EntityKind, criteria: Criteria) -> Result<u64, CurationError> {
        ractor::call!(self.actor, DbActorMessage::Count, kind, criteria)
            .map_err(|e| CurationError::RactorError(format!("DbActor Count RPC failed: {e}")))?
    }

    pub async fn exists(&self, kind: EntityKind, id: i64) -> Result<bool, CurationError> {
        ractor::call!(self.actor, DbActorMessage::Exists, kind, id)
            .map_err(|e| CurationError::RactorError(format!("DbActor Exists RPC failed: {e}")))?
    }

    pub async fn delete(&self, kind: EntityKind, id: i64) -> Result<bool, CurationError> {
        ractor::call!(self.actor, DbActorMessage::Delete, kind, id)
            .map_err(|e| CurationError::RactorError(format!("DbActor Delete RPC failed: {e}")))?
    }

    pub async fn search(
        &self,
        kind: EntityKind,
        needle: String,
        page: PageRequest,
    ) -> Result<Option<PageResult>, CurationError> {
        ractor::call!(self.actor, DbActorMessage::Search, kind, needle, page)
            .map_err(|e| CurationError::RactorError(format!("DbActor Search RPC failed: {e}")))?
    }

    pub async fn ping(&self) -> Result<(), CurationError> {
        ractor::call!(self.actor, DbActorMessage::Ping)
            .map_err(|e| CurationError::RactorError(format!("DbActor Ping RPC failed: {e}")))?
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!(database_url = %database_url, "DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::Insert(write, reply) => {
                let res = self.insert(&state.pool, write).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Replace(id, write, reply) => {
                let res = self.apply(&state.pool, id, &write).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Patch(patch, reply) => {
                let res = self.apply(&state.pool, patch.id, &patch).await;
                let _ = reply.send(res);
            }
            DbActorMessage::FindOne(kind, id, reply) => {
                let res = self.find_one(&state.pool, kind, id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::FindPage(kind, criteria, page, eager, reply) => {
                let res = self
                    .find_page(&state.pool, kind, &criteria, &page, eager)
                    .await;
                let _ = reply.send(res);
            }
            DbActorMessage::Count(kind, criteria, reply) => {
                let res = self.count(&state.pool, kind, &criteria).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Exists(kind, id, reply) => {
                let res = self.exists(&state.pool, kind, id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Delete(kind, id, reply) => {
                let res = self.delete(&state.pool, kind, id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Search(kind, needle, page, reply) => {
                let res = self.search(&state.pool, kind, &needle, &page).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Ping(reply) => {
                let res = sqlx::query("SELECT 1")
                    .execute(&state.pool)
                    .await
                    .map(|_| ())
                    .map_err(CurationError::from);
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn insert(&self, pool: &SqlitePool, write: EntityWrite) -> Result<i64, CurationError> {
        let mut tx = pool.begin().await?;
        let id = write.insert(&mut tx).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn apply<P>(&self, pool: &SqlitePool, id: i64, patch: &P) -> Result<bool, CurationError>
    where
        P: DbPatchable + Sync,
    {
        let mut tx = pool.begin().await?;
        let applied = patch.apply_patch(&mut tx, id).await?;
        if applied {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }
        Ok(applied)
    }

    async fn find_one(
        &self,
        pool: &SqlitePool,
        kind: EntityKind,
        id: i64,
    ) -> Result<Option<Value>, CurationError> {
        let def = kind.def();
        let mut qb = query::select_by_id(def, id);
        let Some(row) = qb.build().fetch_optional(pool).await? else {
            return Ok(None);
        };
        let row = EntityRow::decode(def, &row)?;
        Ok(render_rows(pool, def, &[row], true).await?.pop())
    }

    async fn find_page(
        &self,
        pool: &SqlitePool,
        kind: EntityKind,
        criteria: &Criteria,
        page: &PageRequest,
        eager: bool,
    ) -> Result<PageResult, CurationError> {
        let def = kind.def();
        let total = self.count(pool, kind, criteria).await?;

        let mut qb = query::select_page(def, criteria, page);
        let rows = qb
            .build()
            .fetch_all(pool)
            .await?
            .iter()
            .map(|row| EntityRow::decode(def, row))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            entity = def.name,
            conditions = criteria.conditions.len(),
            page = page.page,
            size = page.size,
            returned = rows.len(),
            total,
            "db page fetched"
        );
        Ok((render_rows(pool, def, &rows, eager).await?, total))
    }

    async fn count(
        &self,
        pool: &SqlitePool,
        kind: EntityKind,
        criteria: &Criteria,
    ) -> Result<u64, CurationError> {
        let mut qb = query::count(kind.def(), criteria);
        let n = qb.build_query_scalar::<i64>().fetch_one(pool).await?;
        Ok(u64::try_from(n).unwrap_or_default())
    }

    async fn exists(
        &self,
        pool: &SqlitePool,
        kind: EntityKind,
        id: i64,
    ) -> Result<bool, CurationError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?)",
            q(kind.def().table),
            q("id")
        );
        let found: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(pool).await?;
        Ok(found)
    }

    async fn delete(
        &self,
        pool: &SqlitePool,
        kind: EntityKind,
        id: i64,
    ) -> Result<bool, CurationError> {
        let def = kind.def();
        let sql = format!("DELETE FROM {} WHERE {} = ?", q(def.table), q("id"));
        let mut tx = pool.begin().await?;
        let affected = sqlx::query(&sql)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        debug!(entity = def.name, id, affected, "db delete applied");
        Ok(affected > 0)
    }

    async fn search(
        &self,
        pool: &SqlitePool,
        kind: EntityKind,
        needle: &str,
        page: &PageRequest,
    ) -> Result<Option<PageResult>, CurationError> {
        let def = kind.def();
        let (Some(mut count_qb), Some(mut select_qb)) = (
            query::count_search(def, needle),
            query::select_search(def, needle, page),
        ) else {
            return Ok(None);
        };

        let total = count_qb.build_query_scalar::<i64>().fetch_one(pool).await?;
        let rows = select_qb
            .build()
            .fetch_all(pool)
            .await?
            .iter()
            .map(|row| EntityRow::decode(def, row))
            .collect::<Result<Vec<_>, _>>()?;

        let rendered = render_rows(pool, def, &rows, false).await?;
        Ok(Some((rendered, u64::try_from(total).unwrap_or_default())))
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> Result<DbActorHandle, CurationError> {
    let (actor, _jh) = ractor::Actor::spawn(
        Some(format!("DbActor:{database_url}")),
        DbActor,
        database_url.to_string(),
    )
    .await
    .map_err(|e| CurationError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), CurationError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
