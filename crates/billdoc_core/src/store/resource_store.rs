//! Resource store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/update/delete over every resource kind.
//! - Provide a transaction scope spanning several calls of one public operation.
//! - Keep SQL and JSON encoding details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Resource::validate()` before any SQL mutation.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `create` never overwrites: an existing `(kind, id)` is `AlreadyExists`.
//! - `update` is an upsert and reports whether it created the row.

use crate::db::DbError;
use crate::model::resource::{ModelError, Resource, ResourceKind, TypedId};
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Resource store error.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Target resource does not exist.
    NotFound(TypedId),
    /// `create` hit an existing `(kind, id)`.
    AlreadyExists(TypedId),
    /// Resource violates a model invariant and was not written.
    Invalid(ModelError),
    /// `update` requires an explicit id.
    MissingId(ResourceKind),
    /// Persisted row cannot be decoded into a valid resource.
    InvalidData(String),
    Serialization(serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(target) => write!(f, "resource not found: {target}"),
            Self::AlreadyExists(target) => write!(f, "resource already exists: {target}"),
            Self::Invalid(err) => write!(f, "{err}"),
            Self::MissingId(kind) => write!(f, "{kind} update requires an explicit id"),
            Self::InvalidData(message) => write!(f, "invalid persisted resource data: {message}"),
            Self::Serialization(err) => write!(f, "resource serialization failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Invalid(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::NotFound(_)
            | Self::AlreadyExists(_)
            | Self::MissingId(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ModelError> for StoreError {
    fn from(value: ModelError) -> Self {
        Self::Invalid(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOutcome<R> {
    /// Id under which the resource was stored.
    pub id: String,
    /// Resource as persisted, id included.
    pub resource: R,
    /// `true` when the write created a new row.
    pub created: bool,
}

/// Storage contract consumed by the submission and erasure components.
pub trait ResourceStore {
    /// Stores a new resource. A missing id is assigned by the store.
    fn create<R: Resource>(&self, resource: &R) -> StoreResult<StoreOutcome<R>>;

    /// Loads one resource by id.
    fn read<R: Resource>(&self, id: &str) -> StoreResult<Option<R>>;

    /// Creates or replaces a resource under its explicit id.
    fn update<R: Resource>(&self, resource: &R) -> StoreResult<StoreOutcome<R>>;

    /// Deletes one resource. Missing targets yield `StoreError::NotFound`.
    fn delete(&self, target: &TypedId) -> StoreResult<()>;

    /// Runs `work` inside one atomic transaction.
    ///
    /// Commits when `work` returns `Ok`; rolls back every mutation made by
    /// `work` when it returns `Err`.
    fn in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StoreError>;
}

/// SQLite-backed resource store.
pub struct SqliteResourceStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteResourceStore<'conn> {
    /// Creates a store over a migrated connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn exists(&self, kind: ResourceKind, id: &str) -> StoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM resources
                WHERE kind = ?1 AND id = ?2
            );",
            params![kind.as_str(), id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl ResourceStore for SqliteResourceStore<'_> {
    fn create<R: Resource>(&self, resource: &R) -> StoreResult<StoreOutcome<R>> {
        let mut stored = resource.clone();
        let id = match resource.id() {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        stored.set_id(Some(id.clone()));
        stored.validate()?;
        let body = serde_json::to_string(&stored)?;

        let inserted = self.conn.execute(
            "INSERT INTO resources (kind, id, body) VALUES (?1, ?2, ?3);",
            params![R::KIND.as_str(), id.as_str(), body],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                return Err(StoreError::AlreadyExists(TypedId { kind: R::KIND, id }));
            }
            Err(err) => return Err(err.into()),
        }

        debug!(
            "event=store_write module=store op=create kind={} id={}",
            R::KIND,
            id
        );
        Ok(StoreOutcome {
            id,
            resource: stored,
            created: true,
        })
    }

    fn read<R: Resource>(&self, id: &str) -> StoreResult<Option<R>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body
                 FROM resources
                 WHERE kind = ?1 AND id = ?2;",
                params![R::KIND.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(body) = body else {
            return Ok(None);
        };
        let resource: R = serde_json::from_str(&body).map_err(|err| {
            StoreError::InvalidData(format!("{}/{id} body is not decodable: {err}", R::KIND))
        })?;
        if resource.id() != Some(id) {
            return Err(StoreError::InvalidData(format!(
                "{}/{id} body carries id {:?}",
                R::KIND,
                resource.id()
            )));
        }
        resource
            .validate()
            .map_err(|err| StoreError::InvalidData(format!("{}/{id}: {err}", R::KIND)))?;
        Ok(Some(resource))
    }

    fn update<R: Resource>(&self, resource: &R) -> StoreResult<StoreOutcome<R>> {
        let id = resource
            .id()
            .map(str::to_string)
            .ok_or(StoreError::MissingId(R::KIND))?;
        resource.validate()?;
        let body = serde_json::to_string(resource)?;

        let existed = self.exists(R::KIND, &id)?;
        if existed {
            self.conn.execute(
                "UPDATE resources
                 SET body = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE kind = ?1 AND id = ?2;",
                params![R::KIND.as_str(), id.as_str(), body],
            )?;
        } else {
            self.conn.execute(
                "INSERT INTO resources (kind, id, body) VALUES (?1, ?2, ?3);",
                params![R::KIND.as_str(), id.as_str(), body],
            )?;
        }

        debug!(
            "event=store_write module=store op=update kind={} id={} created={}",
            R::KIND,
            id,
            !existed
        );
        Ok(StoreOutcome {
            id,
            resource: resource.clone(),
            created: !existed,
        })
    }

    fn delete(&self, target: &TypedId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM resources WHERE kind = ?1 AND id = ?2;",
            params![target.kind.as_str(), target.id.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(target.clone()));
        }

        debug!("event=store_write module=store op=delete target={target}");
        Ok(())
    }

    fn in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;

        match work(self) {
            Ok(value) => {
                tx.commit().map_err(StoreError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    error!(
                        "event=store_tx module=store status=error op=rollback error={rollback_err}"
                    );
                }
                Err(err)
            }
        }
    }
}
