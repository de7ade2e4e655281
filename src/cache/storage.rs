//! Local store trait and SQLite implementation.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::params;
use thiserror::Error;
use tracing::debug;

use super::traits::Resource;
use crate::db::{schema, Database};

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("Row serialization failed: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("Invalid timestamp '{0}'")]
  InvalidTimestamp(String),

  #[error("Lock poisoned: {0}")]
  LockPoisoned(String),
}

/// Rows read back for one resource scope.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRows<Row> {
  /// Rows in insertion order
  pub rows: Vec<Row>,
  /// When the rows were written, `None` when there are none
  pub cached_at: Option<DateTime<Utc>>,
}

impl<Row> CachedRows<Row> {
  pub fn empty() -> Self {
    Self {
      rows: Vec::new(),
      cached_at: None,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }
}

/// Trait for local store backends.
///
/// Each resource owns disjoint rows; within a resource rows are grouped by
/// scope (see [`Resource::scope`]).
pub trait LocalStore: Send + Sync {
  /// Make sure storage for `R` exists.
  fn prepare<R: Resource>(&self) -> Result<(), StoreError>;

  fn read_all<R: Resource>(&self, scope: &str) -> Result<CachedRows<R::Row>, StoreError>;

  fn insert<R: Resource>(&self, scope: &str, row: &R::Row) -> Result<(), StoreError>;

  fn delete_all<R: Resource>(&self, scope: &str) -> Result<(), StoreError>;

  /// Delete every row of the scope and insert `rows`, atomically.
  fn replace_all<R: Resource>(&self, scope: &str, rows: &[R::Row]) -> Result<(), StoreError>;

  /// Empty every resource (logout, account switch).
  fn clear_all(&self) -> Result<(), StoreError>;
}

impl<S: LocalStore> LocalStore for Arc<S> {
  fn prepare<R: Resource>(&self) -> Result<(), StoreError> {
    (**self).prepare::<R>()
  }

  fn read_all<R: Resource>(&self, scope: &str) -> Result<CachedRows<R::Row>, StoreError> {
    (**self).read_all::<R>(scope)
  }

  fn insert<R: Resource>(&self, scope: &str, row: &R::Row) -> Result<(), StoreError> {
    (**self).insert::<R>(scope, row)
  }

  fn delete_all<R: Resource>(&self, scope: &str) -> Result<(), StoreError> {
    (**self).delete_all::<R>(scope)
  }

  fn replace_all<R: Resource>(&self, scope: &str, rows: &[R::Row]) -> Result<(), StoreError> {
    (**self).replace_all::<R>(scope, rows)
  }

  fn clear_all(&self) -> Result<(), StoreError> {
    (**self).clear_all()
  }
}

struct Inner {
  db: Database,
  prepared: HashSet<&'static str>,
}

impl Inner {
  fn ensure<R: Resource>(&mut self) -> Result<(), StoreError> {
    if self.prepared.contains(R::NAME) {
      return Ok(());
    }
    self
      .db
      .conn()
      .execute_batch(&schema::resource_table(R::NAME, R::CARDINALITY))?;
    self.prepared.insert(R::NAME);
    Ok(())
  }
}

/// SQLite-based local store. One physical database shared by all resources.
pub struct SqliteStore {
  inner: Mutex<Inner>,
}

impl SqliteStore {
  pub fn new(db: Database) -> Self {
    Self {
      inner: Mutex::new(Inner {
        db,
        prepared: HashSet::new(),
      }),
    }
  }

  /// Open (or create) the store at `path`.
  pub fn open(path: &Path) -> color_eyre::Result<Self> {
    Ok(Self::new(Database::open(path)?))
  }

  pub fn in_memory() -> color_eyre::Result<Self> {
    Ok(Self::new(Database::in_memory()?))
  }

  fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
    self
      .inner
      .lock()
      .map_err(|e| StoreError::LockPoisoned(e.to_string()))
  }
}

impl LocalStore for SqliteStore {
  fn prepare<R: Resource>(&self) -> Result<(), StoreError> {
    self.lock()?.ensure::<R>()
  }

  fn read_all<R: Resource>(&self, scope: &str) -> Result<CachedRows<R::Row>, StoreError> {
    let mut inner = self.lock()?;
    inner.ensure::<R>()?;

    let sql = format!(
      "SELECT payload, cached_at FROM {} WHERE scope = ?1 ORDER BY rowid",
      schema::table_name(R::NAME)
    );
    let mut stmt = inner.db.conn().prepare(&sql)?;
    let raw: Vec<(String, String)> = stmt
      .query_map(params![scope], |row| Ok((row.get(0)?, row.get(1)?)))?
      .collect::<Result<_, _>>()?;

    let mut cached = CachedRows::empty();
    for (payload, cached_at) in raw {
      if cached.cached_at.is_none() {
        cached.cached_at = Some(parse_datetime(&cached_at)?);
      }
      cached.rows.push(serde_json::from_str(&payload)?);
    }

    Ok(cached)
  }

  fn insert<R: Resource>(&self, scope: &str, row: &R::Row) -> Result<(), StoreError> {
    let mut inner = self.lock()?;
    inner.ensure::<R>()?;

    let payload = serde_json::to_string(row)?;
    inner.db.conn().execute(
      &schema::insert_row(R::NAME, R::CARDINALITY),
      params![scope, payload],
    )?;
    Ok(())
  }

  fn delete_all<R: Resource>(&self, scope: &str) -> Result<(), StoreError> {
    let mut inner = self.lock()?;
    inner.ensure::<R>()?;

    let deleted = inner.db.conn().execute(
      &format!(
        "DELETE FROM {} WHERE scope = ?1",
        schema::table_name(R::NAME)
      ),
      params![scope],
    )?;
    debug!(resource = R::NAME, scope, deleted, "Deleted cached rows");
    Ok(())
  }

  fn replace_all<R: Resource>(&self, scope: &str, rows: &[R::Row]) -> Result<(), StoreError> {
    let mut inner = self.lock()?;
    inner.ensure::<R>()?;

    let table = schema::table_name(R::NAME);
    let insert = schema::insert_row(R::NAME, R::CARDINALITY);

    // Dropping the transaction without commit rolls everything back
    let tx = inner.db.conn_mut().transaction()?;
    tx.execute(
      &format!("DELETE FROM {} WHERE scope = ?1", table),
      params![scope],
    )?;
    {
      let mut stmt = tx.prepare(&insert)?;
      for row in rows {
        let payload = serde_json::to_string(row)?;
        stmt.execute(params![scope, payload])?;
      }
    }
    tx.commit()?;

    debug!(resource = R::NAME, scope, rows = rows.len(), "Replaced cached rows");
    Ok(())
  }

  fn clear_all(&self) -> Result<(), StoreError> {
    let mut inner = self.lock()?;

    let tables: Vec<String> = {
      let mut stmt = inner.db.conn().prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE ?1 ESCAPE '\\'",
      )?;
      let pattern = format!("{}%", schema::TABLE_PREFIX.replace('_', "\\_"));
      let names = stmt
        .query_map(params![pattern], |row| row.get(0))?
        .collect::<Result<_, _>>()?;
      names
    };

    let tx = inner.db.conn_mut().transaction()?;
    for table in &tables {
      tx.execute(&format!("DELETE FROM {}", table), [])?;
    }
    tx.commit()?;

    debug!(tables = tables.len(), "Cleared all cached resources");
    Ok(())
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|_| StoreError::InvalidTimestamp(s.to_string()))
}
