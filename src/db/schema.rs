//! Table layout for cached resources.
//!
//! Every resource owns one table named `cache_<resource>`. Singleton tables
//! are keyed by scope so a second insert replaces the first; collection
//! tables use a surrogate autoincrement id that never leaves this crate.

use crate::cache::Cardinality;

/// Prefix shared by every resource table
pub const TABLE_PREFIX: &str = "cache_";

/// Connection-level settings applied on open.
pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;
"#;

pub fn table_name(resource: &str) -> String {
  format!("{}{}", TABLE_PREFIX, resource)
}

/// DDL for one resource table.
pub fn resource_table(resource: &str, cardinality: Cardinality) -> String {
  let table = table_name(resource);
  match cardinality {
    Cardinality::Singleton => format!(
      r#"
CREATE TABLE IF NOT EXISTS {table} (
    scope TEXT PRIMARY KEY NOT NULL,
    payload TEXT NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#
    ),
    Cardinality::Collection => format!(
      r#"
CREATE TABLE IF NOT EXISTS {table} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scope TEXT NOT NULL,
    payload TEXT NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_{table}_scope ON {table}(scope);
"#
    ),
  }
}

/// Insert statement; singletons replace the existing row for the scope.
pub fn insert_row(resource: &str, cardinality: Cardinality) -> String {
  let verb = match cardinality {
    Cardinality::Singleton => "INSERT OR REPLACE",
    Cardinality::Collection => "INSERT",
  };
  format!(
    "{} INTO {} (scope, payload, cached_at) VALUES (?1, ?2, datetime('now'))",
    verb,
    table_name(resource)
  )
}
