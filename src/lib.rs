//! edusync - cache-first sync engine for student academic records.
//!
//! Every record type (profile, grades, timetable, ...) is served from a
//! local SQLite cache when possible and fetched from the records API on a
//! miss. Explicit refreshes replace cached rows only after a successful
//! fetch, so the last good data stays readable offline.

pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
pub mod session;
pub mod student;

pub use cache::{FetchOutcome, Hit, Origin, ResourceCacheController, SqliteStore};
pub use error::{FailureKind, FetchError};
pub use student::{Mode, StudentRepository};
