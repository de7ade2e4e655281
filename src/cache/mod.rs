//! Cache-first synchronization between a remote source and a local store.
//!
//! This module provides one generic mechanism used by every resource type:
//! - Serves from the local store whenever it holds rows for a resource
//! - Fetches and persists on a miss, in a single transaction
//! - Explicit refresh that replaces the stored rows only after a successful fetch
//! - Offline search over cached rows

mod controller;
mod storage;
mod traits;

pub use controller::ResourceCacheController;
pub use storage::{CachedRows, LocalStore, SqliteStore, StoreError};
pub use traits::{Cardinality, FetchOutcome, Hit, Origin, Resource, Searchable};
