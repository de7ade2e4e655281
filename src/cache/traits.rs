//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::api::Endpoint;
use crate::error::FetchError;

/// How many rows a resource occupies per scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
  /// At most one row (e.g. the student profile)
  Singleton,
  /// Zero or more rows (e.g. the grade list)
  Collection,
}

/// Binding between one remotely-sourced record type and its local rows.
///
/// Implementors are zero-sized markers; all behaviour is associated.
pub trait Resource: Send + Sync + 'static {
  /// What callers receive
  type Data: Clone + Send + Sync + 'static;
  /// One persisted row
  type Row: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;
  /// Payload under the envelope's `data` field
  type Wire: DeserializeOwned + Send + 'static;
  /// Request parameters, `()` when the endpoint takes none
  type Params: Send + Sync;

  /// Stable identifier, also used to name the storage table.
  const NAME: &'static str;
  const CARDINALITY: Cardinality;
  const ENDPOINT: Endpoint;

  /// Extra query parameters for the remote call.
  fn query(_params: &Self::Params) -> Vec<(&'static str, String)> {
    Vec::new()
  }

  /// Storage scope inside the resource table.
  fn scope(_params: &Self::Params) -> String {
    String::new()
  }

  /// Convert the wire payload. `None` means semantically empty.
  fn decode(wire: Self::Wire) -> Option<Self::Data>;

  fn to_rows(data: &Self::Data) -> Vec<Self::Row>;

  /// Rebuild data from stored rows. `None` when there is nothing cached.
  fn from_rows(rows: Vec<Self::Row>) -> Option<Self::Data>;
}

/// Collection resources that can be searched offline.
pub trait Searchable: Resource {
  /// `needle` is already lowercased and non-empty.
  fn matches(row: &Self::Row, needle: &str) -> bool;
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
  /// Served from the local store
  Cache,
  /// Freshly fetched from the remote source
  Remote,
}

/// Successful result of a controller operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<T> {
  pub data: T,
  pub origin: Origin,
  /// When the rows were written (cache hits only)
  pub cached_at: Option<DateTime<Utc>>,
  /// Set when the data was fetched but could not be cached
  pub warning: Option<FetchError>,
}

impl<T> Hit<T> {
  pub fn from_cache(data: T, cached_at: Option<DateTime<Utc>>) -> Self {
    Self {
      data,
      origin: Origin::Cache,
      cached_at,
      warning: None,
    }
  }

  pub fn from_remote(data: T) -> Self {
    Self {
      data,
      origin: Origin::Remote,
      cached_at: None,
      warning: None,
    }
  }

  pub fn with_warning(mut self, warning: Option<FetchError>) -> Self {
    self.warning = warning;
    self
  }

  pub fn is_cached(&self) -> bool {
    self.origin == Origin::Cache
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Hit<U> {
    Hit {
      data: f(self.data),
      origin: self.origin,
      cached_at: self.cached_at,
      warning: self.warning,
    }
  }
}

/// Uniform return type of every controller operation.
pub type FetchOutcome<T> = Result<Hit<T>, FetchError>;
