//! Cache-first controller shared by every resource type.

use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::storage::LocalStore;
use super::traits::{FetchOutcome, Hit, Resource, Searchable};
use crate::api::RemoteSource;
use crate::error::FetchError;
use crate::session::SessionCredential;

/// Orchestrates the local store and the remote source for one resource.
///
/// `fetch` serves from the store when it holds rows for the requested
/// scope and only goes to the network on a miss. `refresh` always goes to
/// the network and replaces the stored rows only after a successful call,
/// so a failed refresh never destroys good cached data.
///
/// Operations on the same controller are serialized by an async gate, so
/// a `fetch` never observes the gap between a concurrent refresh's delete
/// and insert. Writes run inside one store transaction, which also makes
/// them atomic with respect to the future being dropped.
pub struct ResourceCacheController<R: Resource, S: LocalStore, C: RemoteSource> {
  store: Arc<S>,
  remote: Arc<C>,
  gate: Arc<Mutex<()>>,
  _resource: PhantomData<fn() -> R>,
}

impl<R: Resource, S: LocalStore, C: RemoteSource> ResourceCacheController<R, S, C> {
  pub fn new(store: Arc<S>, remote: Arc<C>) -> Self {
    Self {
      store,
      remote,
      gate: Arc::new(Mutex::new(())),
      _resource: PhantomData,
    }
  }

  /// Cache-first read.
  ///
  /// 1. Blank session - fail without touching store or network
  /// 2. Rows cached for this scope - return them, no network call
  /// 3. Otherwise fetch, persist, and return the fresh data
  pub async fn fetch(&self, session: &str, params: &R::Params) -> FetchOutcome<R::Data> {
    let session = SessionCredential::new(session).ok_or(FetchError::NoSession)?;
    let scope = R::scope(params);
    let _guard = self.gate.lock().await;

    let cached = self.store.read_all::<R>(&scope)?;
    let cached_at = cached.cached_at;
    if let Some(data) = R::from_rows(cached.rows) {
      debug!(resource = R::NAME, scope = %scope, "Cache hit");
      return Ok(Hit::from_cache(data, cached_at));
    }

    debug!(resource = R::NAME, scope = %scope, "Cache miss, fetching from remote");
    let data = self.pull(&session, params).await?;
    let warning = self.persist(&scope, &data);
    Ok(Hit::from_remote(data).with_warning(warning))
  }

  /// Unconditional re-fetch. The store is only touched after the remote
  /// call succeeded.
  pub async fn refresh(&self, session: &str, params: &R::Params) -> FetchOutcome<R::Data> {
    let session = SessionCredential::new(session).ok_or(FetchError::NoSession)?;
    let scope = R::scope(params);
    let _guard = self.gate.lock().await;

    let data = match self.pull(&session, params).await {
      Ok(data) => data,
      Err(e) => {
        info!(resource = R::NAME, scope = %scope, error = %e, "Refresh failed, keeping cached rows");
        return Err(e);
      }
    };

    let warning = self.persist(&scope, &data);
    info!(resource = R::NAME, scope = %scope, "Refreshed from remote");
    Ok(Hit::from_remote(data).with_warning(warning))
  }

  /// Whatever is cached for the scope, without touching the network.
  pub fn cached(&self, params: &R::Params) -> Result<Option<R::Data>, FetchError> {
    let rows = self.store.read_all::<R>(&R::scope(params))?.rows;
    Ok(R::from_rows(rows))
  }

  /// Drop the cached rows of one scope so the next `fetch` goes remote.
  pub async fn invalidate(&self, params: &R::Params) -> Result<(), FetchError> {
    let _guard = self.gate.lock().await;
    self.store.delete_all::<R>(&R::scope(params))?;
    Ok(())
  }

  /// Hold the gate so no fetch or refresh of this resource runs meanwhile.
  pub async fn exclusive(&self) -> MutexGuard<'_, ()> {
    self.gate.lock().await
  }

  /// One remote call, with the envelope and payload checks applied.
  async fn pull(&self, session: &SessionCredential, params: &R::Params) -> Result<R::Data, FetchError> {
    let envelope = self.remote.call::<R>(session, params).await?;
    let wire = envelope.into_payload().map_err(FetchError::EmptyPayload)?;
    R::decode(wire).ok_or_else(|| FetchError::EmptyPayload(format!("{} payload was empty", R::NAME)))
  }

  /// Write fetched data back. A failure here does not cost the caller the
  /// data, so it is returned as a warning instead of an error.
  fn persist(&self, scope: &str, data: &R::Data) -> Option<FetchError> {
    let rows = R::to_rows(data);
    match self.store.replace_all::<R>(scope, &rows) {
      Ok(()) => {
        debug!(resource = R::NAME, scope, rows = rows.len(), "Cached remote data");
        None
      }
      Err(e) => {
        warn!(resource = R::NAME, scope, error = %e, "Fetched data could not be cached");
        Some(e.into())
      }
    }
  }
}

impl<R: Searchable, S: LocalStore, C: RemoteSource> ResourceCacheController<R, S, C> {
  /// Case-insensitive search over cached rows only. A blank query returns
  /// every cached row.
  pub fn search(&self, params: &R::Params, query: &str) -> Result<Vec<R::Row>, FetchError> {
    let rows = self.store.read_all::<R>(&R::scope(params))?.rows;
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
      return Ok(rows);
    }
    Ok(rows.into_iter().filter(|row| R::matches(row, &needle)).collect())
  }
}

impl<R: Resource, S: LocalStore, C: RemoteSource> Clone for ResourceCacheController<R, S, C> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      remote: Arc::clone(&self.remote),
      gate: Arc::clone(&self.gate),
      _resource: PhantomData,
    }
  }
}
