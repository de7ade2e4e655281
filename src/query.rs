//! Loading-state tracker around one controller operation.
//!
//! A screen owns a `Query<T>` per resource it shows. The query runs the
//! operation on a spawned task and exposes Idle / Loading / Success / Error
//! so the screen can render a spinner, the data, or an error with a retry
//! button. Retrying is always manual.
//!
//! # Example
//!
//! ```ignore
//! let repo = Arc::clone(&repository);
//! let mut grades = Query::new(move |mode| {
//!     let repo = Arc::clone(&repo);
//!     async move {
//!         match mode {
//!             Mode::Fetch => repo.fetch_grades().await,
//!             Mode::Refresh => repo.refresh_grades().await,
//!         }
//!     }
//! });
//!
//! grades.fetch();
//!
//! // In event loop tick
//! if grades.poll() {
//!     // State changed, re-render
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::cache::{FetchOutcome, Hit};
use crate::error::FetchError;
use crate::student::Mode;

/// The state of a query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently running
  Loading,
  /// Query completed successfully
  Success(Hit<T>),
  /// Query failed
  Error(FetchError),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(hit) => Some(&hit.data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&FetchError> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = FetchOutcome<T>> + Send>>;

type OperationFn<T> = Box<dyn Fn(Mode) -> BoxFuture<T> + Send + Sync>;

struct InFlight<T> {
  mode: Mode,
  receiver: oneshot::Receiver<FetchOutcome<T>>,
  task: JoinHandle<()>,
}

/// Async query with state management.
///
/// Dropping the query (or starting a new run) aborts the in-flight task;
/// the cache controller's writes are transactional, so an abort never
/// leaves partially cached rows behind.
pub struct Query<T> {
  state: QueryState<T>,
  operation: OperationFn<T>,
  in_flight: Option<InFlight<T>>,
  last_mode: Mode,
}

impl<T: Send + 'static> Query<T> {
  /// The operation receives the mode so one closure serves both
  /// `fetch` and `refresh`.
  pub fn new<F, Fut>(operation: F) -> Self
  where
    F: Fn(Mode) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FetchOutcome<T>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      operation: Box::new(move |mode| Box::pin(operation(mode))),
      in_flight: None,
      last_mode: Mode::Fetch,
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_success(&self) -> bool {
    self.state.is_success()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  pub fn error(&self) -> Option<&FetchError> {
    self.state.error()
  }

  /// Start a cache-first fetch. No-op while loading.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start(Mode::Fetch);
  }

  /// Start a refresh, cancelling whatever is in flight.
  pub fn refresh(&mut self) {
    self.cancel();
    self.start(Mode::Refresh);
  }

  /// Re-run the last operation after an error.
  pub fn retry(&mut self) {
    if self.state.is_error() {
      self.start(self.last_mode);
    }
  }

  /// Abort the in-flight task, if any. A loading query returns to Idle.
  pub fn cancel(&mut self) {
    if let Some(in_flight) = self.in_flight.take() {
      in_flight.task.abort();
      if self.state.is_loading() {
        self.state = QueryState::Idle;
      }
    }
  }

  /// Poll for results from a pending run.
  ///
  /// Returns `true` if the state changed. Call this in the event loop tick.
  pub fn poll(&mut self) -> bool {
    let in_flight = match &mut self.in_flight {
      Some(f) => f,
      None => return false,
    };

    let outcome = match in_flight.receiver.try_recv() {
      Ok(outcome) => outcome,
      Err(oneshot::error::TryRecvError::Empty) => return false,
      Err(oneshot::error::TryRecvError::Closed) => {
        Err(FetchError::Network("operation was cancelled".to_string()))
      }
    };

    self.last_mode = in_flight.mode;
    self.in_flight = None;
    self.state = match outcome {
      Ok(hit) => QueryState::Success(hit),
      Err(e) => QueryState::Error(e),
    };
    true
  }

  /// Wait for the pending run to finish. Returns `false` if nothing was running.
  pub async fn settle(&mut self) -> bool {
    let in_flight = match self.in_flight.take() {
      Some(f) => f,
      None => return false,
    };

    let outcome = in_flight
      .receiver
      .await
      .unwrap_or_else(|_| Err(FetchError::Network("operation was cancelled".to_string())));

    self.last_mode = in_flight.mode;
    self.state = match outcome {
      Ok(hit) => QueryState::Success(hit),
      Err(e) => QueryState::Error(e),
    };
    true
  }

  fn start(&mut self, mode: Mode) {
    let (tx, rx) = oneshot::channel();
    let future = (self.operation)(mode);
    let task = tokio::spawn(async move {
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(future.await);
    });

    self.last_mode = mode;
    self.state = QueryState::Loading;
    self.in_flight = Some(InFlight {
      mode,
      receiver: rx,
      task,
    });
  }
}

impl<T> Drop for Query<T> {
  fn drop(&mut self) {
    if let Some(in_flight) = self.in_flight.take() {
      in_flight.task.abort();
    }
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("in_flight", &self.in_flight.is_some())
      .field("last_mode", &self.last_mode)
      .finish_non_exhaustive()
  }
}
