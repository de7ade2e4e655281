//! Error taxonomy returned by every cache controller operation.

use serde::Serialize;
use thiserror::Error;

use crate::api::RemoteError;
use crate::cache::StoreError;

/// Coarse category of a failed fetch, for callers that branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
  NoSession,
  Network,
  Http,
  EmptyPayload,
  Decode,
  Storage,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
  /// Blank or missing session credential. Nothing was contacted.
  #[error("Not signed in - no session credential available")]
  NoSession,

  #[error("Network error: {0}")]
  Network(String),

  #[error("HTTP {status}: {reason}")]
  Http { status: u16, reason: String },

  /// The remote answered successfully but carried no usable data.
  #[error("Empty response: {0}")]
  EmptyPayload(String),

  #[error("Invalid response: {0}")]
  Decode(String),

  #[error("Local storage error: {0}")]
  Storage(String),
}

impl FetchError {
  pub fn kind(&self) -> FailureKind {
    match self {
      FetchError::NoSession => FailureKind::NoSession,
      FetchError::Network(_) => FailureKind::Network,
      FetchError::Http { .. } => FailureKind::Http,
      FetchError::EmptyPayload(_) => FailureKind::EmptyPayload,
      FetchError::Decode(_) => FailureKind::Decode,
      FetchError::Storage(_) => FailureKind::Storage,
    }
  }
}

impl From<RemoteError> for FetchError {
  fn from(err: RemoteError) -> Self {
    match err {
      RemoteError::Transport(msg) => FetchError::Network(msg),
      RemoteError::Timeout(msg) => FetchError::Network(format!("request timed out: {}", msg)),
      RemoteError::Status { status, reason } => FetchError::Http { status, reason },
      RemoteError::InvalidResponse(msg) => FetchError::Decode(msg),
    }
  }
}

impl From<StoreError> for FetchError {
  fn from(err: StoreError) -> Self {
    FetchError::Storage(err.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_remote_errors_map_to_kinds() {
    let cases = [
      (RemoteError::Transport("refused".into()), FailureKind::Network),
      (RemoteError::Timeout("30s".into()), FailureKind::Network),
      (
        RemoteError::Status {
          status: 503,
          reason: "Service Unavailable".into(),
        },
        FailureKind::Http,
      ),
      (RemoteError::InvalidResponse("eof".into()), FailureKind::Decode),
    ];

    for (remote, kind) in cases {
      assert_eq!(FetchError::from(remote).kind(), kind);
    }
  }

  #[test]
  fn test_http_error_keeps_status_and_reason() {
    let err = FetchError::from(RemoteError::Status {
      status: 404,
      reason: "Not Found".into(),
    });
    assert_eq!(err.to_string(), "HTTP 404: Not Found");
  }

  #[test]
  fn test_store_error_is_storage_kind() {
    let err = FetchError::from(StoreError::LockPoisoned("boom".into()));
    assert_eq!(err.kind(), FailureKind::Storage);
    assert!(err.to_string().contains("boom"));
  }
}
