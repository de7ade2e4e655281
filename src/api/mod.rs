//! Remote source for student records.
//!
//! Every endpoint takes the session credential as a `sessionId` query
//! parameter and answers with an [`ApiEnvelope`]. The adapters here never
//! retry; a failed call is reported once and the caller decides.

mod api_types;
mod client;
mod error;

pub use api_types::ApiEnvelope;
pub use client::HttpRemote;
pub use error::RemoteError;

use async_trait::async_trait;

use crate::cache::Resource;
use crate::session::SessionCredential;

/// Name of the query parameter carrying the session credential.
pub const SESSION_PARAM: &str = "sessionId";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Post,
}

/// HTTP method and path of one resource endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
  pub method: Method,
  pub path: &'static str,
}

impl Endpoint {
  pub const fn get(path: &'static str) -> Self {
    Self {
      method: Method::Get,
      path,
    }
  }

  pub const fn post(path: &'static str) -> Self {
    Self {
      method: Method::Post,
      path,
    }
  }
}

/// Authoritative source of resource payloads.
#[async_trait]
pub trait RemoteSource: Send + Sync {
  /// Call the endpoint of `R` once.
  async fn call<R: Resource>(
    &self,
    session: &SessionCredential,
    params: &R::Params,
  ) -> Result<ApiEnvelope<R::Wire>, RemoteError>;
}
