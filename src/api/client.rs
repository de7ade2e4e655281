//! HTTP implementation of [`RemoteSource`].

use std::time::Duration;

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::{header, Client};
use tracing::debug;
use url::Url;

use super::{ApiEnvelope, Method, RemoteError, RemoteSource, SESSION_PARAM};
use crate::cache::Resource;
use crate::config::ApiConfig;
use crate::session::SessionCredential;

/// Remote source talking to the student records API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpRemote {
  client: Client,
  base_url: Url,
}

impl HttpRemote {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid API base URL '{}': {}", config.base_url, e))?;

    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, base_url })
  }

  /// Full URL for an endpoint path, with the session and resource parameters.
  fn endpoint_url(
    &self,
    path: &str,
    session: &SessionCredential,
    query: &[(&'static str, String)],
  ) -> Result<Url, RemoteError> {
    let base = self.base_url.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let mut url = Url::parse(&format!("{}/{}", base, path))
      .map_err(|e| RemoteError::Transport(format!("invalid endpoint URL: {}", e)))?;

    {
      let mut pairs = url.query_pairs_mut();
      pairs.append_pair(SESSION_PARAM, session.as_str());
      for (key, value) in query {
        pairs.append_pair(key, value);
      }
    }

    Ok(url)
  }
}

#[async_trait]
impl RemoteSource for HttpRemote {
  async fn call<R: Resource>(
    &self,
    session: &SessionCredential,
    params: &R::Params,
  ) -> Result<ApiEnvelope<R::Wire>, RemoteError> {
    let endpoint = R::ENDPOINT;
    let url = self.endpoint_url(endpoint.path, session, &R::query(params))?;

    debug!(
      resource = R::NAME,
      path = endpoint.path,
      session = %session.fingerprint(),
      "Calling remote"
    );

    let request = match endpoint.method {
      Method::Get => self.client.get(url),
      Method::Post => self.client.post(url),
    };

    let response = request
      .header(header::ACCEPT, "application/json")
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(RemoteError::from_status(status, &body));
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
      .map_err(|e| RemoteError::InvalidResponse(format!("{} payload: {}", R::NAME, e)))
  }
}
