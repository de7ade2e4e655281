//! Serde-deserializable envelope shared by every endpoint.

use serde::Deserialize;

/// `{ "success": bool, "data": <payload>, "message": "..." }`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
  #[serde(default)]
  pub success: bool,
  pub data: Option<T>,
  #[serde(default, alias = "msg")]
  pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
  /// The payload, if the remote reported success and sent one.
  pub fn into_payload(self) -> Result<T, String> {
    if !self.success {
      return Err(
        self
          .message
          .unwrap_or_else(|| "remote reported failure".to_string()),
      );
    }
    self
      .data
      .ok_or_else(|| "response carried no data".to_string())
  }
}
