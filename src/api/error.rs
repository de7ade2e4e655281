use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
  #[error("Transport error: {0}")]
  Transport(String),

  #[error("Request timed out: {0}")]
  Timeout(String),

  #[error("Status {status}: {reason}")]
  Status { status: u16, reason: String },

  #[error("Invalid response: {0}")]
  InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl RemoteError {
  /// Truncate a response body to avoid logging excessive data
  fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
      return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
      end -= 1;
    }
    format!(
      "{}... (truncated, {} total bytes)",
      &body[..end],
      body.len()
    )
  }

  pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
    let reason = status.canonical_reason().unwrap_or("Unknown status");
    let body = Self::truncate_body(body.trim());
    RemoteError::Status {
      status: status.as_u16(),
      reason: if body.is_empty() {
        reason.to_string()
      } else {
        format!("{} - {}", reason, body)
      },
    }
  }
}

impl From<reqwest::Error> for RemoteError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      RemoteError::Timeout(err.to_string())
    } else if err.is_decode() {
      RemoteError::InvalidResponse(err.to_string())
    } else {
      RemoteError::Transport(err.to_string())
    }
  }
}
