//! Session credentials and the providers that supply them.
//!
//! The credential is an opaque token obtained by signing in elsewhere. This
//! module only stores and hands it out; it never talks to the remote API.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Opaque, non-blank session token.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential(String);

impl SessionCredential {
  /// Returns `None` for blank input.
  pub fn new(raw: impl Into<String>) -> Option<Self> {
    let raw = raw.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      None
    } else {
      Some(Self(trimmed.to_string()))
    }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Short stable hash of the token, safe to put in logs.
  pub fn fingerprint(&self) -> String {
    let digest = Sha256::digest(self.0.as_bytes());
    hex::encode(&digest[..6])
  }
}

impl fmt::Debug for SessionCredential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "SessionCredential({})", self.fingerprint())
  }
}

/// Source of the current session credential.
pub trait SessionProvider: Send + Sync {
  /// `None` when nobody is signed in.
  fn current_session(&self) -> Option<SessionCredential>;
}

impl<P: SessionProvider + ?Sized> SessionProvider for Arc<P> {
  fn current_session(&self) -> Option<SessionCredential> {
    (**self).current_session()
  }
}

/// Fixed credential, e.g. from a command-line flag.
#[derive(Debug, Clone, Default)]
pub struct StaticSession(Option<SessionCredential>);

impl StaticSession {
  pub fn new(raw: impl Into<String>) -> Self {
    Self(SessionCredential::new(raw))
  }

  pub fn none() -> Self {
    Self(None)
  }
}

impl SessionProvider for StaticSession {
  fn current_session(&self) -> Option<SessionCredential> {
    self.0.clone()
  }
}

/// Reads the credential from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvSession {
  var: String,
}

impl EnvSession {
  pub fn new(var: impl Into<String>) -> Self {
    Self { var: var.into() }
  }
}

impl SessionProvider for EnvSession {
  fn current_session(&self) -> Option<SessionCredential> {
    std::env::var(&self.var)
      .ok()
      .and_then(SessionCredential::new)
  }
}

/// Persisted sign-in state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
  pub session_id: String,
  pub student_id: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl SessionData {
  pub fn new(session_id: impl Into<String>, student_id: Option<String>) -> Self {
    Self {
      session_id: session_id.into(),
      student_id,
      created_at: Utc::now(),
    }
  }
}

/// Session stored as JSON next to the cache database.
pub struct SessionFile {
  path: PathBuf,
  data: RwLock<Option<SessionData>>,
}

impl SessionFile {
  pub fn new(dir: &Path) -> Self {
    Self::at(dir.join(SESSION_FILE))
  }

  pub fn at(path: PathBuf) -> Self {
    Self {
      path,
      data: RwLock::new(None),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Load session from disk. Returns whether a session was found.
  pub fn load(&self) -> Result<bool> {
    if !self.path.exists() {
      return Ok(false);
    }

    let contents = std::fs::read_to_string(&self.path)
      .map_err(|e| eyre!("Failed to read session file {}: {}", self.path.display(), e))?;
    let data: SessionData = serde_json::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse session file {}: {}", self.path.display(), e))?;

    *self.write_guard()? = Some(data);
    Ok(true)
  }

  pub fn save(&self) -> Result<()> {
    let guard = self
      .data
      .read()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    if let Some(ref data) = *guard {
      if let Some(parent) = self.path.parent() {
        std::fs::create_dir_all(parent)
          .map_err(|e| eyre!("Failed to create session directory: {}", e))?;
      }
      let contents = serde_json::to_string_pretty(data)?;
      std::fs::write(&self.path, contents)
        .map_err(|e| eyre!("Failed to write session file {}: {}", self.path.display(), e))?;
    }
    Ok(())
  }

  pub fn update(&self, data: SessionData) -> Result<()> {
    *self.write_guard()? = Some(data);
    Ok(())
  }

  /// Forget the session in memory and on disk.
  pub fn clear(&self) -> Result<()> {
    *self.write_guard()? = None;
    if self.path.exists() {
      std::fs::remove_file(&self.path)
        .map_err(|e| eyre!("Failed to remove session file {}: {}", self.path.display(), e))?;
    }
    Ok(())
  }

  pub fn data(&self) -> Option<SessionData> {
    self.data.read().ok().and_then(|d| d.clone())
  }

  fn write_guard(&self) -> Result<std::sync::RwLockWriteGuard<'_, Option<SessionData>>> {
    self.data.write().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl SessionProvider for SessionFile {
  fn current_session(&self) -> Option<SessionCredential> {
    self
      .data()
      .and_then(|d| SessionCredential::new(d.session_id))
  }
}

/// Asks each provider in order and returns the first credential found.
#[derive(Default)]
pub struct ChainedSession {
  providers: Vec<Box<dyn SessionProvider>>,
}

impl ChainedSession {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, provider: impl SessionProvider + 'static) -> Self {
    self.providers.push(Box::new(provider));
    self
  }
}

impl SessionProvider for ChainedSession {
  fn current_session(&self) -> Option<SessionCredential> {
    self.providers.iter().find_map(|p| p.current_session())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_blank_credentials_are_rejected() {
    assert!(SessionCredential::new("").is_none());
    assert!(SessionCredential::new("   \t").is_none());
    assert_eq!(
      SessionCredential::new(" tok123 ").map(|c| c.as_str().to_string()),
      Some("tok123".to_string())
    );
  }

  #[test]
  fn test_debug_does_not_leak_token() {
    let cred = SessionCredential::new("super-secret").unwrap();
    let debug = format!("{:?}", cred);
    assert!(!debug.contains("super-secret"));
    assert_eq!(cred.fingerprint().len(), 12);
  }

  #[test]
  fn test_static_session() {
    assert!(StaticSession::none().current_session().is_none());
    assert!(StaticSession::new("  ").current_session().is_none());
    assert_eq!(
      StaticSession::new("abc").current_session(),
      SessionCredential::new("abc")
    );
  }

  #[test]
  fn test_session_file_round_trip_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let file = SessionFile::new(dir.path());
    assert!(!file.load().unwrap());
    assert!(file.current_session().is_none());

    file
      .update(SessionData::new("tok-file", Some("B19DCCN001".into())))
      .unwrap();
    file.save().unwrap();

    let reloaded = SessionFile::new(dir.path());
    assert!(reloaded.load().unwrap());
    assert_eq!(
      reloaded.current_session(),
      SessionCredential::new("tok-file")
    );

    reloaded.clear().unwrap();
    assert!(!reloaded.path().exists());
    assert!(reloaded.current_session().is_none());
  }

  #[test]
  fn test_chain_prefers_first_available() {
    let chain = ChainedSession::new()
      .with(StaticSession::none())
      .with(StaticSession::new("second"))
      .with(StaticSession::new("third"));
    assert_eq!(chain.current_session(), SessionCredential::new("second"));

    assert!(ChainedSession::new().current_session().is_none());
  }

  #[test]
  fn test_corrupt_session_file_can_still_be_cleared() {
    let dir = tempfile::tempdir().unwrap();
    let file = SessionFile::new(dir.path());
    std::fs::write(file.path(), "{not json").unwrap();

    assert!(file.load().is_err());
    assert!(file.current_session().is_none());

    file.clear().unwrap();
    assert!(!file.path().exists());
    assert!(!file.load().unwrap());
  }
}
