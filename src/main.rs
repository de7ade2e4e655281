use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use edusync::api::HttpRemote;
use edusync::commands::{self, ResourceKind};
use edusync::config::Config;
use edusync::logging;
use edusync::session::{
  ChainedSession, EnvSession, SessionData, SessionFile, SessionProvider, StaticSession,
};
use edusync::{Hit, Mode, SqliteStore, StudentRepository};

#[derive(Parser, Debug)]
#[command(name = "edusync")]
#[command(about = "Cache-first client for student academic records")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/edusync/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Session credential to use instead of the stored one
  #[arg(short, long, global = true)]
  session: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show a resource, from cache when available
  Get {
    /// Resource name or alias (e.g. grades, gpa, week)
    resource: String,
    /// Timetable week
    #[arg(short, long)]
    week: Option<u32>,
    /// Skip the cache and fetch from the server
    #[arg(short, long)]
    refresh: bool,
  },
  /// Search cached rows of a resource without going online
  Search { resource: String, query: String },
  /// Refresh every resource
  Sync,
  /// Delete all cached data
  Clear,
  /// Store a session credential
  Login {
    #[arg(long)]
    session_id: String,
    #[arg(long)]
    student_id: Option<String>,
  },
  /// Forget the stored session and clear the cache
  Logout,
  /// List available resources
  Resources,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init_tracing(&config.log)?;

  let session_file = SessionFile::at(config.session_path()?);
  match session_file.load() {
    Ok(_) => {}
    // Logout must still work when the stored session is unreadable
    Err(e) if matches!(args.command, Command::Logout) => {
      warn!(error = %e, "Ignoring unreadable session file");
    }
    Err(e) => return Err(e),
  }

  match args.command {
    Command::Resources => {
      for res in commands::RESOURCES {
        let search = if res.searchable { " (searchable)" } else { "" };
        println!("{:<10} {}{}", res.name, res.description, search);
      }
      Ok(())
    }
    Command::Login {
      session_id,
      student_id,
    } => {
      if session_id.trim().is_empty() {
        return Err(eyre!("Session id must not be blank"));
      }
      session_file.update(SessionData::new(session_id, student_id))?;
      session_file.save()?;
      if let Some(cred) = session_file.current_session() {
        info!(session = %cred.fingerprint(), "Session stored");
      }
      println!("Session saved to {}", session_file.path().display());
      Ok(())
    }
    Command::Logout => {
      session_file.clear()?;
      let repo = open_repository(&config, None, session_file)?;
      repo.clear_all().await?;
      println!("Signed out and cleared local cache");
      Ok(())
    }
    Command::Get {
      resource,
      week,
      refresh,
    } => {
      let kind = resolve(&resource)?;
      let repo = open_repository(&config, args.session, session_file)?;
      let mode = if refresh { Mode::Refresh } else { Mode::Fetch };

      let hit = repo
        .get_json(kind, mode, week)
        .await
        .map_err(|e| eyre!("{} ({:?}): {}", kind.info().name, e.kind(), e))?;
      print_json(&render_hit(kind, hit))
    }
    Command::Search { resource, query } => {
      let kind = resolve(&resource)?;
      let repo = open_repository(&config, args.session, session_file)?;

      let rows = repo
        .search_json(kind, &query)
        .ok_or_else(|| eyre!("{} does not support search", kind.info().name))??;
      print_json(&Value::Array(rows))
    }
    Command::Sync => {
      let repo = open_repository(&config, args.session, session_file)?;
      let report = repo.sync_all().await;

      let summary: Vec<Value> = report
        .results
        .iter()
        .map(|(name, result)| match result {
          Ok(()) => json!({ "resource": name, "ok": true }),
          Err(e) => json!({ "resource": name, "ok": false, "kind": e.kind(), "error": e.to_string() }),
        })
        .collect();
      print_json(&Value::Array(summary))?;

      if report.is_complete() {
        Ok(())
      } else {
        Err(eyre!("Sync finished with failures"))
      }
    }
    Command::Clear => {
      let repo = open_repository(&config, args.session, session_file)?;
      repo.clear_all().await?;
      println!("Local cache cleared");
      Ok(())
    }
  }
}

/// Resolve a resource name, suggesting close matches when it is unknown.
fn resolve(input: &str) -> Result<ResourceKind> {
  if let Some(kind) = commands::lookup(input) {
    return Ok(kind);
  }

  let suggestions: Vec<&str> = commands::get_suggestions(input)
    .iter()
    .take(3)
    .map(|r| r.name)
    .collect();
  if suggestions.is_empty() {
    Err(eyre!("Unknown resource '{}'", input))
  } else {
    Err(eyre!(
      "Unknown resource '{}'. Did you mean: {}?",
      input,
      suggestions.join(", ")
    ))
  }
}

fn open_repository(
  config: &Config,
  session_flag: Option<String>,
  session_file: SessionFile,
) -> Result<StudentRepository> {
  let db_path = config.database_path()?;
  debug!(path = %db_path.display(), "Opening cache database");
  let store = Arc::new(SqliteStore::open(&db_path)?);
  let remote = Arc::new(HttpRemote::new(&config.api)?);

  let flag = match session_flag {
    Some(raw) => StaticSession::new(raw),
    None => StaticSession::none(),
  };
  let session = ChainedSession::new()
    .with(flag)
    .with(EnvSession::new(config.session.env_var.clone()))
    .with(session_file);

  Ok(StudentRepository::new(store, remote, Arc::new(session))?)
}

fn render_hit(kind: ResourceKind, hit: Hit<Value>) -> Value {
  json!({
    "resource": kind.info().name,
    "origin": hit.origin,
    "cachedAt": hit.cached_at,
    "warning": hit.warning.map(|w| w.to_string()),
    "data": hit.data,
  })
}

fn print_json(value: &Value) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
