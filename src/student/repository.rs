//! Student repository: one cache controller per resource behind a single API.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{HttpRemote, RemoteSource};
use crate::cache::{FetchOutcome, Hit, LocalStore, ResourceCacheController, SqliteStore};
use crate::commands::ResourceKind;
use crate::error::FetchError;
use crate::session::SessionProvider;

use super::resources::{
  AccountResource, AggregateScoreResource, ExamScheduleResource, FeedbackResource,
  GradesResource, ProfileResource, TrainingScoreResource, WeekScheduleResource,
};
use super::types::{
  Account, AggregateScore, CourseResult, ExamEntry, Feedback, StudentProfile, TrainingScore,
  WeekSchedule,
};

/// Whether to serve from cache when possible or force a network round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Fetch,
  Refresh,
}

/// Per-resource outcome of [`StudentRepository::sync_all`].
#[derive(Debug, Default)]
pub struct SyncReport {
  pub results: Vec<(&'static str, Result<(), FetchError>)>,
}

impl SyncReport {
  pub fn failures(&self) -> impl Iterator<Item = (&'static str, &FetchError)> {
    self
      .results
      .iter()
      .filter_map(|(name, r)| r.as_ref().err().map(|e| (*name, e)))
  }

  pub fn is_complete(&self) -> bool {
    self.failures().next().is_none()
  }
}

/// Entry point for callers: every record type with fetch/refresh (and
/// search for collections), using the session from the provider.
pub struct StudentRepository<S: LocalStore = SqliteStore, C: RemoteSource = HttpRemote> {
  session: Arc<dyn SessionProvider>,
  store: Arc<S>,
  profile: ResourceCacheController<ProfileResource, S, C>,
  grades: ResourceCacheController<GradesResource, S, C>,
  aggregate_score: ResourceCacheController<AggregateScoreResource, S, C>,
  training_scores: ResourceCacheController<TrainingScoreResource, S, C>,
  exam_schedule: ResourceCacheController<ExamScheduleResource, S, C>,
  week_schedule: ResourceCacheController<WeekScheduleResource, S, C>,
  feedback: ResourceCacheController<FeedbackResource, S, C>,
  account: ResourceCacheController<AccountResource, S, C>,
}

impl<S: LocalStore, C: RemoteSource> StudentRepository<S, C> {
  /// Prepares storage for every resource.
  pub fn new(
    store: Arc<S>,
    remote: Arc<C>,
    session: Arc<dyn SessionProvider>,
  ) -> Result<Self, FetchError> {
    store.prepare::<ProfileResource>()?;
    store.prepare::<GradesResource>()?;
    store.prepare::<AggregateScoreResource>()?;
    store.prepare::<TrainingScoreResource>()?;
    store.prepare::<ExamScheduleResource>()?;
    store.prepare::<WeekScheduleResource>()?;
    store.prepare::<FeedbackResource>()?;
    store.prepare::<AccountResource>()?;

    Ok(Self {
      session,
      profile: ResourceCacheController::new(Arc::clone(&store), Arc::clone(&remote)),
      grades: ResourceCacheController::new(Arc::clone(&store), Arc::clone(&remote)),
      aggregate_score: ResourceCacheController::new(Arc::clone(&store), Arc::clone(&remote)),
      training_scores: ResourceCacheController::new(Arc::clone(&store), Arc::clone(&remote)),
      exam_schedule: ResourceCacheController::new(Arc::clone(&store), Arc::clone(&remote)),
      week_schedule: ResourceCacheController::new(Arc::clone(&store), Arc::clone(&remote)),
      feedback: ResourceCacheController::new(Arc::clone(&store), Arc::clone(&remote)),
      account: ResourceCacheController::new(Arc::clone(&store), remote),
      store,
    })
  }

  /// Current credential, or an empty string which controllers reject.
  fn session(&self) -> String {
    self
      .session
      .current_session()
      .map(|s| s.as_str().to_string())
      .unwrap_or_default()
  }

  // ===== Profile =====

  pub async fn fetch_profile(&self) -> FetchOutcome<StudentProfile> {
    self.profile.fetch(&self.session(), &()).await
  }

  pub async fn refresh_profile(&self) -> FetchOutcome<StudentProfile> {
    self.profile.refresh(&self.session(), &()).await
  }

  // ===== Grades =====

  pub async fn fetch_grades(&self) -> FetchOutcome<Vec<CourseResult>> {
    self.grades.fetch(&self.session(), &()).await
  }

  pub async fn refresh_grades(&self) -> FetchOutcome<Vec<CourseResult>> {
    self.grades.refresh(&self.session(), &()).await
  }

  pub fn search_grades(&self, query: &str) -> Result<Vec<CourseResult>, FetchError> {
    self.grades.search(&(), query)
  }

  // ===== Aggregate score =====

  pub async fn fetch_aggregate_score(&self) -> FetchOutcome<AggregateScore> {
    self.aggregate_score.fetch(&self.session(), &()).await
  }

  pub async fn refresh_aggregate_score(&self) -> FetchOutcome<AggregateScore> {
    self.aggregate_score.refresh(&self.session(), &()).await
  }

  // ===== Training scores =====

  pub async fn fetch_training_scores(&self) -> FetchOutcome<Vec<TrainingScore>> {
    self.training_scores.fetch(&self.session(), &()).await
  }

  pub async fn refresh_training_scores(&self) -> FetchOutcome<Vec<TrainingScore>> {
    self.training_scores.refresh(&self.session(), &()).await
  }

  pub fn search_training_scores(&self, query: &str) -> Result<Vec<TrainingScore>, FetchError> {
    self.training_scores.search(&(), query)
  }

  // ===== Exam schedule =====

  pub async fn fetch_exam_schedule(&self) -> FetchOutcome<Vec<ExamEntry>> {
    self.exam_schedule.fetch(&self.session(), &()).await
  }

  pub async fn refresh_exam_schedule(&self) -> FetchOutcome<Vec<ExamEntry>> {
    self.exam_schedule.refresh(&self.session(), &()).await
  }

  pub fn search_exam_schedule(&self, query: &str) -> Result<Vec<ExamEntry>, FetchError> {
    self.exam_schedule.search(&(), query)
  }

  // ===== Week schedule =====

  pub async fn fetch_week_schedule(&self, week: u32) -> FetchOutcome<WeekSchedule> {
    self.week_schedule.fetch(&self.session(), &week).await
  }

  pub async fn refresh_week_schedule(&self, week: u32) -> FetchOutcome<WeekSchedule> {
    self.week_schedule.refresh(&self.session(), &week).await
  }

  // ===== Feedback =====

  pub async fn fetch_feedback(&self) -> FetchOutcome<Vec<Feedback>> {
    self.feedback.fetch(&self.session(), &()).await
  }

  pub async fn refresh_feedback(&self) -> FetchOutcome<Vec<Feedback>> {
    self.feedback.refresh(&self.session(), &()).await
  }

  pub fn search_feedback(&self, query: &str) -> Result<Vec<Feedback>, FetchError> {
    self.feedback.search(&(), query)
  }

  // ===== Account =====

  pub async fn fetch_account(&self) -> FetchOutcome<Account> {
    self.account.fetch(&self.session(), &()).await
  }

  pub async fn refresh_account(&self) -> FetchOutcome<Account> {
    self.account.refresh(&self.session(), &()).await
  }

  // ===== Whole cache =====

  /// Delete every cached row of every resource (logout, account switch).
  ///
  /// Waits for in-flight operations, so a refresh started before the clear
  /// cannot write its rows back afterwards. Gates are taken in field order;
  /// every other operation holds at most one.
  pub async fn clear_all(&self) -> Result<(), FetchError> {
    let _profile = self.profile.exclusive().await;
    let _grades = self.grades.exclusive().await;
    let _aggregate = self.aggregate_score.exclusive().await;
    let _training = self.training_scores.exclusive().await;
    let _exams = self.exam_schedule.exclusive().await;
    let _week = self.week_schedule.exclusive().await;
    let _feedback = self.feedback.exclusive().await;
    let _account = self.account.exclusive().await;

    self.store.clear_all()?;
    info!("Cleared local cache");
    Ok(())
  }

  /// Refresh every resource that takes no parameters, concurrently.
  ///
  /// Data that was fetched but could not be cached counts as a failure here,
  /// since filling the cache is the point of a sync.
  pub async fn sync_all(&self) -> SyncReport {
    fn settle<T>(outcome: FetchOutcome<T>) -> Result<(), FetchError> {
      match outcome?.warning {
        Some(warning) => Err(warning),
        None => Ok(()),
      }
    }

    let (profile, grades, aggregate, training, exams, feedback, account) = futures::join!(
      self.refresh_profile(),
      self.refresh_grades(),
      self.refresh_aggregate_score(),
      self.refresh_training_scores(),
      self.refresh_exam_schedule(),
      self.refresh_feedback(),
      self.refresh_account(),
    );

    let report = SyncReport {
      results: vec![
        ("profile", settle(profile)),
        ("grades", settle(grades)),
        ("gpa", settle(aggregate)),
        ("training", settle(training)),
        ("exams", settle(exams)),
        ("feedback", settle(feedback)),
        ("account", settle(account)),
      ],
    };

    for (name, err) in report.failures() {
      warn!(resource = name, error = %err, "Sync failed");
    }
    report
  }

  // ===== Untyped access for the CLI =====

  /// Fetch or refresh any resource and return it as JSON.
  ///
  /// `week` selects the timetable week (default 1) and is ignored by
  /// every other resource.
  pub async fn get_json(
    &self,
    kind: ResourceKind,
    mode: Mode,
    week: Option<u32>,
  ) -> FetchOutcome<Value> {
    let refresh = mode == Mode::Refresh;
    match kind {
      ResourceKind::Profile => to_json(if refresh {
        self.refresh_profile().await
      } else {
        self.fetch_profile().await
      }),
      ResourceKind::Grades => to_json(if refresh {
        self.refresh_grades().await
      } else {
        self.fetch_grades().await
      }),
      ResourceKind::AggregateScore => to_json(if refresh {
        self.refresh_aggregate_score().await
      } else {
        self.fetch_aggregate_score().await
      }),
      ResourceKind::TrainingScores => to_json(if refresh {
        self.refresh_training_scores().await
      } else {
        self.fetch_training_scores().await
      }),
      ResourceKind::ExamSchedule => to_json(if refresh {
        self.refresh_exam_schedule().await
      } else {
        self.fetch_exam_schedule().await
      }),
      ResourceKind::WeekSchedule => {
        let week = week.unwrap_or(1);
        to_json(if refresh {
          self.refresh_week_schedule(week).await
        } else {
          self.fetch_week_schedule(week).await
        })
      }
      ResourceKind::Feedback => to_json(if refresh {
        self.refresh_feedback().await
      } else {
        self.fetch_feedback().await
      }),
      ResourceKind::Account => to_json(if refresh {
        self.refresh_account().await
      } else {
        self.fetch_account().await
      }),
    }
  }

  /// Offline search as JSON. `None` when the resource is not searchable.
  pub fn search_json(
    &self,
    kind: ResourceKind,
    query: &str,
  ) -> Option<Result<Vec<Value>, FetchError>> {
    let rows = match kind {
      ResourceKind::Grades => rows_to_json(self.search_grades(query)),
      ResourceKind::TrainingScores => rows_to_json(self.search_training_scores(query)),
      ResourceKind::ExamSchedule => rows_to_json(self.search_exam_schedule(query)),
      ResourceKind::Feedback => rows_to_json(self.search_feedback(query)),
      _ => return None,
    };
    Some(rows)
  }
}

fn to_json<T: Serialize>(outcome: FetchOutcome<T>) -> FetchOutcome<Value> {
  let hit = outcome?;
  let value = serde_json::to_value(&hit.data).map_err(|e| FetchError::Decode(e.to_string()))?;
  Ok(Hit::map(hit, |_| value))
}

fn rows_to_json<T: Serialize>(rows: Result<Vec<T>, FetchError>) -> Result<Vec<Value>, FetchError> {
  rows?
    .iter()
    .map(|row| serde_json::to_value(row).map_err(|e| FetchError::Decode(e.to_string())))
    .collect()
}
