use std::sync::Arc;
use std::time::Duration;

use edusync::api::HttpRemote;
use edusync::cache::Resource;
use edusync::config::ApiConfig;
use edusync::session::StaticSession;
use edusync::student::{
  AccountResource, AggregateScoreResource, ExamScheduleResource, FeedbackResource,
  GradesResource, ProfileResource, TrainingScoreResource, WeekScheduleResource,
};
use edusync::{FailureKind, Origin, SqliteStore, StudentRepository};
use httpmock::prelude::*;
use serde_json::{json, Value};

fn repository(
  server: &MockServer,
  store: &Arc<SqliteStore>,
  session: Option<&str>,
) -> StudentRepository {
  let remote = HttpRemote::new(&ApiConfig {
    base_url: server.base_url(),
    timeout_secs: 5,
  })
  .unwrap();
  let session = match session {
    Some(token) => StaticSession::new(token),
    None => StaticSession::none(),
  };
  StudentRepository::new(Arc::clone(store), Arc::new(remote), Arc::new(session)).unwrap()
}

fn store() -> Arc<SqliteStore> {
  Arc::new(SqliteStore::in_memory().unwrap())
}

fn ok(data: Value) -> Value {
  json!({ "success": true, "data": data })
}

fn grades_payload() -> Value {
  json!([
    { "courseCode": "INT1340", "courseName": "Computer Networks", "credits": 3, "semester": "HK1 2025-2026", "score10": "8.1", "score4": "3.5", "letterGrade": "B+" },
    { "courseCode": "BAS1203", "courseName": "Calculus 2", "credits": 2, "semester": "HK1 2025-2026", "score10": "6.0", "score4": "2.0", "letterGrade": "C" }
  ])
}

#[tokio::test]
async fn test_second_fetch_is_served_from_cache() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when
        .method(GET)
        .path(AggregateScoreResource::ENDPOINT.path)
        .query_param("sessionId", "tok123");
      then.status(200).json_body(ok(json!({
        "gpa10": "7.9", "gpa4": "3.2", "totalCredits": 98, "classification": "Good"
      })));
    })
    .await;

  let repo = repository(&server, &store(), Some("tok123"));

  let first = repo.fetch_aggregate_score().await.unwrap();
  assert_eq!(first.origin, Origin::Remote);
  assert_eq!(first.data.gpa4, "3.2");
  assert!(first.warning.is_none());

  let second = repo.fetch_aggregate_score().await.unwrap();
  assert_eq!(second.origin, Origin::Cache);
  assert_eq!(second.data, first.data);
  assert!(second.cached_at.is_some());

  mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_refresh_replaces_cached_rows() {
  let server = MockServer::start_async().await;
  server
    .mock_async(|when, then| {
      when
        .path(GradesResource::ENDPOINT.path)
        .query_param("sessionId", "tok-a");
      then.status(200).json_body(ok(grades_payload()));
    })
    .await;
  server
    .mock_async(|when, then| {
      when
        .path(GradesResource::ENDPOINT.path)
        .query_param("sessionId", "tok-b");
      then.status(200).json_body(ok(json!([
        { "courseCode": "INT1448", "courseName": "Software Engineering", "credits": 3, "semester": "HK2 2025-2026" }
      ])));
    })
    .await;

  let store = store();
  let before = repository(&server, &store, Some("tok-a"))
    .fetch_grades()
    .await
    .unwrap();
  assert_eq!(before.data.len(), 2);

  let repo = repository(&server, &store, Some("tok-b"));
  let refreshed = repo.refresh_grades().await.unwrap();
  assert_eq!(refreshed.origin, Origin::Remote);
  assert_eq!(refreshed.data.len(), 1);

  let cached = repo.fetch_grades().await.unwrap();
  assert_eq!(cached.origin, Origin::Cache);
  assert_eq!(cached.data, refreshed.data);
}

#[tokio::test]
async fn test_failed_refresh_keeps_cache() {
  let server = MockServer::start_async().await;
  server
    .mock_async(|when, then| {
      when
        .path(GradesResource::ENDPOINT.path)
        .query_param("sessionId", "tok-good");
      then.status(200).json_body(ok(grades_payload()));
    })
    .await;
  server
    .mock_async(|when, then| {
      when
        .path(GradesResource::ENDPOINT.path)
        .query_param("sessionId", "tok-down");
      then.status(503).body("maintenance");
    })
    .await;

  let store = store();
  repository(&server, &store, Some("tok-good"))
    .fetch_grades()
    .await
    .unwrap();

  let repo = repository(&server, &store, Some("tok-down"));
  let err = repo.refresh_grades().await.unwrap_err();
  assert_eq!(err.kind(), FailureKind::Http);

  let cached = repo.fetch_grades().await.unwrap();
  assert_eq!(cached.origin, Origin::Cache);
  assert_eq!(cached.data.len(), 2);
}

#[tokio::test]
async fn test_missing_session_never_contacts_server() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when.path(ProfileResource::ENDPOINT.path);
      then.status(200).json_body(ok(json!({ "studentId": "B21DCCN123", "fullName": "A" })));
    })
    .await;

  let repo = repository(&server, &store(), None);
  let err = repo.fetch_profile().await.unwrap_err();
  assert_eq!(err.kind(), FailureKind::NoSession);
  let err = repo.refresh_profile().await.unwrap_err();
  assert_eq!(err.kind(), FailureKind::NoSession);

  mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_server_failure_message_surfaces_as_empty_payload() {
  let server = MockServer::start_async().await;
  server
    .mock_async(|when, then| {
      when.path(FeedbackResource::ENDPOINT.path);
      then
        .status(200)
        .json_body(json!({ "success": false, "message": "Session expired" }));
    })
    .await;

  let repo = repository(&server, &store(), Some("tok123"));
  let err = repo.fetch_feedback().await.unwrap_err();
  assert_eq!(err.kind(), FailureKind::EmptyPayload);
  assert!(err.to_string().contains("Session expired"));
}

#[tokio::test]
async fn test_empty_object_is_empty_payload_for_every_singleton() {
  let server = MockServer::start_async().await;
  for path in [
    ProfileResource::ENDPOINT.path,
    AccountResource::ENDPOINT.path,
    AggregateScoreResource::ENDPOINT.path,
  ] {
    server
      .mock_async(|when, then| {
        when.path(path);
        then.status(200).json_body(ok(json!({})));
      })
      .await;
  }

  let repo = repository(&server, &store(), Some("tok123"));
  assert_eq!(
    repo.fetch_profile().await.unwrap_err().kind(),
    FailureKind::EmptyPayload
  );
  assert_eq!(
    repo.fetch_account().await.unwrap_err().kind(),
    FailureKind::EmptyPayload
  );
  assert_eq!(
    repo.fetch_aggregate_score().await.unwrap_err().kind(),
    FailureKind::EmptyPayload
  );
}

#[tokio::test]
async fn test_week_schedule_is_cached_per_week() {
  let server = MockServer::start_async().await;
  let week_one = server
    .mock_async(|when, then| {
      when
        .method(POST)
        .path(WeekScheduleResource::ENDPOINT.path)
        .query_param("week", "1");
      then.status(200).json_body(ok(json!({
        "week": 1,
        "sessions": [
          { "dayOfWeek": 2, "startPeriod": 1, "periodCount": 3, "courseName": "Computer Networks", "room": "A2-301" }
        ]
      })));
    })
    .await;
  let week_two = server
    .mock_async(|when, then| {
      when
        .method(POST)
        .path(WeekScheduleResource::ENDPOINT.path)
        .query_param("week", "2");
      then
        .status(200)
        .json_body(ok(json!({ "week": 2, "sessions": [] })));
    })
    .await;

  let repo = repository(&server, &store(), Some("tok123"));

  let first = repo.fetch_week_schedule(1).await.unwrap();
  assert_eq!(first.data.sessions.len(), 1);
  let again = repo.fetch_week_schedule(1).await.unwrap();
  assert_eq!(again.origin, Origin::Cache);

  let other = repo.fetch_week_schedule(2).await.unwrap();
  assert_eq!(other.origin, Origin::Remote);
  assert_eq!(other.data.week, 2);
  assert!(other.data.sessions.is_empty());

  week_one.assert_hits_async(1).await;
  week_two.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_sync_all_reports_each_resource() {
  let server = MockServer::start_async().await;
  let payloads = [
    (
      ProfileResource::ENDPOINT.path,
      json!({ "studentId": "B21DCCN123", "fullName": "Nguyen Van A" }),
    ),
    (GradesResource::ENDPOINT.path, grades_payload()),
    (
      AggregateScoreResource::ENDPOINT.path,
      json!({ "gpa10": "7.9", "gpa4": "3.2", "totalCredits": 98 }),
    ),
    (
      TrainingScoreResource::ENDPOINT.path,
      json!([{ "semester": "HK1 2025-2026", "score": 85, "rank": "Good" }]),
    ),
    (
      FeedbackResource::ENDPOINT.path,
      json!([{ "id": "7", "title": "Room change", "content": "Lab moved" }]),
    ),
    (
      AccountResource::ENDPOINT.path,
      json!({ "username": "b21dccn123" }),
    ),
  ];
  for (path, data) in payloads {
    server
      .mock_async(|when, then| {
        when.path(path);
        then.status(200).json_body(ok(data));
      })
      .await;
  }
  server
    .mock_async(|when, then| {
      when.path(ExamScheduleResource::ENDPOINT.path);
      then.status(500);
    })
    .await;

  let repo = repository(&server, &store(), Some("tok123"));
  let report = repo.sync_all().await;

  assert_eq!(report.results.len(), 7);
  assert!(!report.is_complete());
  let failures: Vec<_> = report.failures().map(|(name, _)| name).collect();
  assert_eq!(failures, vec!["exams"]);

  // Everything that synced is now readable without the network
  let profile = repo.fetch_profile().await.unwrap();
  assert_eq!(profile.origin, Origin::Cache);
  assert_eq!(profile.data.student_id, "B21DCCN123");
}

#[tokio::test]
async fn test_clear_all_forces_next_fetch_remote() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when.path(AccountResource::ENDPOINT.path);
      then
        .status(200)
        .json_body(ok(json!({ "username": "b21dccn123", "role": "student" })));
    })
    .await;

  let repo = repository(&server, &store(), Some("tok123"));
  repo.fetch_account().await.unwrap();
  repo.clear_all().await.unwrap();

  let after = repo.fetch_account().await.unwrap();
  assert_eq!(after.origin, Origin::Remote);
  mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_search_works_on_cached_rows() {
  let server = MockServer::start_async().await;
  let mock = server
    .mock_async(|when, then| {
      when.path(GradesResource::ENDPOINT.path);
      then.status(200).json_body(ok(grades_payload()));
    })
    .await;

  let repo = repository(&server, &store(), Some("tok123"));
  assert!(repo.search_grades("net").unwrap().is_empty());

  repo.fetch_grades().await.unwrap();

  let found = repo.search_grades("NETWORKS").unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].course_code, "INT1340");
  assert_eq!(repo.search_grades("").unwrap().len(), 2);

  // Searching never calls the server
  mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_json_access_matches_typed_access() {
  let server = MockServer::start_async().await;
  server
    .mock_async(|when, then| {
      when.path(GradesResource::ENDPOINT.path);
      then.status(200).json_body(ok(grades_payload()));
    })
    .await;

  let repo = repository(&server, &store(), Some("tok123"));
  let hit = repo
    .get_json(edusync::commands::ResourceKind::Grades, edusync::Mode::Fetch, None)
    .await
    .unwrap();
  assert_eq!(hit.data[0]["courseCode"], "INT1340");

  let rows = repo
    .search_json(edusync::commands::ResourceKind::Grades, "calculus")
    .unwrap()
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert!(repo
    .search_json(edusync::commands::ResourceKind::Profile, "x")
    .is_none());
}

#[tokio::test]
async fn test_clear_all_waits_for_running_refresh() {
  let server = MockServer::start_async().await;
  server
    .mock_async(|when, then| {
      when.path(GradesResource::ENDPOINT.path);
      then
        .status(200)
        .delay(Duration::from_millis(300))
        .json_body(ok(grades_payload()));
    })
    .await;

  let repo = repository(&server, &store(), Some("tok123"));

  let (refreshed, cleared) = tokio::join!(repo.refresh_grades(), async {
    tokio::time::sleep(Duration::from_millis(50)).await;
    repo.clear_all().await
  });
  refreshed.unwrap();
  cleared.unwrap();

  // The clear ran after the refresh wrote its rows, so nothing survives
  assert!(repo.search_grades("").unwrap().is_empty());
}
