//! Resource bindings for the student records API.

use crate::api::Endpoint;
use crate::cache::{Cardinality, Resource, Searchable};

use super::types::{
  Account, AggregateScore, CourseResult, ExamEntry, Feedback, StudentProfile, TrainingScore,
  WeekSchedule,
};

/// Collections with no entries are treated as an empty payload.
fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
  if items.is_empty() {
    None
  } else {
    Some(items)
  }
}

fn contains(field: &str, needle: &str) -> bool {
  field.to_lowercase().contains(needle)
}

fn contains_opt(field: &Option<String>, needle: &str) -> bool {
  field.as_deref().map(|f| contains(f, needle)).unwrap_or(false)
}

// ============================================================================
// Singletons
// ============================================================================

pub struct ProfileResource;

impl Resource for ProfileResource {
  type Data = StudentProfile;
  type Row = StudentProfile;
  type Wire = StudentProfile;
  type Params = ();

  const NAME: &'static str = "profile";
  const CARDINALITY: Cardinality = Cardinality::Singleton;
  const ENDPOINT: Endpoint = Endpoint::get("/api/student/profile");

  fn decode(wire: StudentProfile) -> Option<StudentProfile> {
    (!wire.student_id.trim().is_empty()).then_some(wire)
  }

  fn to_rows(data: &StudentProfile) -> Vec<StudentProfile> {
    vec![data.clone()]
  }

  fn from_rows(rows: Vec<StudentProfile>) -> Option<StudentProfile> {
    rows.into_iter().next()
  }
}

pub struct AggregateScoreResource;

impl Resource for AggregateScoreResource {
  type Data = AggregateScore;
  type Row = AggregateScore;
  type Wire = AggregateScore;
  type Params = ();

  const NAME: &'static str = "aggregate_score";
  const CARDINALITY: Cardinality = Cardinality::Singleton;
  const ENDPOINT: Endpoint = Endpoint::get("/api/student/grades/summary");

  fn decode(wire: AggregateScore) -> Option<AggregateScore> {
    if wire.gpa4.trim().is_empty() && wire.gpa10.trim().is_empty() {
      None
    } else {
      Some(wire)
    }
  }

  fn to_rows(data: &AggregateScore) -> Vec<AggregateScore> {
    vec![data.clone()]
  }

  fn from_rows(rows: Vec<AggregateScore>) -> Option<AggregateScore> {
    rows.into_iter().next()
  }
}

/// Timetable of one week, cached per week number.
pub struct WeekScheduleResource;

impl Resource for WeekScheduleResource {
  type Data = WeekSchedule;
  type Row = WeekSchedule;
  type Wire = WeekSchedule;
  /// Week number within the academic year
  type Params = u32;

  const NAME: &'static str = "week_schedule";
  const CARDINALITY: Cardinality = Cardinality::Singleton;
  const ENDPOINT: Endpoint = Endpoint::post("/api/student/schedule/week");

  fn query(week: &u32) -> Vec<(&'static str, String)> {
    vec![("week", week.to_string())]
  }

  fn scope(week: &u32) -> String {
    week.to_string()
  }

  // A week without classes is still a valid timetable
  fn decode(wire: WeekSchedule) -> Option<WeekSchedule> {
    Some(wire)
  }

  fn to_rows(data: &WeekSchedule) -> Vec<WeekSchedule> {
    vec![data.clone()]
  }

  fn from_rows(rows: Vec<WeekSchedule>) -> Option<WeekSchedule> {
    rows.into_iter().next()
  }
}

pub struct AccountResource;

impl Resource for AccountResource {
  type Data = Account;
  type Row = Account;
  type Wire = Account;
  type Params = ();

  const NAME: &'static str = "account";
  const CARDINALITY: Cardinality = Cardinality::Singleton;
  const ENDPOINT: Endpoint = Endpoint::get("/api/account");

  fn decode(wire: Account) -> Option<Account> {
    (!wire.username.trim().is_empty()).then_some(wire)
  }

  fn to_rows(data: &Account) -> Vec<Account> {
    vec![data.clone()]
  }

  fn from_rows(rows: Vec<Account>) -> Option<Account> {
    rows.into_iter().next()
  }
}

// ============================================================================
// Collections
// ============================================================================

pub struct GradesResource;

impl Resource for GradesResource {
  type Data = Vec<CourseResult>;
  type Row = CourseResult;
  type Wire = Vec<CourseResult>;
  type Params = ();

  const NAME: &'static str = "grades";
  const CARDINALITY: Cardinality = Cardinality::Collection;
  const ENDPOINT: Endpoint = Endpoint::get("/api/student/grades");

  fn decode(wire: Vec<CourseResult>) -> Option<Vec<CourseResult>> {
    non_empty(wire)
  }

  fn to_rows(data: &Vec<CourseResult>) -> Vec<CourseResult> {
    data.clone()
  }

  fn from_rows(rows: Vec<CourseResult>) -> Option<Vec<CourseResult>> {
    non_empty(rows)
  }
}

impl Searchable for GradesResource {
  fn matches(row: &CourseResult, needle: &str) -> bool {
    contains(&row.course_code, needle)
      || contains(&row.course_name, needle)
      || contains(&row.semester, needle)
  }
}

pub struct TrainingScoreResource;

impl Resource for TrainingScoreResource {
  type Data = Vec<TrainingScore>;
  type Row = TrainingScore;
  type Wire = Vec<TrainingScore>;
  type Params = ();

  const NAME: &'static str = "training_score";
  const CARDINALITY: Cardinality = Cardinality::Collection;
  const ENDPOINT: Endpoint = Endpoint::get("/api/student/training-scores");

  fn decode(wire: Vec<TrainingScore>) -> Option<Vec<TrainingScore>> {
    non_empty(wire)
  }

  fn to_rows(data: &Vec<TrainingScore>) -> Vec<TrainingScore> {
    data.clone()
  }

  fn from_rows(rows: Vec<TrainingScore>) -> Option<Vec<TrainingScore>> {
    non_empty(rows)
  }
}

impl Searchable for TrainingScoreResource {
  fn matches(row: &TrainingScore, needle: &str) -> bool {
    contains(&row.semester, needle) || contains_opt(&row.rank, needle)
  }
}

pub struct ExamScheduleResource;

impl Resource for ExamScheduleResource {
  type Data = Vec<ExamEntry>;
  type Row = ExamEntry;
  type Wire = Vec<ExamEntry>;
  type Params = ();

  const NAME: &'static str = "exam_schedule";
  const CARDINALITY: Cardinality = Cardinality::Collection;
  const ENDPOINT: Endpoint = Endpoint::get("/api/student/exam-schedule");

  fn decode(wire: Vec<ExamEntry>) -> Option<Vec<ExamEntry>> {
    non_empty(wire)
  }

  fn to_rows(data: &Vec<ExamEntry>) -> Vec<ExamEntry> {
    data.clone()
  }

  fn from_rows(rows: Vec<ExamEntry>) -> Option<Vec<ExamEntry>> {
    non_empty(rows)
  }
}

impl Searchable for ExamScheduleResource {
  fn matches(row: &ExamEntry, needle: &str) -> bool {
    contains(&row.course_code, needle)
      || contains(&row.course_name, needle)
      || contains(&row.exam_date, needle)
      || contains_opt(&row.room, needle)
  }
}

pub struct FeedbackResource;

impl Resource for FeedbackResource {
  type Data = Vec<Feedback>;
  type Row = Feedback;
  type Wire = Vec<Feedback>;
  type Params = ();

  const NAME: &'static str = "feedback";
  const CARDINALITY: Cardinality = Cardinality::Collection;
  const ENDPOINT: Endpoint = Endpoint::get("/api/student/feedback");

  fn decode(wire: Vec<Feedback>) -> Option<Vec<Feedback>> {
    non_empty(wire)
  }

  fn to_rows(data: &Vec<Feedback>) -> Vec<Feedback> {
    data.clone()
  }

  fn from_rows(rows: Vec<Feedback>) -> Option<Vec<Feedback>> {
    non_empty(rows)
  }
}

impl Searchable for FeedbackResource {
  fn matches(row: &Feedback, needle: &str) -> bool {
    contains(&row.title, needle) || contains(&row.content, needle) || contains_opt(&row.sender, needle)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn grade(code: &str, name: &str, semester: &str) -> CourseResult {
    CourseResult {
      course_code: code.into(),
      course_name: name.into(),
      credits: 3,
      semester: semester.into(),
      score10: Some("8.5".into()),
      score4: Some("3.7".into()),
      letter_grade: Some("A".into()),
    }
  }

  #[test]
  fn test_grades_decode_camel_case_wire() {
    let wire: Vec<CourseResult> = serde_json::from_str(
      r#"[{"courseCode":"INT1340","courseName":"Networking","credits":3,"semester":"HK1 2025-2026","score10":"8.1","score4":"3.5","letterGrade":"B+"}]"#,
    )
    .unwrap();

    let data = GradesResource::decode(wire).unwrap();
    assert_eq!(data[0].course_code, "INT1340");
    assert_eq!(data[0].letter_grade.as_deref(), Some("B+"));
  }

  #[test]
  fn test_empty_collections_decode_to_none() {
    assert!(GradesResource::decode(Vec::new()).is_none());
    assert!(FeedbackResource::decode(Vec::new()).is_none());
    assert!(GradesResource::from_rows(Vec::new()).is_none());
  }

  #[test]
  fn test_blank_singletons_decode_to_none() {
    let score = AggregateScore {
      gpa10: " ".into(),
      gpa4: String::new(),
      total_credits: 0,
      classification: None,
    };
    assert!(AggregateScoreResource::decode(score).is_none());

    let account: Account = serde_json::from_str(r#"{"username":""}"#).unwrap();
    assert!(AccountResource::decode(account).is_none());
  }

  #[test]
  fn test_empty_object_singletons_decode_to_none() {
    let profile: StudentProfile = serde_json::from_str("{}").unwrap();
    assert!(ProfileResource::decode(profile).is_none());

    let account: Account = serde_json::from_str("{}").unwrap();
    assert!(AccountResource::decode(account).is_none());
  }

  #[test]
  fn test_empty_week_is_still_a_schedule() {
    let week: WeekSchedule = serde_json::from_str(r#"{"week":30}"#).unwrap();
    let decoded = WeekScheduleResource::decode(week).unwrap();
    assert!(decoded.sessions.is_empty());
    assert_eq!(WeekScheduleResource::scope(&30), "30");
    assert_eq!(WeekScheduleResource::query(&30), vec![("week", "30".to_string())]);
  }

  #[test]
  fn test_grade_search_fields() {
    let row = grade("INT1340", "Computer Networks", "HK1 2025-2026");
    assert!(GradesResource::matches(&row, "int13"));
    assert!(GradesResource::matches(&row, "networks"));
    assert!(GradesResource::matches(&row, "hk1"));
    assert!(!GradesResource::matches(&row, "physics"));
  }

  #[test]
  fn test_feedback_search_checks_optional_sender() {
    let row = Feedback {
      id: "1".into(),
      title: "Room change".into(),
      content: "Lab moved to A2".into(),
      sender: Some("Academic Office".into()),
      created_at: None,
      status: None,
    };
    assert!(FeedbackResource::matches(&row, "academic"));
    assert!(FeedbackResource::matches(&row, "a2"));
    assert!(!FeedbackResource::matches(&row, "exam"));
  }

  #[test]
  fn test_singleton_rows_round_trip() {
    let profile: StudentProfile =
      serde_json::from_str(r#"{"studentId":"B21DCCN123","fullName":"Nguyen Van A"}"#).unwrap();
    let rows = ProfileResource::to_rows(&profile);
    assert_eq!(rows.len(), 1);
    assert_eq!(ProfileResource::from_rows(rows), Some(profile));
  }
}
