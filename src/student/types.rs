//! Student record types, shared by the wire format and the local store.

use serde::{Deserialize, Serialize};

/// Personal and enrolment details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
  #[serde(default)]
  pub student_id: String,
  #[serde(default)]
  pub full_name: String,
  #[serde(default)]
  pub birthday: Option<String>,
  #[serde(default)]
  pub gender: Option<String>,
  #[serde(default)]
  pub class_name: Option<String>,
  #[serde(default)]
  pub faculty: Option<String>,
  #[serde(default)]
  pub major: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub phone: Option<String>,
}

/// Result of one course in one semester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResult {
  pub course_code: String,
  pub course_name: String,
  #[serde(default)]
  pub credits: u32,
  #[serde(default)]
  pub semester: String,
  #[serde(default)]
  pub score10: Option<String>,
  #[serde(default)]
  pub score4: Option<String>,
  #[serde(default)]
  pub letter_grade: Option<String>,
}

/// Cumulative GPA summary.
///
/// Scores stay strings because the API sends them formatted ("3.20").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateScore {
  #[serde(default)]
  pub gpa10: String,
  #[serde(default)]
  pub gpa4: String,
  #[serde(default)]
  pub total_credits: u32,
  #[serde(default)]
  pub classification: Option<String>,
}

/// Conduct (training) score for one semester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingScore {
  pub semester: String,
  pub score: u32,
  #[serde(default)]
  pub rank: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamEntry {
  pub course_code: String,
  pub course_name: String,
  pub exam_date: String,
  #[serde(default)]
  pub start_time: Option<String>,
  #[serde(default)]
  pub room: Option<String>,
  #[serde(default)]
  pub seat_number: Option<String>,
  #[serde(default)]
  pub exam_form: Option<String>,
}

/// One teaching slot within a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSession {
  /// 2 = Monday .. 8 = Sunday, as the timetable prints it
  pub day_of_week: u8,
  pub start_period: u8,
  pub period_count: u8,
  pub course_name: String,
  #[serde(default)]
  pub room: Option<String>,
  #[serde(default)]
  pub teacher: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSchedule {
  pub week: u32,
  #[serde(default)]
  pub start_date: Option<String>,
  #[serde(default)]
  pub end_date: Option<String>,
  #[serde(default)]
  pub sessions: Vec<ClassSession>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub content: String,
  #[serde(default)]
  pub sender: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
}

/// Login account attached to the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub display_name: Option<String>,
  #[serde(default)]
  pub role: Option<String>,
  #[serde(default)]
  pub email: Option<String>,
}
