//! Student academic records: types, resource bindings, and the repository.

mod repository;
mod resources;
mod types;

pub use repository::{Mode, StudentRepository, SyncReport};
pub use resources::{
  AccountResource, AggregateScoreResource, ExamScheduleResource, FeedbackResource,
  GradesResource, ProfileResource, TrainingScoreResource, WeekScheduleResource,
};
pub use types::{
  Account, AggregateScore, ClassSession, CourseResult, ExamEntry, Feedback, StudentProfile,
  TrainingScore, WeekSchedule,
};
