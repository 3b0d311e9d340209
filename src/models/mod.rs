pub mod grade;
pub mod job;
pub mod loaders;
pub mod question;

pub use grade::{
    GradeOutcome, GradingWarning, QuestionDetail, ReplyIssue, StudentRecord, StudentSummary,
};
pub use job::GradingJob;
pub use loaders::{load_all_toml_files, load_rubric, load_toml_to_grading_job};
pub use question::{
    AnswerSheet, DocumentRole, QuestionKind, ReferenceKey, ReferenceQuestion, StudentAnswer,
};
