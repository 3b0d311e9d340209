pub mod grading_ctx;
pub mod question_flow;

pub use grading_ctx::GradingCtx;
pub use question_flow::QuestionFlow;
