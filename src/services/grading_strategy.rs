//! 评分策略 - 业务能力层
//!
//! 两种策略共用一个接口，调用 LLM 的地方不再按题型分支：
//! - `FixedChoiceStrategy`：选择/判断题，满分或零分
//! - `OpenEndedStrategy`：主观题，按评分细则给 0 到满分之间的部分分
//!
//! 两种请求都要求 LLM 按固定格式回复：
//!
//! ```text
//! Score: <number>
//! Overall Feedback: <text>
//! ```

use crate::models::question::{QuestionKind, ReferenceQuestion};

/// 评分策略
pub trait GradingStrategy: Send + Sync {
    fn kind(&self) -> QuestionKind;

    /// 构建发给评分 LLM 的请求文本
    fn build_request(&self, question: &ReferenceQuestion, student_answer: &str) -> String;
}

/// 选择/判断题策略
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedChoiceStrategy;

impl GradingStrategy for FixedChoiceStrategy {
    fn kind(&self) -> QuestionKind {
        QuestionKind::FixedChoice
    }

    fn build_request(&self, question: &ReferenceQuestion, student_answer: &str) -> String {
        let points = question.points;
        format!(
            r#"You are a strict grader for a multiple-choice/true-false question worth {points} points.
If the student's answer exactly matches the reference answer, assign {points}. Otherwise assign 0.

Reference Answer: {reference}
Student Answer: {student}

Respond in this format:

Score: [0 or {points}]
Overall Feedback: [brief explanation]
"#,
            points = points,
            reference = question.reference_answer,
            student = student_answer,
        )
    }
}

/// 主观题策略，携带评分细则
#[derive(Debug, Clone, Default)]
pub struct OpenEndedStrategy {
    rubric: String,
}

impl OpenEndedStrategy {
    pub fn new(rubric: impl Into<String>) -> Self {
        Self {
            rubric: rubric.into(),
        }
    }
}

impl GradingStrategy for OpenEndedStrategy {
    fn kind(&self) -> QuestionKind {
        QuestionKind::OpenEnded
    }

    fn build_request(&self, question: &ReferenceQuestion, student_answer: &str) -> String {
        let points = question.points;
        format!(
            r#"You are an exam grader. Use the rubric to assign partial credit from 0 to {points}.

Rubric:
"""
{rubric}
"""

Reference Answer: {reference}
Student Answer: {student}

Output in this format:

Score: [0-{points}]
Overall Feedback: [1-2 sentence explanation]
"#,
            points = points,
            rubric = self.rubric,
            reference = question.reference_answer,
            student = student_answer,
        )
    }
}

/// 按题型选择评分策略
pub fn strategy_for(kind: QuestionKind, rubric: &str) -> Box<dyn GradingStrategy> {
    match kind {
        QuestionKind::FixedChoice => Box::new(FixedChoiceStrategy),
        QuestionKind::OpenEnded => Box::new(OpenEndedStrategy::new(rubric)),
    }
}
