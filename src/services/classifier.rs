//! 题型分类 - 业务能力层
//!
//! 根据题干判断是选择/判断题（满分或零分）还是主观题（部分得分）

use crate::models::question::QuestionKind;

/// 判断题 / 选择题的提示短语，按顺序检查
const FIXED_CHOICE_PHRASES: [&str; 2] = ["true or false", "which of the following"];

/// 选项标记
const OPTION_MARKERS: [&str; 4] = ["a)", "b)", "c)", "d)"];

/// 根据题干判断评分策略（不区分大小写的子串匹配）
pub fn classify(question_text: &str) -> QuestionKind {
    let text_lower = question_text.to_lowercase();

    if FIXED_CHOICE_PHRASES
        .iter()
        .any(|phrase| text_lower.contains(phrase))
    {
        return QuestionKind::FixedChoice;
    }

    if OPTION_MARKERS
        .iter()
        .any(|marker| text_lower.contains(marker))
    {
        return QuestionKind::FixedChoice;
    }

    QuestionKind::OpenEnded
}
