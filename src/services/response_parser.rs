//! LLM 评分回复解析
//!
//! 逐行匹配 `Score:` 和 `Overall Feedback:` 前缀（不区分大小写），后出现的行覆盖先出现的行。
//! 分数无法解析时按 0 分处理，同时返回对应的问题说明，调用方决定如何上报。

use crate::models::grade::{GradeOutcome, ReplyIssue};

const SCORE_PREFIX: &str = "score:";
const FEEDBACK_PREFIX: &str = "overall feedback:";

/// 解析 LLM 回复，返回评分结果以及回复中的格式问题
pub fn parse_oracle_reply(reply: &str) -> (GradeOutcome, Vec<ReplyIssue>) {
    let mut raw_score: Option<String> = None;
    let mut feedback: Option<String> = None;

    for line in reply.lines() {
        let low = line.trim().to_lowercase();
        if low.starts_with(SCORE_PREFIX) {
            raw_score = Some(after_colon(line));
        } else if low.starts_with(FEEDBACK_PREFIX) {
            feedback = Some(after_colon(line));
        }
    }

    let mut issues = Vec::new();

    let score = match raw_score {
        Some(raw) => match parse_score(&raw) {
            Some(score) => score,
            None => {
                issues.push(ReplyIssue::UnparseableScore { raw });
                0.0
            }
        },
        None => {
            issues.push(ReplyIssue::MissingScore);
            0.0
        }
    };

    if feedback.is_none() {
        issues.push(ReplyIssue::MissingFeedback);
    }

    (
        GradeOutcome {
            score,
            feedback: feedback.unwrap_or_default(),
        },
        issues,
    )
}

/// 第一个冒号之后的内容（去掉首尾空白）
fn after_colon(line: &str) -> String {
    line.split_once(':')
        .map(|(_, rest)| rest.trim().to_string())
        .unwrap_or_default()
}

/// 只接受有限的数值
fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
