//! 评分结果数据结构

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::DuplicatePolicy;
use crate::models::question::{DocumentRole, QuestionKind};

/// 单题评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeOutcome {
    /// 得分（不做上下限截断）
    pub score: f64,
    pub feedback: String,
}

/// LLM 回复中的格式问题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplyIssue {
    /// 没有 "Score:" 行
    MissingScore,
    /// "Score:" 后的内容不是数字
    UnparseableScore { raw: String },
    /// 没有 "Overall Feedback:" 行
    MissingFeedback,
}

impl fmt::Display for ReplyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyIssue::MissingScore => write!(f, "回复中没有 Score 行，按 0 分处理"),
            ReplyIssue::UnparseableScore { raw } => {
                write!(f, "无法解析分数 '{}'，按 0 分处理", raw)
            }
            ReplyIssue::MissingFeedback => write!(f, "回复中没有 Overall Feedback 行"),
        }
    }
}

/// 评分过程中"降级但不中断"的情况
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GradingWarning {
    /// 学生作答的题号不在参考答案中，已丢弃
    UnmatchedAnswer { number: String },
    /// LLM 回复格式异常
    OracleReply { number: String, issue: ReplyIssue },
    /// 文档中出现重复题号
    DuplicateQuestion {
        number: String,
        role: DocumentRole,
        occurrences: usize,
        policy: DuplicatePolicy,
    },
}

impl fmt::Display for GradingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingWarning::UnmatchedAnswer { number } => {
                write!(f, "题目 {} 不在参考答案中，已跳过", number)
            }
            GradingWarning::OracleReply { number, issue } => {
                write!(f, "题目 {}: {}", number, issue)
            }
            GradingWarning::DuplicateQuestion {
                number,
                role,
                occurrences,
                policy,
            } => write!(
                f,
                "{}中题号 {} 出现 {} 次，按 {:?} 处理",
                role, number, occurrences, policy
            ),
        }
    }
}

/// 单题明细：(题号, 题干, 评分结果) 以及分值等附加信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDetail {
    pub number: String,
    pub question_text: String,
    pub outcome: GradeOutcome,
    pub points: f64,
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<GradingWarning>,
}

/// 单份答卷的汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub submission: String,
    pub obtained: f64,
    pub possible: f64,
    pub percent: f64,
}

impl fmt::Display for StudentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} / {} ({}%)",
            self.submission, self.obtained, self.possible, self.percent
        )
    }
}

/// 单份答卷的评分记录，逐题累加
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentRecord {
    pub submission: String,
    pub details: Vec<QuestionDetail>,
    pub obtained: f64,
    pub possible: f64,
    /// 与具体得分无关的告警（未匹配题号、重复题号）
    pub warnings: Vec<GradingWarning>,
}

impl StudentRecord {
    pub fn new(submission: impl Into<String>) -> Self {
        Self {
            submission: submission.into(),
            ..Default::default()
        }
    }

    /// 追加一道题的明细并累加得分
    pub fn push(&mut self, detail: QuestionDetail) {
        self.obtained += detail.outcome.score;
        self.possible += detail.points;
        self.details.push(detail);
    }

    pub fn warn(&mut self, warning: GradingWarning) {
        self.warnings.push(warning);
    }

    /// 计算最终得分率（总分为 0 时得分率为 0）
    pub fn finalize(&self) -> StudentSummary {
        let percent = if self.possible > 0.0 {
            self.obtained / self.possible * 100.0
        } else {
            0.0
        };
        StudentSummary {
            submission: self.submission.clone(),
            obtained: round2(self.obtained),
            possible: self.possible,
            percent: round2(percent),
        }
    }

    /// 所有告警：记录级告警在前，逐题告警在后
    pub fn all_warnings(&self) -> Vec<GradingWarning> {
        self.warnings
            .iter()
            .chain(self.details.iter().flat_map(|d| d.warnings.iter()))
            .cloned()
            .collect()
    }
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(number: &str, score: f64, points: f64) -> QuestionDetail {
        QuestionDetail {
            number: number.to_string(),
            question_text: format!("Question text {}", number),
            outcome: GradeOutcome {
                score,
                feedback: String::new(),
            },
            points,
            kind: QuestionKind::OpenEnded,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_two_questions_half_score() {
        let mut record = StudentRecord::new("alice.pdf");
        record.push(detail("1", 5.0, 5.0));
        record.push(detail("2", 0.0, 5.0));

        let summary = record.finalize();
        assert_eq!(summary.obtained, 5.0);
        assert_eq!(summary.possible, 10.0);
        assert_eq!(summary.percent, 50.0);
    }

    #[test]
    fn test_empty_record_has_zero_percent() {
        let summary = StudentRecord::new("empty.pdf").finalize();
        assert_eq!(summary.obtained, 0.0);
        assert_eq!(summary.possible, 0.0);
        assert_eq!(summary.percent, 0.0);
    }

    #[test]
    fn test_percent_rounds_to_two_places() {
        let mut record = StudentRecord::new("bob.pdf");
        record.push(detail("1", 1.0, 3.0));
        assert_eq!(record.finalize().percent, 33.33);
    }

    #[test]
    fn test_all_warnings_orders_record_first() {
        let mut record = StudentRecord::new("carol.pdf");
        let mut d = detail("1", 0.0, 5.0);
        d.warnings.push(GradingWarning::OracleReply {
            number: "1".to_string(),
            issue: ReplyIssue::MissingScore,
        });
        record.push(d);
        record.warn(GradingWarning::UnmatchedAnswer {
            number: "9".to_string(),
        });

        let warnings = record.all_warnings();
        assert_eq!(warnings.len(), 2);
        assert!(matches!(warnings[0], GradingWarning::UnmatchedAnswer { .. }));
    }
}
