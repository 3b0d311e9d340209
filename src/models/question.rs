//! 题目与作答数据结构
//!
//! 参考答案和学生答卷解析后的只读记录，以及按题号建立的查找表

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::DuplicatePolicy;
use crate::error::ParseError;
use crate::models::grade::GradingWarning;

/// 参考答案中的一道题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceQuestion {
    /// 题号（按原文保留，不保证可按数字排序）
    pub number: String,
    pub question_text: String,
    /// 分值，未标注时为 0
    pub points: f64,
    /// 参考答案，可能为空
    pub reference_answer: String,
}

/// 学生答卷中的一道题的作答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAnswer {
    pub number: String,
    pub answer: String,
}

/// 评分策略分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// 选择题 / 判断题：满分或零分
    FixedChoice,
    /// 主观题：按评分细则给部分分
    OpenEnded,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::FixedChoice => write!(f, "选择/判断"),
            QuestionKind::OpenEnded => write!(f, "主观题"),
        }
    }
}

/// 文档来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    Reference,
    Submission,
}

impl fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentRole::Reference => write!(f, "参考答案"),
            DocumentRole::Submission => write!(f, "学生答卷"),
        }
    }
}

/// 带题号的记录
pub trait Numbered {
    fn number(&self) -> &str;
}

impl Numbered for ReferenceQuestion {
    fn number(&self) -> &str {
        &self.number
    }
}

impl Numbered for StudentAnswer {
    fn number(&self) -> &str {
        &self.number
    }
}

/// 按策略去除重复题号，保持文档顺序
///
/// 每个被丢弃的重复项都会产生一条告警；`Reject` 策略下直接返回错误。
pub fn dedupe_by_number<T: Numbered>(
    items: Vec<T>,
    policy: DuplicatePolicy,
    role: DocumentRole,
) -> Result<(Vec<T>, Vec<GradingWarning>), ParseError> {
    let mut occurrences: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, item) in items.iter().enumerate() {
        occurrences.entry(item.number()).or_default().push(idx);
    }

    let mut duplicated: Vec<(String, usize)> = occurrences
        .iter()
        .filter(|(_, idxs)| idxs.len() > 1)
        .map(|(number, idxs)| (number.to_string(), idxs.len()))
        .collect();

    if duplicated.is_empty() {
        return Ok((items, Vec::new()));
    }

    // 按首次出现的位置排序，保证告警顺序稳定
    duplicated.sort_by_key(|(number, _)| occurrences[number.as_str()][0]);

    if policy == DuplicatePolicy::Reject {
        let (number, count) = duplicated.swap_remove(0);
        return Err(ParseError::DuplicateQuestion { number, count });
    }

    let kept: Vec<usize> = occurrences
        .values()
        .map(|idxs| match policy {
            DuplicatePolicy::KeepLast => idxs[idxs.len() - 1],
            _ => idxs[0],
        })
        .collect();

    let warnings = duplicated
        .into_iter()
        .map(|(number, occurrences)| GradingWarning::DuplicateQuestion {
            number,
            role,
            occurrences,
            policy,
        })
        .collect();

    let items = items
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| kept.contains(idx))
        .map(|(_, item)| item)
        .collect();

    Ok((items, warnings))
}

/// 参考答案查找表
#[derive(Debug, Clone)]
pub struct ReferenceKey {
    questions: Vec<ReferenceQuestion>,
    index: HashMap<String, usize>,
    warnings: Vec<GradingWarning>,
}

impl ReferenceKey {
    /// 从解析结果建立查找表
    ///
    /// 没有任何题目时返回 `ParseError::NoQuestionsFound`。
    pub fn build(
        questions: Vec<ReferenceQuestion>,
        policy: DuplicatePolicy,
    ) -> Result<Self, ParseError> {
        if questions.is_empty() {
            return Err(ParseError::NoQuestionsFound);
        }

        let (questions, warnings) = dedupe_by_number(questions, policy, DocumentRole::Reference)?;
        let index = questions
            .iter()
            .enumerate()
            .map(|(idx, q)| (q.number.clone(), idx))
            .collect();

        Ok(Self {
            questions,
            index,
            warnings,
        })
    }

    pub fn get(&self, number: &str) -> Option<&ReferenceQuestion> {
        self.index.get(number).map(|&idx| &self.questions[idx])
    }

    pub fn questions(&self) -> &[ReferenceQuestion] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// 建表过程中产生的告警（重复题号）
    pub fn warnings(&self) -> &[GradingWarning] {
        &self.warnings
    }
}

/// 学生答卷（已按策略去重）
#[derive(Debug, Clone, Default)]
pub struct AnswerSheet {
    answers: Vec<StudentAnswer>,
    warnings: Vec<GradingWarning>,
}

impl AnswerSheet {
    pub fn build(answers: Vec<StudentAnswer>, policy: DuplicatePolicy) -> Result<Self, ParseError> {
        let (answers, warnings) = dedupe_by_number(answers, policy, DocumentRole::Submission)?;
        Ok(Self { answers, warnings })
    }

    pub fn answers(&self) -> &[StudentAnswer] {
        &self.answers
    }

    pub fn warnings(&self) -> &[GradingWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(number: &str, text: &str) -> ReferenceQuestion {
        ReferenceQuestion {
            number: number.to_string(),
            question_text: text.to_string(),
            points: 5.0,
            reference_answer: String::new(),
        }
    }

    fn answer(number: &str, text: &str) -> StudentAnswer {
        StudentAnswer {
            number: number.to_string(),
            answer: text.to_string(),
        }
    }

    #[test]
    fn test_empty_reference_is_no_questions_found() {
        let err = ReferenceKey::build(Vec::new(), DuplicatePolicy::KeepFirst).unwrap_err();
        assert!(matches!(err, ParseError::NoQuestionsFound));
    }

    #[test]
    fn test_key_without_duplicates_has_no_warnings() {
        let key = ReferenceKey::build(
            vec![question("1", "a"), question("2", "b")],
            DuplicatePolicy::Reject,
        )
        .unwrap();
        assert_eq!(key.len(), 2);
        assert!(key.warnings().is_empty());
        assert_eq!(key.get("2").unwrap().question_text, "b");
        assert!(key.get("3").is_none());
    }

    #[test]
    fn test_keep_first_duplicate() {
        let key = ReferenceKey::build(
            vec![question("3", "first"), question("4", "x"), question("3", "second")],
            DuplicatePolicy::KeepFirst,
        )
        .unwrap();
        assert_eq!(key.len(), 2);
        assert_eq!(key.get("3").unwrap().question_text, "first");
        assert_eq!(key.warnings().len(), 1);
        assert!(matches!(
            &key.warnings()[0],
            GradingWarning::DuplicateQuestion { number, occurrences: 2, .. } if number == "3"
        ));
    }

    #[test]
    fn test_keep_last_duplicate() {
        let key = ReferenceKey::build(
            vec![question("3", "first"), question("4", "x"), question("3", "second")],
            DuplicatePolicy::KeepLast,
        )
        .unwrap();
        assert_eq!(key.get("3").unwrap().question_text, "second");
        let numbers: Vec<&str> = key.questions().iter().map(|q| q.number.as_str()).collect();
        assert_eq!(numbers, vec!["4", "3"]);
    }

    #[test]
    fn test_reject_duplicate() {
        let err = AnswerSheet::build(
            vec![answer("1", "a"), answer("1", "b")],
            DuplicatePolicy::Reject,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ParseError::DuplicateQuestion { ref number, count: 2 } if number == "1"
        ));
    }

    #[test]
    fn test_answer_sheet_keeps_order() {
        let sheet = AnswerSheet::build(
            vec![answer("2", "b"), answer("1", "a"), answer("2", "c")],
            DuplicatePolicy::KeepFirst,
        )
        .unwrap();
        let texts: Vec<&str> = sheet.answers().iter().map(|a| a.answer.as_str()).collect();
        assert_eq!(texts, vec!["b", "a"]);
        assert_eq!(sheet.warnings().len(), 1);
    }
}
