//! 题目分段状态机
//!
//! 以题号标记为界把标记序列切成题块，再分别组装成参考题目或学生作答。

use crate::models::question::{ReferenceQuestion, StudentAnswer};
use crate::parser::lexer::{tokenize, Token, TokenKind};

/// 一个题块：题号 + 题号之后到下一个题号之前的所有标记
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBlock<'a> {
    pub number: String,
    pub tokens: Vec<Token<'a>>,
}

enum State<'a> {
    /// 第一个题号之前的内容，丢弃
    Preamble,
    InBlock(QuestionBlock<'a>),
}

/// 按题号标记切分题块，第一个题号之前的内容被丢弃
///
/// 重复题号都会保留；没有任何题号时返回空序列。
pub fn split_blocks<'a>(tokens: Vec<Token<'a>>) -> Vec<QuestionBlock<'a>> {
    let mut blocks = Vec::new();
    let mut state = State::Preamble;

    for token in tokens {
        state = match (state, token.kind) {
            (State::Preamble, TokenKind::QuestionMarker { number }) => {
                State::InBlock(QuestionBlock {
                    number,
                    tokens: Vec::new(),
                })
            }
            (State::Preamble, _) => State::Preamble,
            (State::InBlock(block), TokenKind::QuestionMarker { number }) => {
                blocks.push(block);
                State::InBlock(QuestionBlock {
                    number,
                    tokens: Vec::new(),
                })
            }
            (State::InBlock(mut block), kind) => {
                block.tokens.push(Token {
                    kind,
                    lexeme: token.lexeme,
                });
                State::InBlock(block)
            }
        };
    }

    if let State::InBlock(block) = state {
        blocks.push(block);
    }

    blocks
}

/// 组装参考题目
///
/// 第一个分值标记决定分值（没有则为 0），所有分值标记都从文本中移除；
/// 第一个参考答案标签之前是题干，之后是参考答案。学生作答标签按普通文本处理。
pub fn assemble_reference(block: QuestionBlock<'_>) -> ReferenceQuestion {
    let mut points = None;
    let mut question_text = String::new();
    let mut reference_answer = String::new();
    let mut in_answer = false;

    for token in block.tokens {
        match token.kind {
            TokenKind::Points { value } => {
                points.get_or_insert(value);
            }
            TokenKind::ReferenceAnswerLabel if !in_answer => in_answer = true,
            _ if in_answer => reference_answer.push_str(token.lexeme),
            _ => question_text.push_str(token.lexeme),
        }
    }

    ReferenceQuestion {
        number: block.number,
        question_text: question_text.trim().to_string(),
        points: points.unwrap_or(0.0),
        reference_answer: reference_answer.trim().to_string(),
    }
}

/// 组装学生作答：移除分值标记和 "Student Answer:" 标签
pub fn assemble_student(block: QuestionBlock<'_>) -> StudentAnswer {
    let answer: String = block
        .tokens
        .iter()
        .filter(|t| !matches!(t.kind, TokenKind::Points { .. } | TokenKind::StudentAnswerLabel))
        .map(|t| t.lexeme)
        .collect();

    StudentAnswer {
        number: block.number,
        answer: answer.trim().to_string(),
    }
}

/// 解析参考答案文本（输入应已做空白规范化）
pub fn parse_reference_text(text: &str) -> Vec<ReferenceQuestion> {
    split_blocks(tokenize(text))
        .into_iter()
        .map(assemble_reference)
        .collect()
}

/// 解析学生答卷文本（输入应已做空白规范化）
pub fn parse_student_text(text: &str) -> Vec<StudentAnswer> {
    split_blocks(tokenize(text))
        .into_iter()
        .map(assemble_student)
        .collect()
}
