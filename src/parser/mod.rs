//! 文本分段解析
//!
//! OCR 提取的原始文本 → 空白规范化 → 标记序列 → 题块 → 结构化记录

pub mod lexer;
pub mod segmenter;

pub use lexer::{tokenize, Token, TokenKind};
pub use segmenter::{parse_reference_text, parse_student_text, split_blocks, QuestionBlock};

/// 把所有连续空白（包括换行）合并为单个空格并去掉首尾空白
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
