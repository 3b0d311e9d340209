//! 标记词法分析
//!
//! 把规范化后的文本切成标记序列。识别的标记（均不区分大小写）：
//!
//! - `Question N` 题号标记，可跟 `:` 或 `.`
//! - `Points: N` 分值
//! - `Reference Answer:` / `Reference Answer.` 参考答案标签
//! - `Student Answer:` 学生作答标签
//!
//! 其余内容为 `Text`。每个标记都保留原文，不关心某类标记的组装器可以原样当作文本。

use std::sync::OnceLock;

use regex::Regex;

/// 标记类型
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    QuestionMarker { number: String },
    Points { value: f64 },
    ReferenceAnswerLabel,
    StudentAnswerLabel,
    Text,
}

/// 一个标记及其原文
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
}

impl<'a> Token<'a> {
    fn text(lexeme: &'a str) -> Self {
        Self {
            kind: TokenKind::Text,
            lexeme,
        }
    }
}

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?P<question>question\s+(?P<qnum>[0-9]+)\s*[:.]?)|(?P<points>points\s*:\s*(?P<pval>[0-9]+))|(?P<refl>reference\s*answer\s*[:.])|(?P<stul>student answer\s*:\s*)",
        )
        .expect("marker regex is valid")
    })
}

/// 把文本切分为标记序列
///
/// 相邻标记之间（以及首尾）的非空内容作为 `Text` 标记输出。
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for caps in marker_regex().captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };

        if whole.start() > cursor {
            tokens.push(Token::text(&text[cursor..whole.start()]));
        }

        let kind = if let Some(number) = caps.name("qnum") {
            TokenKind::QuestionMarker {
                number: number.as_str().to_string(),
            }
        } else if let Some(value) = caps.name("pval") {
            TokenKind::Points {
                value: value.as_str().parse().unwrap_or(0.0),
            }
        } else if caps.name("refl").is_some() {
            TokenKind::ReferenceAnswerLabel
        } else {
            TokenKind::StudentAnswerLabel
        };

        tokens.push(Token {
            kind,
            lexeme: whole.as_str(),
        });
        cursor = whole.end();
    }

    if cursor < text.len() {
        tokens.push(Token::text(&text[cursor..]));
    }

    tokens
}
