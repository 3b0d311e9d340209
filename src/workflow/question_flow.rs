//! 单题评分流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整评分流程
//!
//! 流程顺序：
//! 1. 题型分类（选择/判断 或 主观题）
//! 2. 选择评分策略，构建评分请求
//! 3. 调用评分 LLM
//! 4. 解析回复（格式异常按 0 分处理并记录告警）

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::models::grade::{GradingWarning, QuestionDetail};
use crate::models::question::{ReferenceQuestion, StudentAnswer};
use crate::services::{classify, parse_oracle_reply, strategy_for, ScoringOracle};
use crate::utils::logging::truncate_text;
use crate::workflow::grading_ctx::GradingCtx;

/// 单题评分流程
///
/// - 编排分类、请求、解析三个步骤
/// - 不持有任何跨题状态
/// - 只依赖业务能力（services）
pub struct QuestionFlow {
    oracle: Arc<dyn ScoringOracle>,
    rubric: String,
    verbose_logging: bool,
}

impl QuestionFlow {
    /// 创建新的单题评分流程
    pub fn new(oracle: Arc<dyn ScoringOracle>, rubric: impl Into<String>, verbose_logging: bool) -> Self {
        Self {
            oracle,
            rubric: rubric.into(),
            verbose_logging,
        }
    }

    pub async fn run(
        &self,
        question: &ReferenceQuestion,
        answer: &StudentAnswer,
        ctx: &GradingCtx,
    ) -> AppResult<QuestionDetail> {
        self.log_question(ctx, question);

        let kind = classify(&question.question_text);
        let strategy = strategy_for(kind, &self.rubric);
        info!(
            "{} 题目 {} 判定为{}，满分 {}",
            ctx, question.number, kind, question.points
        );

        let request = strategy.build_request(question, &answer.answer);
        debug!("{} 🤖 调用评分模型 {}", ctx, self.oracle.model_name());

        // LLM 调用失败直接向上传播，整个评分周期失败
        let reply = self.oracle.score(&request).await?;

        if self.verbose_logging {
            debug!("{} LLM 回复: {}", ctx, truncate_text(&reply, 200));
        }

        let (outcome, issues) = parse_oracle_reply(&reply);
        let warnings: Vec<GradingWarning> = issues
            .into_iter()
            .map(|issue| {
                let warning = GradingWarning::OracleReply {
                    number: question.number.clone(),
                    issue,
                };
                warn!("{} ⚠️ {}", ctx, warning);
                warning
            })
            .collect();

        info!(
            "{} ✓ 题目 {} 得分: {}/{}",
            ctx, question.number, outcome.score, question.points
        );

        Ok(QuestionDetail {
            number: question.number.clone(),
            question_text: question.question_text.clone(),
            outcome,
            points: question.points,
            kind,
            warnings,
        })
    }

    // ========== 日志辅助方法 ==========

    /// 显示题干预览
    fn log_question(&self, ctx: &GradingCtx, question: &ReferenceQuestion) {
        info!(
            "{} 题目 {}: {}",
            ctx,
            question.number,
            truncate_text(&question.question_text, 80)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grade::ReplyIssue;
    use crate::models::question::QuestionKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedOracle {
        reply: String,
        requests: Mutex<Vec<String>>,
    }

    impl CannedOracle {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ScoringOracle for CannedOracle {
        fn model_name(&self) -> &str {
            "canned"
        }

        async fn score(&self, request: &str) -> AppResult<String> {
            self.requests.lock().unwrap().push(request.to_string());
            Ok(self.reply.clone())
        }
    }

    fn fixed_choice_question() -> ReferenceQuestion {
        ReferenceQuestion {
            number: "1".to_string(),
            question_text: "True or False: the sky is blue".to_string(),
            points: 10.0,
            reference_answer: "True".to_string(),
        }
    }

    fn answer(text: &str) -> StudentAnswer {
        StudentAnswer {
            number: "1".to_string(),
            answer: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_fixed_choice_full_score() {
        let oracle = CannedOracle::new("Score: 10\nOverall Feedback: correct");
        let flow = QuestionFlow::new(oracle.clone(), "", false);
        let ctx = GradingCtx::new(1, "alice.txt");

        let detail = flow
            .run(&fixed_choice_question(), &answer("True"), &ctx)
            .await
            .unwrap();

        assert_eq!(detail.kind, QuestionKind::FixedChoice);
        assert_eq!(detail.outcome.score, 10.0);
        assert_eq!(detail.outcome.feedback, "correct");
        assert!(detail.warnings.is_empty());

        let requests = oracle.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains("Score: [0 or 10]"));
    }

    #[tokio::test]
    async fn test_malformed_score_is_zero_with_warning() {
        let oracle = CannedOracle::new("Score: abc\nOverall Feedback: unclear");
        let flow = QuestionFlow::new(oracle, "", false);
        let ctx = GradingCtx::new(1, "alice.txt");

        let detail = flow
            .run(&fixed_choice_question(), &answer("False"), &ctx)
            .await
            .unwrap();

        assert_eq!(detail.outcome.score, 0.0);
        assert_eq!(detail.outcome.feedback, "unclear");
        assert_eq!(
            detail.warnings,
            vec![GradingWarning::OracleReply {
                number: "1".to_string(),
                issue: ReplyIssue::UnparseableScore {
                    raw: "abc".to_string()
                },
            }]
        );
    }

    #[tokio::test]
    async fn test_open_ended_request_carries_rubric() {
        let oracle = CannedOracle::new("Score: 2.5\nOverall Feedback: partial");
        let flow = QuestionFlow::new(oracle.clone(), "Two causes expected.", true);
        let ctx = GradingCtx::new(2, "bob.txt");
        let question = ReferenceQuestion {
            number: "4".to_string(),
            question_text: "Explain the causes of inflation".to_string(),
            points: 5.0,
            reference_answer: "Demand-pull and cost-push".to_string(),
        };

        let detail = flow
            .run(&question, &StudentAnswer { number: "4".to_string(), answer: "Demand".to_string() }, &ctx)
            .await
            .unwrap();

        assert_eq!(detail.kind, QuestionKind::OpenEnded);
        assert_eq!(detail.outcome.score, 2.5);
        assert_eq!(detail.points, 5.0);
        let requests = oracle.requests.lock().unwrap();
        assert!(requests[0].contains("Two causes expected."));
        assert!(requests[0].contains("Student Answer: Demand"));
    }
}
