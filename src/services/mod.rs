pub mod classifier;
pub mod detail_cache;
pub mod document_service;
pub mod grading_strategy;
pub mod llm_service;
pub mod report_writer;
pub mod response_parser;
pub mod warn_writer;

pub use classifier::classify;
pub use detail_cache::DetailCache;
pub use document_service::{AzureReadExtractor, DocumentExtractor, ExtractorSet, PlainTextExtractor};
pub use grading_strategy::{strategy_for, FixedChoiceStrategy, GradingStrategy, OpenEndedStrategy};
pub use llm_service::{LlmService, ScoringOracle};
pub use report_writer::ReportWriter;
pub use response_parser::parse_oracle_reply;
pub use warn_writer::WarnWriter;
