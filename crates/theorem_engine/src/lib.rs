//! Theorem engine - question classification, knowledge gathering, two-tier
//! reasoning and workflow coordination.

pub mod aggregator;
pub mod batch;
pub mod classifier;
pub mod coordinator;
pub mod error;
pub mod prompt;
pub mod reasoner;
pub mod rules;

pub use aggregator::{KnowledgeAggregator, KnowledgeGatherer};
pub use batch::{evaluate, BatchEntry, BatchReport};
pub use classifier::{KeywordClassifier, QuestionClassifier};
pub use coordinator::Coordinator;
pub use error::StageError;
pub use prompt::{AnswerExtractor, ReasoningPromptBuilder};
pub use reasoner::{QuestionReasoner, TwoTierReasoner};
pub use rules::{Rule, RuleBook, RuleOutcome};
