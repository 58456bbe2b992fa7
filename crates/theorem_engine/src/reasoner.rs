//! Two-Tier Reasoner
//!
//! Flow:
//! 1. Tier 1: rule book (no LLM, confidence 1.0)
//! 2. Tier 2: prompt + single model call, only when Tier 1 misses
//!
//! Invariants:
//! - At most one model call per question, never retried
//! - A model failure becomes an `ERROR` answer, not a stage fault

use async_trait::async_trait;
use std::sync::Arc;
use theorem_common::{KnowledgeBundle, ModelClient, ReasoningConfig, ReasoningResult};
use tracing::{debug, info, warn};

use crate::error::StageError;
use crate::prompt::{AnswerExtractor, ReasoningPromptBuilder};
use crate::rules::{RuleBook, RuleOutcome};

/// Reasoning stage
#[async_trait]
pub trait QuestionReasoner: Send + Sync {
    async fn reason(
        &self,
        question: &str,
        bundle: &KnowledgeBundle,
    ) -> Result<ReasoningResult, StageError>;
}

pub struct TwoTierReasoner {
    rules: RuleBook,
    prompts: ReasoningPromptBuilder,
    extractor: AnswerExtractor,
    model: Arc<dyn ModelClient>,
}

impl TwoTierReasoner {
    pub fn new(model: Arc<dyn ModelClient>, config: &ReasoningConfig) -> Self {
        Self {
            rules: RuleBook::builtin(),
            prompts: ReasoningPromptBuilder::new(config.answer_prefix.clone()),
            extractor: AnswerExtractor::from_config(config),
            model,
        }
    }

    /// Replace the built-in rule book
    pub fn with_rules(mut self, rules: RuleBook) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Infallible reasoning: rule hit, model answer, or model error
    pub async fn answer(&self, question: &str, bundle: &KnowledgeBundle) -> ReasoningResult {
        let result = match self.rules.evaluate(question) {
            RuleOutcome::Matched(rule) => {
                info!("[RULE] Matched '{}'", rule.pattern);
                rule.to_result()
            }
            RuleOutcome::Unmatched => self.model_fallback(question, bundle).await,
        };
        result.with_concepts(bundle.concepts.clone())
    }

    async fn model_fallback(&self, question: &str, bundle: &KnowledgeBundle) -> ReasoningResult {
        let prompt = self.prompts.build(question, bundle);
        debug!(
            "[LLM] No rule matched, asking {} ({} chars)",
            self.model.model_name(),
            prompt.len()
        );

        match self.model.generate(&prompt).await {
            Ok(response) => {
                let answer = self.extractor.extract(&response);
                info!("[LLM] Answer: {}", answer);
                ReasoningResult::llm_based(answer, response)
            }
            Err(e) => {
                warn!("[LLM] Model call failed: {}", e);
                ReasoningResult::model_error(e)
            }
        }
    }
}

#[async_trait]
impl QuestionReasoner for TwoTierReasoner {
    async fn reason(
        &self,
        question: &str,
        bundle: &KnowledgeBundle,
    ) -> Result<ReasoningResult, StageError> {
        Ok(self.answer(question, bundle).await)
    }
}
