//! Pipeline Types
//!
//! Values exchanged between the classifier, the knowledge aggregator, the
//! reasoner and the coordinator. Every value lives for a single `solve` call
//! and is never mutated after the stage that produced it returns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::knowledge::FactRecord;

/// Confidence attached to a matched deterministic rule
pub const RULE_CONFIDENCE: f64 = 1.0;

/// Confidence attached to any answer produced by the model
pub const LLM_CONFIDENCE: f64 = 0.7;

/// Answer text reported when the model call fails
pub const ERROR_ANSWER: &str = "ERROR";

// ============================================================================
// Classification
// ============================================================================

/// Question shapes recognised by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// "Is it true that...", "correct or incorrect"
    BooleanVerification,
    /// "Calculate...", "compute...", "what is...", equations
    Calculation,
    /// "Define...", "what is a..."
    DefinitionQuery,
    /// "Prove...", "show that..."
    Proof,
    /// Anything else
    GeneralReasoning,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BooleanVerification => "boolean_verification",
            Self::Calculation => "calculation",
            Self::DefinitionQuery => "definition_query",
            Self::Proof => "proof",
            Self::GeneralReasoning => "general_reasoning",
        }
    }

    /// Does answering this type lean on stored definitions?
    pub fn needs_knowledge(&self) -> bool {
        matches!(self, Self::DefinitionQuery | Self::Proof)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing hints derived from the question type and its keywords
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFlags {
    pub needs_knowledge: bool,
    pub needs_computation: bool,
}

/// Classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub question_type: QuestionType,
    /// Knowledge table keys mentioned by the question, in table order
    pub concepts: Vec<String>,
    pub flags: ParseFlags,
}

impl ParseResult {
    /// Human-readable analysis, one field per line
    pub fn summary(&self) -> String {
        let concepts = if self.concepts.is_empty() {
            "(none)".to_string()
        } else {
            self.concepts.join(", ")
        };
        format!(
            "Question type: {}\nNeeds knowledge: {}\nNeeds computation: {}\nConcepts: {}",
            self.question_type,
            self.flags.needs_knowledge,
            self.flags.needs_computation,
            concepts
        )
    }
}

// ============================================================================
// Knowledge
// ============================================================================

/// Fact records gathered for a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBundle {
    /// Requested concept names, duplicates removed
    pub concepts: Vec<String>,
    /// Records found, keyed by concept name
    pub facts: BTreeMap<String, FactRecord>,
    /// `facts.len() / max(1, concepts.len())`
    pub coverage: f64,
}

impl KnowledgeBundle {
    /// Build a bundle, dropping facts for concepts that were not requested
    pub fn new(concepts: Vec<String>, mut facts: BTreeMap<String, FactRecord>) -> Self {
        facts.retain(|name, _| concepts.contains(name));
        let coverage = facts.len() as f64 / concepts.len().max(1) as f64;
        Self {
            concepts,
            facts,
            coverage,
        }
    }

    /// Bundle handed to the reasoner when knowledge gathering was skipped
    pub fn empty() -> Self {
        Self::new(Vec::new(), BTreeMap::new())
    }

    pub fn fact(&self, concept: &str) -> Option<&FactRecord> {
        self.facts.get(concept)
    }
}

impl Default for KnowledgeBundle {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// Reasoning
// ============================================================================

/// Which tier produced an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningMethod {
    RuleBased,
    LlmBased,
    Error,
}

impl ReasoningMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuleBased => "rule_based",
            Self::LlmBased => "llm_based",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ReasoningMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasoner output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningResult {
    pub answer: String,
    pub reasoning: String,
    /// 1.0 for rules, 0.7 for model answers, 0.0 on model failure
    pub confidence: f64,
    pub method: ReasoningMethod,
    /// Concepts available to the reasoner when it answered
    #[serde(default)]
    pub concepts_applied: Vec<String>,
}

impl ReasoningResult {
    pub fn rule_based(answer: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            reasoning: reasoning.into(),
            confidence: RULE_CONFIDENCE,
            method: ReasoningMethod::RuleBased,
            concepts_applied: Vec::new(),
        }
    }

    /// Answer extracted from a model response; the full response is kept as reasoning
    pub fn llm_based(answer: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            reasoning: response.into(),
            confidence: LLM_CONFIDENCE,
            method: ReasoningMethod::LlmBased,
            concepts_applied: Vec::new(),
        }
    }

    pub fn model_error(error: impl fmt::Display) -> Self {
        Self {
            answer: ERROR_ANSWER.to_string(),
            reasoning: format!("LLM reasoning failed: {}", error),
            confidence: 0.0,
            method: ReasoningMethod::Error,
            concepts_applied: Vec::new(),
        }
    }

    pub fn with_concepts(mut self, concepts: Vec<String>) -> Self {
        self.concepts_applied = concepts;
        self
    }
}

// ============================================================================
// Workflows
// ============================================================================

/// One unit of work inside a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classify,
    Gather,
    Reason,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classify => "classify",
            Self::Gather => "gather",
            Self::Reason => "reason",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three fixed stage sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    /// classify -> gather -> reason
    Default,
    /// classify -> reason
    SimpleVerification,
    /// classify -> gather
    DefinitionQuery,
}

impl Workflow {
    /// Route a classified question to its workflow
    pub fn for_question_type(question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::BooleanVerification => Self::SimpleVerification,
            QuestionType::DefinitionQuery => Self::DefinitionQuery,
            QuestionType::Calculation | QuestionType::Proof | QuestionType::GeneralReasoning => {
                Self::Default
            }
        }
    }

    pub fn stages(&self) -> &'static [Stage] {
        match self {
            Self::Default => &[Stage::Classify, Stage::Gather, Stage::Reason],
            Self::SimpleVerification => &[Stage::Classify, Stage::Reason],
            Self::DefinitionQuery => &[Stage::Classify, Stage::Gather],
        }
    }

    pub fn runs(&self, stage: Stage) -> bool {
        self.stages().contains(&stage)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::SimpleVerification => "simple_verification",
            Self::DefinitionQuery => "definition_query",
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful workflow hands back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FinalAnswer {
    /// The reasoner ran
    Reasoned(ReasoningResult),
    /// The workflow stopped after gathering knowledge
    KnowledgeOnly(KnowledgeBundle),
}

impl FinalAnswer {
    /// Answer text, when the reasoner produced one
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Reasoned(result) => Some(&result.answer),
            Self::KnowledgeOnly(_) => None,
        }
    }

    pub fn method_label(&self) -> &'static str {
        match self {
            Self::Reasoned(result) => result.method.as_str(),
            Self::KnowledgeOnly(_) => "knowledge_only",
        }
    }

    pub fn reasoning(&self) -> Option<&ReasoningResult> {
        match self {
            Self::Reasoned(result) => Some(result),
            Self::KnowledgeOnly(_) => None,
        }
    }
}

/// Outcome of one `solve` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub success: bool,
    /// Present exactly when `success` is true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<FinalAnswer>,
    /// Stages that completed, in execution order
    #[serde(default)]
    pub intermediate_steps: Vec<Stage>,
    /// Stages of the selected workflow
    #[serde(default)]
    pub workflow_used: Vec<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<Workflow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub question: String,
    pub duration_ms: u64,
}

impl WorkflowResult {
    pub fn completed(
        question: impl Into<String>,
        workflow: Workflow,
        intermediate_steps: Vec<Stage>,
        final_answer: FinalAnswer,
        duration_ms: u64,
    ) -> Self {
        Self {
            success: true,
            final_answer: Some(final_answer),
            intermediate_steps,
            workflow_used: workflow.stages().to_vec(),
            workflow: Some(workflow),
            error: None,
            question: question.into(),
            duration_ms,
        }
    }

    /// A failed call keeps no partial results
    pub fn failed(question: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            final_answer: None,
            intermediate_steps: Vec::new(),
            workflow_used: Vec::new(),
            workflow: None,
            error: Some(error.into()),
            question: question.into(),
            duration_ms,
        }
    }

    pub fn answer(&self) -> Option<&str> {
        self.final_answer.as_ref().and_then(FinalAnswer::answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(definition: &str) -> FactRecord {
        FactRecord::from_value(serde_json::json!({ "definition": definition }))
            .expect("object record")
    }

    #[test]
    fn test_empty_bundle_has_zero_coverage() {
        let bundle = KnowledgeBundle::empty();
        assert!(bundle.concepts.is_empty());
        assert!(bundle.facts.is_empty());
        assert_eq!(bundle.coverage, 0.0);
    }

    #[test]
    fn test_bundle_coverage_counts_missing_concepts() {
        let mut facts = BTreeMap::new();
        facts.insert("triangle".to_string(), record("three sides"));
        let bundle = KnowledgeBundle::new(
            vec!["triangle".to_string(), "tesseract".to_string()],
            facts,
        );
        assert_eq!(bundle.coverage, 0.5);
    }

    #[test]
    fn test_bundle_drops_unrequested_facts() {
        let mut facts = BTreeMap::new();
        facts.insert("triangle".to_string(), record("three sides"));
        facts.insert("derivative".to_string(), record("rate of change"));
        let bundle = KnowledgeBundle::new(vec!["triangle".to_string()], facts);
        assert_eq!(bundle.facts.len(), 1);
        assert!(bundle.fact("derivative").is_none());
        assert_eq!(bundle.coverage, 1.0);
    }

    #[test]
    fn test_workflow_routing_table() {
        assert_eq!(
            Workflow::for_question_type(QuestionType::BooleanVerification),
            Workflow::SimpleVerification
        );
        assert_eq!(
            Workflow::for_question_type(QuestionType::DefinitionQuery),
            Workflow::DefinitionQuery
        );
        assert_eq!(
            Workflow::for_question_type(QuestionType::Calculation),
            Workflow::Default
        );
        assert_eq!(
            Workflow::for_question_type(QuestionType::Proof),
            Workflow::Default
        );
        assert_eq!(
            Workflow::for_question_type(QuestionType::GeneralReasoning),
            Workflow::Default
        );
    }

    #[test]
    fn test_workflow_stage_sequences() {
        assert_eq!(
            Workflow::Default.stages(),
            &[Stage::Classify, Stage::Gather, Stage::Reason]
        );
        assert!(!Workflow::SimpleVerification.runs(Stage::Gather));
        assert!(!Workflow::DefinitionQuery.runs(Stage::Reason));
    }

    #[test]
    fn test_model_error_result() {
        let result = ReasoningResult::model_error("connection refused");
        assert_eq!(result.answer, ERROR_ANSWER);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.method, ReasoningMethod::Error);
        assert!(result.reasoning.contains("connection refused"));
    }

    #[test]
    fn test_failed_result_has_no_answer() {
        let result = WorkflowResult::failed("q", "boom", 3);
        assert!(!result.success);
        assert!(result.final_answer.is_none());
        assert!(result.intermediate_steps.is_empty());
        assert_eq!(result.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_final_answer_serializes_with_kind_tag() {
        let answer = FinalAnswer::Reasoned(ReasoningResult::rule_based("0", "constant"));
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["kind"], "reasoned");
        assert_eq!(json["method"], "rule_based");

        let knowledge = FinalAnswer::KnowledgeOnly(KnowledgeBundle::empty());
        assert_eq!(knowledge.method_label(), "knowledge_only");
        assert!(knowledge.answer().is_none());
    }

    #[test]
    fn test_parse_summary_lists_concepts() {
        let parsed = ParseResult {
            question_type: QuestionType::Proof,
            concepts: vec!["triangle".to_string()],
            flags: ParseFlags {
                needs_knowledge: true,
                needs_computation: false,
            },
        };
        let summary = parsed.summary();
        assert!(summary.contains("Question type: proof"));
        assert!(summary.contains("Concepts: triangle"));
    }
}
