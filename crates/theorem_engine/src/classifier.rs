//! Question Classifier
//!
//! Keyword classification into a closed set of question types. Keyword sets
//! are tested in a fixed priority order and the first hit wins, so a question
//! mentioning both "true" and "calculate" is a boolean verification.

use std::sync::Arc;
use theorem_common::{KnowledgeTable, ParseFlags, ParseResult, QuestionType};
use tracing::debug;

use crate::error::StageError;

/// Checked first
pub const BOOLEAN_KEYWORDS: &[&str] = &["true", "false", "correct", "incorrect"];
/// "what is" shadows "what is a", so those questions are calculations
pub const CALCULATION_KEYWORDS: &[&str] = &["calculate", "compute", "what is", "="];
pub const DEFINITION_KEYWORDS: &[&str] = &["definition", "define", "what is a"];
/// Decide `needs_computation` independently of the question type
pub const COMPUTATION_KEYWORDS: &[&str] = &["calculate", "compute"];
pub const PROOF_KEYWORDS: &[&str] = &["prove", "show that", "demonstrate"];

/// First pipeline stage
pub trait QuestionClassifier: Send + Sync {
    fn classify(&self, question: &str) -> Result<ParseResult, StageError>;
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Question type for already-lowercased text
pub fn detect_question_type(lowered: &str) -> QuestionType {
    if contains_any(lowered, BOOLEAN_KEYWORDS) {
        QuestionType::BooleanVerification
    } else if contains_any(lowered, CALCULATION_KEYWORDS) {
        QuestionType::Calculation
    } else if contains_any(lowered, DEFINITION_KEYWORDS) {
        QuestionType::DefinitionQuery
    } else if contains_any(lowered, PROOF_KEYWORDS) {
        QuestionType::Proof
    } else {
        QuestionType::GeneralReasoning
    }
}

/// Keyword classifier backed by the knowledge table's concept search
pub struct KeywordClassifier {
    table: Arc<KnowledgeTable>,
}

impl KeywordClassifier {
    pub fn new(table: Arc<KnowledgeTable>) -> Self {
        Self { table }
    }

    /// Infallible classification
    pub fn parse(&self, question: &str) -> ParseResult {
        let lowered = question.to_lowercase();
        let question_type = detect_question_type(&lowered);
        let concepts = self.table.search(question);

        let parsed = ParseResult {
            question_type,
            concepts,
            flags: ParseFlags {
                needs_knowledge: question_type.needs_knowledge(),
                needs_computation: contains_any(&lowered, COMPUTATION_KEYWORDS),
            },
        };

        debug!("Classified question:\n{}", parsed.summary());
        parsed
    }
}

impl QuestionClassifier for KeywordClassifier {
    fn classify(&self, question: &str) -> Result<ParseResult, StageError> {
        Ok(self.parse(question))
    }
}
