//! Reasoning prompt and answer extraction for the model fallback.

use theorem_common::{KnowledgeBundle, ReasoningConfig};

/// Builds the Tier 2 prompt from the question and gathered definitions
#[derive(Debug, Clone)]
pub struct ReasoningPromptBuilder {
    answer_prefix: String,
}

impl Default for ReasoningPromptBuilder {
    fn default() -> Self {
        Self::new("Answer")
    }
}

impl ReasoningPromptBuilder {
    pub fn new(answer_prefix: impl Into<String>) -> Self {
        Self {
            answer_prefix: answer_prefix.into(),
        }
    }

    /// Concepts are listed in bundle order; those without a definition are skipped.
    pub fn build(&self, question: &str, bundle: &KnowledgeBundle) -> String {
        let mut prompt = format!(
            "Please act as a mathematics expert and answer the following mathematical question.\n\n\
             Question: {}\n\n",
            question
        );

        let snippets: Vec<String> = bundle
            .concepts
            .iter()
            .filter_map(|concept| {
                bundle
                    .fact(concept)
                    .and_then(|record| record.definition())
                    .map(|definition| format!("- {}: {}\n", concept, definition))
            })
            .collect();

        if !snippets.is_empty() {
            prompt.push_str("Relevant mathematical knowledge:\n");
            for snippet in snippets {
                prompt.push_str(&snippet);
            }
        }

        prompt.push_str(&format!(
            "\nPlease reason step by step:\n\
             1. Analyze the problem type and requirements\n\
             2. Apply relevant mathematical knowledge\n\
             3. Perform logical reasoning\n\
             4. Provide the final answer\n\n\
             Please answer in the following format:\n\
             {prefix}: [your answer]\n\
             Reasoning: [detailed reasoning process]\n",
            prefix = self.answer_prefix
        ));

        prompt
    }
}

/// Pulls the answer out of a free-form model response
#[derive(Debug, Clone)]
pub struct AnswerExtractor {
    marker: String,
    max_chars: usize,
}

impl Default for AnswerExtractor {
    fn default() -> Self {
        Self::from_config(&ReasoningConfig::default())
    }
}

impl AnswerExtractor {
    pub fn new(answer_prefix: &str, max_chars: usize) -> Self {
        Self {
            marker: format!("{}:", answer_prefix),
            max_chars,
        }
    }

    pub fn from_config(config: &ReasoningConfig) -> Self {
        Self::new(&config.answer_prefix, config.max_answer_chars)
    }

    /// First line starting with the marker wins; the text after its first
    /// colon is trimmed. Without such a line the response is truncated.
    pub fn extract(&self, response: &str) -> String {
        response
            .lines()
            .find(|line| line.starts_with(&self.marker))
            .and_then(|line| line.split_once(':'))
            .map(|(_, rest)| rest.trim().to_string())
            .unwrap_or_else(|| response.chars().take(self.max_chars).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use theorem_common::KnowledgeTable;

    use crate::aggregator::KnowledgeAggregator;

    fn bundle(concepts: &[&str]) -> KnowledgeBundle {
        let aggregator = KnowledgeAggregator::new(Arc::new(KnowledgeTable::builtin()));
        let names: Vec<String> = concepts.iter().map(|s| s.to_string()).collect();
        aggregator.collect(&names)
    }

    #[test]
    fn test_prompt_without_knowledge() {
        let prompt = ReasoningPromptBuilder::default().build("What is 2+2?", &KnowledgeBundle::empty());
        assert!(prompt.contains("Question: What is 2+2?"));
        assert!(!prompt.contains("Relevant mathematical knowledge"));
        assert!(prompt.contains("Answer: [your answer]"));
    }

    #[test]
    fn test_prompt_lists_definitions_in_bundle_order() {
        let prompt = ReasoningPromptBuilder::default()
            .build("q", &bundle(&["triangle", "prime_number"]));
        let triangle = prompt.find("- triangle: A triangle is a polygon").unwrap();
        let prime = prompt.find("- prime_number: A prime number").unwrap();
        assert!(triangle < prime);
    }

    #[test]
    fn test_prompt_skips_concepts_without_definition() {
        let prompt = ReasoningPromptBuilder::default()
            .build("q", &bundle(&["pythagorean_theorem", "missing"]));
        assert!(!prompt.contains("pythagorean_theorem"));
        assert!(!prompt.contains("Relevant mathematical knowledge"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let builder = ReasoningPromptBuilder::default();
        let b = bundle(&["derivative"]);
        assert_eq!(builder.build("q", &b), builder.build("q", &b));
    }

    #[test]
    fn test_extract_answer_line() {
        let extractor = AnswerExtractor::default();
        let response = "Let me think.\nAnswer:   42  \nReasoning: because";
        assert_eq!(extractor.extract(response), "42");
    }

    #[test]
    fn test_extract_keeps_later_colons() {
        let extractor = AnswerExtractor::default();
        assert_eq!(extractor.extract("Answer: ratio 3:4"), "ratio 3:4");
    }

    #[test]
    fn test_extract_first_answer_line_wins() {
        let extractor = AnswerExtractor::default();
        assert_eq!(extractor.extract("Answer: first\nAnswer: second"), "first");
    }

    #[test]
    fn test_extract_prefix_is_case_sensitive_and_anchored() {
        let extractor = AnswerExtractor::default();
        let response = "answer: lowercase\n  Answer: indented";
        assert_eq!(extractor.extract(response), response);
    }

    #[test]
    fn test_extract_truncates_without_answer_line() {
        let extractor = AnswerExtractor::default();
        let response = "x".repeat(250);
        assert_eq!(extractor.extract(&response).len(), 100);
    }

    #[test]
    fn test_extract_truncation_respects_char_boundaries() {
        let extractor = AnswerExtractor::new("Answer", 3);
        assert_eq!(extractor.extract("a²+b²=c²"), "a²+");
    }

    #[test]
    fn test_custom_prefix() {
        let extractor = AnswerExtractor::new("Final", 100);
        assert_eq!(extractor.extract("Answer: no\nFinal: yes"), "yes");
    }
}
