//! Deterministic Rule Book
//!
//! Tier 1 of the reasoner. Patterns are matched by substring containment on
//! the lowercased question; the first registered match wins. A miss is not an
//! error, it hands the question to the model fallback.

use theorem_common::ReasoningResult;

/// One fixed answer
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Lowercase trigger phrase
    pub pattern: String,
    pub answer: String,
    pub explanation: String,
}

impl Rule {
    pub fn new(
        pattern: impl Into<String>,
        answer: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            pattern: pattern.into().to_lowercase(),
            answer: answer.into(),
            explanation: explanation.into(),
        }
    }

    pub fn to_result(&self) -> ReasoningResult {
        ReasoningResult::rule_based(&self.answer, &self.explanation)
    }
}

/// Tier 1 outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleOutcome<'a> {
    Matched(&'a Rule),
    Unmatched,
}

/// Ordered rule list; order is the tie-break
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: Vec<Rule>,
}

impl RuleBook {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            Rule::new(
                "is 1 a prime number",
                "False",
                "1 is not a prime number because it has only one positive divisor (1 itself), while prime numbers must have exactly two distinct positive divisors.",
            ),
            Rule::new(
                "sum of angles in a triangle",
                "180 degrees",
                "The sum of the interior angles of any Euclidean triangle is always 180 degrees.",
            ),
            Rule::new(
                "derivative of constant",
                "0",
                "The derivative of any constant function is zero because constants do not change.",
            ),
        ])
    }

    /// Append a rule after the existing ones
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn evaluate(&self, question: &str) -> RuleOutcome<'_> {
        let lowered = question.to_lowercase();
        self.rules
            .iter()
            .find(|rule| !rule.pattern.is_empty() && lowered.contains(&rule.pattern))
            .map_or(RuleOutcome::Unmatched, RuleOutcome::Matched)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use theorem_common::ReasoningMethod;

    #[test]
    fn test_prime_rule() {
        let book = RuleBook::builtin();
        let RuleOutcome::Matched(rule) = book.evaluate("Is 1 a prime number?") else {
            panic!("expected a rule match");
        };
        let result = rule.to_result();
        assert_eq!(result.answer, "False");
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.method, ReasoningMethod::RuleBased);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let book = RuleBook::builtin();
        assert!(matches!(
            book.evaluate("What is the SUM OF ANGLES IN A TRIANGLE?"),
            RuleOutcome::Matched(rule) if rule.answer == "180 degrees"
        ));
    }

    #[test]
    fn test_phrase_must_be_verbatim() {
        let book = RuleBook::builtin();
        assert!(matches!(
            book.evaluate("What is the derivative of constant c?"),
            RuleOutcome::Matched(rule) if rule.answer == "0"
        ));
        assert_eq!(
            book.evaluate("What is the derivative of a constant function?"),
            RuleOutcome::Unmatched
        );
    }

    #[test]
    fn test_first_registered_rule_wins() {
        let book = RuleBook::new(vec![
            Rule::new("prime", "first", ""),
            Rule::new("prime number", "second", ""),
        ]);
        assert!(matches!(
            book.evaluate("is 9 a prime number"),
            RuleOutcome::Matched(rule) if rule.answer == "first"
        ));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        let book = RuleBook::new(vec![Rule::new("", "anything", "")]);
        assert_eq!(book.evaluate("any question"), RuleOutcome::Unmatched);
    }

    #[test]
    fn test_with_rule_appends() {
        let book = RuleBook::builtin().with_rule(Rule::new("Euler's Identity", "e^{iπ} + 1 = 0", ""));
        assert_eq!(book.len(), 4);
        assert_eq!(book.rules()[3].pattern, "euler's identity");
    }
}
