//! Knowledge Aggregator
//!
//! Gathers fact records for the classifier's concepts and scores coverage.

use std::collections::BTreeMap;
use std::sync::Arc;
use theorem_common::{KnowledgeBundle, KnowledgeTable};
use tracing::debug;

use crate::error::StageError;

/// Knowledge gathering stage
pub trait KnowledgeGatherer: Send + Sync {
    fn gather(&self, concepts: &[String]) -> Result<KnowledgeBundle, StageError>;
}

pub struct KnowledgeAggregator {
    table: Arc<KnowledgeTable>,
}

impl KnowledgeAggregator {
    pub fn new(table: Arc<KnowledgeTable>) -> Self {
        Self { table }
    }

    /// Collect records; unknown concepts still count towards coverage
    pub fn collect(&self, concepts: &[String]) -> KnowledgeBundle {
        let mut requested: Vec<String> = Vec::with_capacity(concepts.len());
        for concept in concepts {
            if !requested.contains(concept) {
                requested.push(concept.clone());
            }
        }

        let facts: BTreeMap<_, _> = requested
            .iter()
            .filter_map(|name| {
                self.table
                    .lookup(name)
                    .map(|record| (name.clone(), record.clone()))
            })
            .collect();

        let bundle = KnowledgeBundle::new(requested, facts);
        debug!(
            "Gathered {}/{} concepts (coverage {:.2})",
            bundle.facts.len(),
            bundle.concepts.len(),
            bundle.coverage
        );
        bundle
    }
}

impl KnowledgeGatherer for KnowledgeAggregator {
    fn gather(&self, concepts: &[String]) -> Result<KnowledgeBundle, StageError> {
        Ok(self.collect(concepts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator() -> KnowledgeAggregator {
        KnowledgeAggregator::new(Arc::new(KnowledgeTable::builtin()))
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_request_has_zero_coverage() {
        let bundle = aggregator().collect(&[]);
        assert_eq!(bundle.coverage, 0.0);
        assert!(bundle.facts.is_empty());
    }

    #[test]
    fn test_single_known_concept_full_coverage() {
        let bundle = aggregator().collect(&names(&["prime_number"]));
        assert_eq!(bundle.coverage, 1.0);
        assert!(bundle.fact("prime_number").is_some());
    }

    #[test]
    fn test_missing_concepts_lower_coverage() {
        let bundle = aggregator().collect(&names(&["triangle", "manifold", "group"]));
        assert!((bundle.coverage - 1.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(bundle.concepts.len(), 3);
        assert_eq!(bundle.facts.len(), 1);
    }

    #[test]
    fn test_duplicate_requests_collapse() {
        let bundle = aggregator().collect(&names(&["derivative", "derivative"]));
        assert_eq!(bundle.concepts, names(&["derivative"]));
        assert_eq!(bundle.coverage, 1.0);
    }

    #[test]
    fn test_gather_never_fails() {
        assert!(aggregator().gather(&names(&["nothing"])).is_ok());
    }
}
