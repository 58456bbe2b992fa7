//! Coordinator
//!
//! Runs one question through its workflow:
//! classify -> workflow lookup -> [gather] -> [reason] -> WorkflowResult
//!
//! The classifier always runs first and its question type picks the
//! workflow. A stage fault, including a panic inside a stage, stops the
//! remaining stages and the call reports failure with no partial results.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use theorem_common::{
    FinalAnswer, KnowledgeBundle, KnowledgeTable, ModelClient, ReasoningConfig, Stage, Workflow,
    WorkflowResult,
};
use tracing::{info, warn};

use crate::aggregator::{KnowledgeAggregator, KnowledgeGatherer};
use crate::classifier::{KeywordClassifier, QuestionClassifier};
use crate::error::StageError;
use crate::reasoner::{QuestionReasoner, TwoTierReasoner};

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

struct Completed {
    workflow: Workflow,
    steps: Vec<Stage>,
    answer: FinalAnswer,
}

/// Stage wiring for `solve`; cheap to clone and share across tasks
#[derive(Clone)]
pub struct Coordinator {
    classifier: Arc<dyn QuestionClassifier>,
    gatherer: Arc<dyn KnowledgeGatherer>,
    reasoner: Arc<dyn QuestionReasoner>,
}

impl Coordinator {
    /// Standard stages over a shared table and model client
    pub fn new(
        table: Arc<KnowledgeTable>,
        model: Arc<dyn ModelClient>,
        reasoning: &ReasoningConfig,
    ) -> Self {
        Self {
            classifier: Arc::new(KeywordClassifier::new(table.clone())),
            gatherer: Arc::new(KnowledgeAggregator::new(table)),
            reasoner: Arc::new(TwoTierReasoner::new(model, reasoning)),
        }
    }

    pub fn from_stages(
        classifier: Arc<dyn QuestionClassifier>,
        gatherer: Arc<dyn KnowledgeGatherer>,
        reasoner: Arc<dyn QuestionReasoner>,
    ) -> Self {
        Self {
            classifier,
            gatherer,
            reasoner,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn QuestionClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_gatherer(mut self, gatherer: Arc<dyn KnowledgeGatherer>) -> Self {
        self.gatherer = gatherer;
        self
    }

    pub fn with_reasoner(mut self, reasoner: Arc<dyn QuestionReasoner>) -> Self {
        self.reasoner = reasoner;
        self
    }

    /// Process one question. Never returns an error; faults are reported in
    /// the result.
    pub async fn solve(&self, question: &str) -> WorkflowResult {
        let start = Instant::now();
        info!("Processing question: {}", question);

        let outcome = AssertUnwindSafe(self.run(question)).catch_unwind().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(done)) => WorkflowResult::completed(
                question,
                done.workflow,
                done.steps,
                done.answer,
                duration_ms,
            ),
            Ok(Err(e)) => {
                warn!("Question failed: {}", e);
                WorkflowResult::failed(question, e.to_string(), duration_ms)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("Question aborted by a stage panic: {}", message);
                WorkflowResult::failed(
                    question,
                    format!("Internal error: {}", message),
                    duration_ms,
                )
            }
        }
    }

    async fn run(&self, question: &str) -> Result<Completed, StageError> {
        let mut steps = Vec::with_capacity(3);

        let parsed = self.classifier.classify(question)?;
        steps.push(Stage::Classify);

        let workflow = Workflow::for_question_type(parsed.question_type);
        info!(
            "Selected workflow {} for {} question",
            workflow, parsed.question_type
        );

        let bundle = if workflow.runs(Stage::Gather) {
            let bundle = self.gatherer.gather(&parsed.concepts)?;
            steps.push(Stage::Gather);
            Some(bundle)
        } else {
            None
        };

        if !workflow.runs(Stage::Reason) {
            return Ok(Completed {
                workflow,
                steps,
                answer: FinalAnswer::KnowledgeOnly(bundle.unwrap_or_default()),
            });
        }

        let bundle = bundle.unwrap_or_else(KnowledgeBundle::empty);
        let reasoning = self.reasoner.reason(question, &bundle).await?;
        steps.push(Stage::Reason);

        Ok(Completed {
            workflow,
            steps,
            answer: FinalAnswer::Reasoned(reasoning),
        })
    }
}
