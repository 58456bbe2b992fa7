//! Stage faults
//!
//! The only hard failure the coordinator reports. Model unavailability is not
//! a stage fault; the reasoner folds it into its answer.

use theorem_common::Stage;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{stage} stage failed: {message}")]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
}

impl StageError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}
