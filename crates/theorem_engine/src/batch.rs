//! Batch evaluation
//!
//! Runs independent `solve` calls over a dataset with a bounded number in
//! flight. Output order always matches input order. A task that panics only
//! fails its own question.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use theorem_common::{DatasetItem, WorkflowResult};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::coordinator::Coordinator;

/// One evaluated dataset entry
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    pub result: WorkflowResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.result.success).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// First `limit` failed entries, in dataset order
    pub fn failures(&self, limit: usize) -> Vec<&BatchEntry> {
        self.entries
            .iter()
            .filter(|e| !e.result.success)
            .take(limit)
            .collect()
    }

    /// First `limit` successful entries, in dataset order
    pub fn successes(&self, limit: usize) -> Vec<&BatchEntry> {
        self.entries
            .iter()
            .filter(|e| e.result.success)
            .take(limit)
            .collect()
    }
}

/// Solve every item with at most `concurrency` questions in flight
pub async fn evaluate(
    coordinator: Arc<Coordinator>,
    items: Vec<DatasetItem>,
    concurrency: usize,
) -> BatchReport {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let start = Instant::now();
    let total = items.len();

    info!(
        "Batch {} starting: {} questions, concurrency {}",
        run_id, total, concurrency
    );

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set = JoinSet::new();
    let mut slots: Vec<Option<WorkflowResult>> = vec![None; total];

    for (position, item) in items.iter().enumerate() {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let coordinator = coordinator.clone();
        let question = item.question.clone();

        join_set.spawn(async move {
            let _permit = permit;
            info!("[{}/{}] {}", position + 1, total, question);
            let result = coordinator.solve(&question).await;
            (position, result)
        });
    }

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((position, result)) => slots[position] = Some(result),
            Err(e) => warn!("Batch task aborted: {}", e),
        }
    }

    let entries: Vec<BatchEntry> = items
        .into_iter()
        .zip(slots)
        .map(|(item, slot)| {
            let result = slot.unwrap_or_else(|| {
                WorkflowResult::failed(item.question.clone(), "Question task panicked", 0)
            });
            BatchEntry {
                index: item.index,
                expected: item.expected,
                result,
            }
        })
        .collect();

    let report = BatchReport {
        run_id,
        started_at,
        duration_ms: start.elapsed().as_millis() as u64,
        entries,
    };

    info!(
        "Batch {} finished: {}/{} successful",
        run_id,
        report.succeeded(),
        report.total()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use theorem_common::{FakeModelClient, KnowledgeTable, ReasoningConfig};

    fn items(questions: &[&str]) -> Vec<DatasetItem> {
        questions
            .iter()
            .enumerate()
            .map(|(index, q)| DatasetItem {
                index,
                question: q.to_string(),
                expected: None,
            })
            .collect()
    }

    fn coordinator() -> Arc<Coordinator> {
        Arc::new(Coordinator::new(
            Arc::new(KnowledgeTable::builtin()),
            Arc::new(FakeModelClient::always("Answer: 42")),
            &ReasoningConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = evaluate(coordinator(), Vec::new(), 4).await;
        assert_eq!(report.total(), 0);
        assert_eq!(report.failed(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_batch_preserves_order() {
        let questions = [
            "Is 1 a prime number?",
            "Define a derivative",
            "What is the sum of angles in a triangle?",
            "Integrate x",
        ];
        let report = evaluate(coordinator(), items(&questions), 3).await;

        assert_eq!(report.total(), 4);
        assert_eq!(report.succeeded(), 4);
        for (entry, question) in report.entries.iter().zip(questions) {
            assert_eq!(entry.result.question, question);
        }
        assert_eq!(report.entries[0].result.answer(), Some("False"));
        assert_eq!(report.entries[2].result.answer(), Some("180 degrees"));
        assert_eq!(report.entries[3].result.answer(), Some("42"));
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let report = evaluate(coordinator(), items(&["Is 1 a prime number?"]), 0).await;
        assert_eq!(report.succeeded(), 1);
    }
}
