//! Theorem Common - shared types for the Theorem question pipeline
//!
//! Data model, knowledge table, model client seam, configuration and dataset
//! records. The engine and the CLI both build on this crate.

pub mod config;
pub mod dataset;
pub mod knowledge;
pub mod llm_client;
pub mod types;

pub use config::{BatchConfig, KnowledgeConfig, LoggingConfig, ReasoningConfig, TheoremConfig};
pub use dataset::{load_dataset, parse_dataset, DatasetError, DatasetItem, PLACEHOLDER_QUESTION};
pub use knowledge::{ConceptEntry, FactRecord, KnowledgeError, KnowledgeTable};
pub use llm_client::{FakeModelClient, ModelClient, ModelConfig, ModelError, OllamaClient};
pub use types::*;
