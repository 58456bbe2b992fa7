//! Dataset records
//!
//! A dataset is a JSON array of objects. The question text lives under
//! `Question` or `question`; a record without usable text gets a placeholder
//! instead of failing the whole batch.

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Question text used for records that carry none
pub const PLACEHOLDER_QUESTION: &str = "Unknown question";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dataset JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Dataset must be a JSON array of records")]
    NotAnArray,
}

/// One resolved dataset entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetItem {
    /// Position in the source file
    pub index: usize,
    pub question: String,
    /// Reference answer, when the record has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

fn non_empty_str<'a>(record: &'a Value, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// `Question` first, then `question`, then the placeholder
pub fn resolve_question(record: &Value) -> String {
    non_empty_str(record, "Question")
        .or_else(|| non_empty_str(record, "question"))
        .unwrap_or(PLACEHOLDER_QUESTION)
        .to_string()
}

fn resolve_expected(record: &Value) -> Option<String> {
    let value = record.get("Answer").or_else(|| record.get("answer"))?;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub fn parse_dataset(content: &str) -> Result<Vec<DatasetItem>, DatasetError> {
    let value: Value = serde_json::from_str(content)?;
    let records = value.as_array().ok_or(DatasetError::NotAnArray)?;

    Ok(records
        .iter()
        .enumerate()
        .map(|(index, record)| DatasetItem {
            index,
            question: resolve_question(record),
            expected: resolve_expected(record),
        })
        .collect())
}

pub fn load_dataset(path: &Path) -> Result<Vec<DatasetItem>, DatasetError> {
    let content = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dataset(&content)
}
