//! Knowledge Table
//!
//! Immutable mapping from concept name to a fact record, plus keyword search
//! from free text to concept names.
//!
//! Fact records are schema-less: each concept carries whatever fields make
//! sense for it (`definition`, `examples`, `formula`, `rules`, ...). Callers
//! must treat every field as optional.
//!
//! The built-in table is compiled in. A versioned JSON file with the same
//! shape can replace it:
//!
//! ```json
//! { "version": 1,
//!   "concepts": [ { "name": "triangle", "triggers": [], "facts": { "definition": "..." } } ] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Version of the compiled-in table content
pub const BUILTIN_TABLE_VERSION: u32 = 1;

/// Errors raised while loading a table file
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid knowledge table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate concept '{0}' in knowledge table")]
    DuplicateConcept(String),

    #[error("Concept names must be non-empty and lowercase, got '{0}'")]
    InvalidName(String),
}

// ============================================================================
// Fact Records
// ============================================================================

/// Schema-less fact record for one concept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactRecord(Map<String, Value>);

impl FactRecord {
    /// Wrap a JSON object. Anything else is not a record.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String field, if present and actually a string
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// The `definition` field, when the concept has one
    pub fn definition(&self) -> Option<&str> {
        self.text("definition")
    }

    /// String items of an array field; non-string items are skipped
    pub fn list(&self, field: &str) -> Vec<&str> {
        self.0
            .get(field)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Concept Entries
// ============================================================================

/// One registered concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptEntry {
    /// Canonical name, also the lookup key
    pub name: String,
    /// Extra phrases that select this concept besides its name
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub facts: FactRecord,
}

impl ConceptEntry {
    fn new(name: &str, triggers: &[&str], facts: Value) -> Self {
        Self {
            name: name.to_string(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            facts: FactRecord::from_value(facts).unwrap_or_default(),
        }
    }

    /// `lowered` must already be lowercase
    fn matches(&self, lowered: &str) -> bool {
        lowered.contains(&self.name) || self.triggers.iter().any(|t| lowered.contains(t.as_str()))
    }
}

#[derive(Debug, Deserialize)]
struct TableFile {
    version: u32,
    concepts: Vec<ConceptEntry>,
}

// ============================================================================
// Table
// ============================================================================

/// Read-only concept table, shared by every question
#[derive(Debug, Clone)]
pub struct KnowledgeTable {
    version: u32,
    entries: Vec<ConceptEntry>,
}

impl KnowledgeTable {
    /// The compiled-in table
    pub fn builtin() -> Self {
        let entries = vec![
            ConceptEntry::new(
                "prime_number",
                &["prime", "primality"],
                json!({
                    "definition": "A prime number is a natural number greater than 1 that has no positive divisors other than 1 and itself.",
                    "examples": ["2", "3", "5", "7", "11"],
                    "counterexamples": ["1", "4", "6", "8", "9"],
                    "key_facts": ["1 is not a prime number", "2 is the only even prime number"]
                }),
            ),
            ConceptEntry::new(
                "triangle",
                &[],
                json!({
                    "definition": "A triangle is a polygon with three edges and three vertices.",
                    "angle_sum": "The sum of the interior angles of a triangle is always 180 degrees.",
                    "types": ["equilateral", "isosceles", "scalene", "right", "acute", "obtuse"]
                }),
            ),
            ConceptEntry::new(
                "pythagorean_theorem",
                &["pythagoras", "right triangle"],
                json!({
                    "statement": "In a right triangle, the square of the hypotenuse equals the sum of the squares of the other two sides.",
                    "formula": "a² + b² = c²",
                    "conditions": ["Only applies to right triangles", "c must be the hypotenuse"]
                }),
            ),
            ConceptEntry::new(
                "derivative",
                &[],
                json!({
                    "definition": "The derivative of a function measures the sensitivity to change of the function value with respect to a change in its argument.",
                    "rules": {
                        "constant": "d/dx[c] = 0",
                        "power": "d/dx[xⁿ] = n*xⁿ⁻¹",
                        "sum": "d/dx[f(x) + g(x)] = f'(x) + g'(x)"
                    }
                }),
            ),
        ];

        Self {
            version: BUILTIN_TABLE_VERSION,
            entries,
        }
    }

    /// Build a table from entries, normalising trigger phrases to lowercase
    pub fn from_entries(version: u32, entries: Vec<ConceptEntry>) -> Result<Self, KnowledgeError> {
        let mut seen = HashSet::new();
        let mut normalised = Vec::with_capacity(entries.len());

        for mut entry in entries {
            if entry.name.is_empty() || entry.name != entry.name.to_lowercase() {
                return Err(KnowledgeError::InvalidName(entry.name));
            }
            if !seen.insert(entry.name.clone()) {
                return Err(KnowledgeError::DuplicateConcept(entry.name));
            }
            entry.triggers = entry
                .triggers
                .into_iter()
                .map(|t| t.to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
            normalised.push(entry);
        }

        Ok(Self {
            version,
            entries: normalised,
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self, KnowledgeError> {
        let file: TableFile = serde_json::from_str(content)?;
        Self::from_entries(file.version, file.concepts)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, KnowledgeError> {
        let content = fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json_str(&content)?;
        debug!(
            "Loaded knowledge table v{} from {} ({} concepts)",
            table.version,
            path.display(),
            table.len()
        );
        Ok(table)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fact record for a concept; the name is matched case-insensitively
    pub fn lookup(&self, concept: &str) -> Option<&FactRecord> {
        let key = concept.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.name == key)
            .map(|entry| &entry.facts)
    }

    pub fn contains(&self, concept: &str) -> bool {
        self.lookup(concept).is_some()
    }

    /// Concepts mentioned by `text`, in table order
    pub fn search(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.matches(&lowered))
            .map(|entry| entry.name.clone())
            .collect()
    }

    pub fn concept_names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn entries(&self) -> &[ConceptEntry] {
        &self.entries
    }
}

impl Default for KnowledgeTable {
    fn default() -> Self {
        Self::builtin()
    }
}
