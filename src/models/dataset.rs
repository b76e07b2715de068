//! Per-source datasets, summaries and diagnostics.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::{Node, Provenance, Relationship};

/// Aggregate counts over a node/relationship set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_nodes: usize,
    pub total_relationships: usize,
    pub events: usize,
    pub persons: usize,
    pub locations: usize,
    pub times: usize,
}

/// Script text that looked like a statement but did not match the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedStatement {
    /// 1-indexed line where the statement starts.
    pub line: usize,
    pub text: String,
    pub reason: String,
}

/// Leniency events recorded while building one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_statements: Vec<SkippedStatement>,
    /// References dropped because an endpoint had no candidate.
    #[serde(default)]
    pub dangling_references: usize,
    /// References with more than one candidate on some side.
    #[serde(default)]
    pub ambiguous_references: usize,
    /// Rows or records that could not be turned into graph content.
    #[serde(default)]
    pub skipped_records: usize,
    /// Node ids renamed because the source already used them.
    #[serde(default)]
    pub duplicate_ids: usize,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.skipped_statements.is_empty()
            && self.dangling_references == 0
            && self.ambiguous_references == 0
            && self.skipped_records == 0
            && self.duplicate_ids == 0
    }
}

/// Whether node ids are unique only within their source or already global.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdScope {
    /// Ids need a source prefix when merged (script variables, table ids).
    #[default]
    Local,
    /// Ids already embed the source key (path/record exports).
    Global,
}

/// Opaque row from a tabular relationship file, kept for counting and audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    /// File name the row came from.
    pub source_file: String,
    /// Human-readable description of the file.
    pub description: String,
    /// Raw row content keyed by column header, in header order.
    pub raw_data: Map<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

/// Normalized output of one source document.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    /// Display name.
    pub name: String,
    /// Short key used to prefix ids in the combined graph.
    pub key: String,
    /// File name of the source document.
    pub data_source: String,
    pub summary: Summary,
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<RelationshipRecord>,
    #[serde(skip_serializing_if = "Diagnostics::is_empty")]
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    pub id_scope: IdScope,
}
