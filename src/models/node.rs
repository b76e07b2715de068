//! Canonical node and relationship records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Properties, PropertyValue};

/// Property used as the default resolution key.
pub const NAME_KEY: &str = "name";

/// Origin of a record in the combined graph.
///
/// Attached when a dataset is folded into the combined graph, never at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Dataset name the record came from.
    pub source_name: String,
    /// Wall-clock time of the fold.
    pub import_timestamp: DateTime<Utc>,
}

/// A graph vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique within the originating source; globally unique after merging.
    pub id: String,
    /// Ordered category tags, duplicates removed.
    pub labels: Vec<String>,
    /// Typed scalar properties.
    pub properties: Properties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

impl Node {
    /// Creates a node, dropping repeated labels while keeping their order.
    pub fn new(id: impl Into<String>, labels: Vec<String>, properties: Properties) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(labels.len());
        for label in labels {
            if !unique.contains(&label) {
                unique.push(label);
            }
        }

        Self {
            id: id.into(),
            labels: unique,
            properties,
            provenance: None,
        }
    }

    /// The `name` property, if present.
    pub fn name(&self) -> Option<&PropertyValue> {
        self.properties.get(NAME_KEY)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// A directed, typed edge between two resolved nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: String,
    pub target_id: String,
    /// Relationship kind.
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

impl Relationship {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        rel_type: impl Into<String>,
        properties: Properties,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            rel_type: rel_type.into(),
            properties,
            provenance: None,
        }
    }
}
