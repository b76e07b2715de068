//! Path/record JSON exports (Neo4j Browser style).
//!
//! A document is an array of records. Each record field may hold a path
//! (`{start, end, segments}`), a bare relationship (`{identity, start, end,
//! type}`) or a bare node (`{identity, labels, properties}`); both the
//! path-wrapped and the `n`/`r`/`m` record shapes go through the same
//! identity-deduplication.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::{LocalGraph, SourceLoader};
use crate::config::PathExpansion;
use crate::error::AppError;
use crate::models::{
    join_split_integer, Endpoint, IdScope, Node, Properties, PropertyValue, UnresolvedReference,
};

/// Internal numeric identity, plain or as a Neo4j `{low, high}` integer.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Identity {
    Plain(i64),
    Split { low: i64, high: i64 },
}

impl Identity {
    fn value(self) -> i64 {
        match self {
            Identity::Plain(v) => v,
            Identity::Split { low, high } => join_split_integer(low, high),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeObject {
    identity: Identity,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    properties: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationshipObject {
    start: Identity,
    end: Identity,
    #[serde(rename = "type")]
    rel_type: String,
    #[serde(default)]
    properties: Map<String, JsonValue>,
}

/// One hop of a path.
#[derive(Debug, Clone, Deserialize)]
pub struct PathSegment {
    start: NodeObject,
    relationship: RelationshipObject,
    end: NodeObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathObject {
    start: NodeObject,
    end: NodeObject,
    #[serde(default)]
    segments: Vec<PathSegment>,
}

/// Record field classification; order matters for untagged matching.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GraphObject {
    Path(PathObject),
    Relationship(RelationshipObject),
    Node(NodeObject),
}

/// Selects the segments of a path that become relationships.
///
/// `FirstSegment` keeps only the first hop, so longer paths are not fully
/// expanded. Each selected segment connects its relationship's own `start`
/// and `end` identities, not the endpoints of the whole path.
pub fn connecting_segments(path: &PathObject, expansion: PathExpansion) -> &[PathSegment] {
    match expansion {
        PathExpansion::FirstSegment => &path.segments[..path.segments.len().min(1)],
        PathExpansion::AllSegments => &path.segments,
    }
}

/// Loads path/record JSON exports.
pub struct PathRecordLoader {
    key: String,
    expansion: PathExpansion,
}

impl PathRecordLoader {
    pub fn new(key: &str, expansion: PathExpansion) -> Self {
        Self {
            key: key.to_string(),
            expansion,
        }
    }

    /// Canonical id for an internal identity, unique across sources.
    fn canonical_id(&self, identity: i64) -> String {
        format!("{}_{}", self.key, identity)
    }
}

impl SourceLoader for PathRecordLoader {
    fn load(&self, text: &str) -> Result<LocalGraph, AppError> {
        let document: JsonValue = serde_json::from_str(text)?;
        let records = match document {
            JsonValue::Array(items) => items,
            other => vec![other],
        };

        let mut normalizer = Normalizer {
            loader: self,
            graph: LocalGraph {
                id_scope: IdScope::Global,
                ..LocalGraph::default()
            },
            unlabeled: HashSet::new(),
        };

        for record in &records {
            let JsonValue::Object(fields) = record else {
                normalizer.graph.diagnostics.skipped_records += 1;
                continue;
            };

            for (field, value) in fields {
                // Scalar columns are not graph content
                if !value.is_object() {
                    continue;
                }
                match GraphObject::deserialize(value) {
                    Ok(GraphObject::Path(path)) => normalizer.add_path(&path),
                    Ok(GraphObject::Relationship(rel)) => normalizer.add_relationship(&rel),
                    Ok(GraphObject::Node(node)) => normalizer.add_node(&node),
                    Err(_) => {
                        tracing::debug!(field = %field, "Skipping unrecognised record field");
                        normalizer.graph.diagnostics.skipped_records += 1;
                    }
                }
            }
        }

        Ok(normalizer.graph)
    }
}

/// Incremental identity → node map, first occurrence wins.
struct Normalizer<'a> {
    loader: &'a PathRecordLoader,
    graph: LocalGraph,
    unlabeled: HashSet<i64>,
}

impl Normalizer<'_> {
    fn add_node(&mut self, node: &NodeObject) {
        let identity = node.identity.value();
        if self.graph.identities.contains_key(&identity) {
            return;
        }

        if node.labels.is_empty() {
            if self.unlabeled.insert(identity) {
                self.graph.diagnostics.skipped_records += 1;
            }
            return;
        }

        self.graph
            .identities
            .insert(identity, self.graph.nodes.len());
        self.graph.nodes.push(Node::new(
            self.loader.canonical_id(identity),
            node.labels.clone(),
            convert_properties(&node.properties),
        ));
    }

    fn add_relationship(&mut self, rel: &RelationshipObject) {
        self.graph.references.push(UnresolvedReference {
            source: Endpoint::Identity(rel.start.value()),
            target: Endpoint::Identity(rel.end.value()),
            rel_type: rel.rel_type.clone(),
            properties: convert_properties(&rel.properties),
        });
    }

    fn add_path(&mut self, path: &PathObject) {
        self.add_node(&path.start);
        self.add_node(&path.end);

        for segment in connecting_segments(path, self.loader.expansion) {
            self.add_node(&segment.start);
            self.add_node(&segment.end);
            self.add_relationship(&segment.relationship);
        }
    }
}

fn convert_properties(properties: &Map<String, JsonValue>) -> Properties {
    properties
        .iter()
        .map(|(key, value)| (key.clone(), PropertyValue::from_json(value)))
        .collect()
}
