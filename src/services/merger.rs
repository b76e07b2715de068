//! Folds per-source datasets into the combined graph.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::aggregator::{classify, summarize, CategoryBuckets};
use crate::config::CategoryConfig;
use crate::models::{
    Dataset, IdScope, Node, Provenance, Relationship, RelationshipRecord, Summary,
};

/// Union of every folded dataset with category buckets and totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedGraph {
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
    #[serde(flatten)]
    pub buckets: CategoryBuckets,
    pub summary: Summary,
    /// Relationship-table records grouped by source file.
    #[serde(skip)]
    pub tabular_relationships: BTreeMap<String, Vec<RelationshipRecord>>,
}

/// Single-writer accumulator; datasets are appended in fold order and never
/// deduplicated across sources.
#[derive(Debug, Default)]
pub struct GraphAccumulator {
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
    records: BTreeMap<String, Vec<RelationshipRecord>>,
}

impl GraphAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a dataset, tagging every item with provenance.
    ///
    /// Local-scope ids are prefixed `{key}:{id}`; global ids are kept as is.
    pub fn fold(&mut self, dataset: &Dataset, timestamp: DateTime<Utc>) {
        let provenance = Provenance {
            source_name: dataset.name.clone(),
            import_timestamp: timestamp,
        };
        let qualify = |id: &str| match dataset.id_scope {
            IdScope::Local => format!("{}:{}", dataset.key, id),
            IdScope::Global => id.to_string(),
        };

        self.nodes.extend(dataset.nodes.iter().map(|node| Node {
            id: qualify(&node.id),
            provenance: Some(provenance.clone()),
            ..node.clone()
        }));

        self.relationships
            .extend(dataset.relationships.iter().map(|rel| Relationship {
                source_id: qualify(&rel.source_id),
                target_id: qualify(&rel.target_id),
                provenance: Some(provenance.clone()),
                ..rel.clone()
            }));

        for record in &dataset.records {
            self.records
                .entry(record.source_file.clone())
                .or_default()
                .push(RelationshipRecord {
                    provenance: Some(provenance.clone()),
                    ..record.clone()
                });
        }

        tracing::debug!(
            dataset = %dataset.name,
            nodes = dataset.nodes.len(),
            relationships = dataset.relationships.len(),
            records = dataset.records.len(),
            "Folded dataset"
        );
    }

    /// Classifies the accumulated nodes and computes the combined summary.
    pub fn finish(self, categories: &CategoryConfig) -> CombinedGraph {
        let summary = summarize(&self.nodes, &self.relationships, categories);
        let buckets = classify(&self.nodes, categories);

        CombinedGraph {
            nodes: self.nodes,
            relationships: self.relationships,
            buckets,
            summary,
            tabular_relationships: self.records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diagnostics, Properties};

    fn dataset(name: &str, key: &str, scope: IdScope) -> Dataset {
        let nodes = vec![
            Node::new("a", vec!["人物".to_string()], Properties::new()),
            Node::new("b", vec!["事件".to_string()], Properties::new()),
        ];
        let relationships = vec![Relationship::new("a", "b", "参与", Properties::new())];
        Dataset {
            name: name.to_string(),
            key: key.to_string(),
            data_source: format!("{}.cypher", key),
            summary: summarize(&nodes, &relationships, &CategoryConfig::default()),
            nodes,
            relationships,
            records: vec![],
            diagnostics: Diagnostics::default(),
            id_scope: scope,
        }
    }

    #[test]
    fn test_local_ids_prefixed_and_provenance_attached() {
        let now = Utc::now();
        let mut accumulator = GraphAccumulator::new();
        accumulator.fold(&dataset("花园口决堤", "huayuankou", IdScope::Local), now);
        let combined = accumulator.finish(&CategoryConfig::default());

        assert_eq!(combined.nodes[0].id, "huayuankou:a");
        assert_eq!(combined.relationships[0].source_id, "huayuankou:a");
        assert_eq!(combined.relationships[0].target_id, "huayuankou:b");

        let provenance = combined.nodes[1].provenance.as_ref().unwrap();
        assert_eq!(provenance.source_name, "花园口决堤");
        assert_eq!(provenance.import_timestamp, now);
        assert!(combined.relationships[0].provenance.is_some());
    }

    #[test]
    fn test_global_ids_kept_and_no_cross_source_dedup() {
        let now = Utc::now();
        let mut accumulator = GraphAccumulator::new();
        accumulator.fold(&dataset("淝水之战", "feishui", IdScope::Global), now);
        accumulator.fold(&dataset("双堆集战役", "shuangduiji", IdScope::Local), now);
        let combined = accumulator.finish(&CategoryConfig::default());

        let ids: Vec<&str> = combined.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "shuangduiji:a", "shuangduiji:b"]);
        assert_eq!(combined.summary.total_nodes, 4);
        assert_eq!(combined.summary.total_relationships, 2);
        assert_eq!(combined.summary.persons, 2);
        assert_eq!(combined.buckets.events.len(), 2);
    }

    #[test]
    fn test_records_grouped_by_file() {
        let record = |file: &str| RelationshipRecord {
            source_file: file.to_string(),
            description: "人物关系".to_string(),
            raw_data: serde_json::Map::new(),
            provenance: None,
        };
        let mut relations = dataset("关系", "rel", IdScope::Local);
        relations.nodes.clear();
        relations.relationships.clear();
        relations.records = vec![record("rel_P&P.csv"), record("rel_P&P.csv"), record("rel_E&E.csv")];

        let mut accumulator = GraphAccumulator::new();
        accumulator.fold(&relations, Utc::now());
        let combined = accumulator.finish(&CategoryConfig::default());

        assert_eq!(combined.tabular_relationships["rel_P&P.csv"].len(), 2);
        assert_eq!(combined.tabular_relationships["rel_E&E.csv"].len(), 1);
        assert!(combined.tabular_relationships["rel_E&E.csv"][0]
            .provenance
            .is_some());
        assert_eq!(combined.summary.total_relationships, 0);
    }

    #[test]
    fn test_combined_serializes_buckets_inline() {
        let mut accumulator = GraphAccumulator::new();
        accumulator.fold(&dataset("花园口决堤", "huayuankou", IdScope::Local), Utc::now());
        let json = serde_json::to_value(accumulator.finish(&CategoryConfig::default())).unwrap();

        assert_eq!(json["persons"].as_array().unwrap().len(), 1);
        assert_eq!(json["summary"]["total_nodes"], 2);
        assert!(json.get("tabular_relationships").is_none());
    }
}
