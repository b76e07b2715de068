//! Binds unresolved references of one source to concrete node ids.

use std::collections::{HashMap, HashSet};

use crate::config::AmbiguityPolicy;
use crate::loaders::LocalGraph;
use crate::models::{Endpoint, Node, Relationship};

/// Relationships materialized for one source, plus what was dropped.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub relationships: Vec<Relationship>,
    /// References with no candidate on at least one side.
    pub dangling: usize,
    /// References with more than one candidate on at least one side.
    pub ambiguous: usize,
}

/// Short-lived lookup from match criteria to candidate nodes.
///
/// Built per source for exactly the property keys the references use and
/// dropped once the source is resolved.
struct CandidateIndex<'a> {
    by_property: HashMap<&'a str, HashMap<String, Vec<usize>>>,
    identities: &'a HashMap<i64, usize>,
}

impl<'a> CandidateIndex<'a> {
    fn build(graph: &'a LocalGraph) -> Self {
        let keys: HashSet<&str> = graph
            .references
            .iter()
            .flat_map(|r| [&r.source, &r.target])
            .filter_map(|endpoint| match endpoint {
                Endpoint::Match(criteria) => Some(criteria.key.as_str()),
                Endpoint::Identity(_) => None,
            })
            .collect();

        let mut by_property: HashMap<&str, HashMap<String, Vec<usize>>> = HashMap::new();
        for key in keys {
            let entries = by_property.entry(key).or_default();
            for (index, node) in graph.nodes.iter().enumerate() {
                if let Some(value) = node.properties.get(key).and_then(|v| v.index_key()) {
                    entries.entry(value).or_default().push(index);
                }
            }
        }

        Self {
            by_property,
            identities: &graph.identities,
        }
    }

    /// Candidate node indices in node-creation order.
    fn candidates(&self, endpoint: &Endpoint) -> Vec<usize> {
        match endpoint {
            Endpoint::Identity(identity) => self.identities.get(identity).copied().into_iter().collect(),
            Endpoint::Match(criteria) => criteria
                .value
                .index_key()
                .and_then(|value| self.by_property.get(criteria.key.as_str())?.get(&value))
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Resolves references under an [`AmbiguityPolicy`].
pub struct Resolver {
    policy: AmbiguityPolicy,
    strict: bool,
}

impl Resolver {
    pub fn new(policy: AmbiguityPolicy, strict: bool) -> Self {
        Self { policy, strict }
    }

    /// Materializes relationships in reference order; within one reference,
    /// candidate pairs follow node-creation order.
    pub fn resolve(&self, graph: &LocalGraph) -> Resolution {
        let index = CandidateIndex::build(graph);
        let mut resolution = Resolution::default();

        for reference in &graph.references {
            let sources = index.candidates(&reference.source);
            let targets = index.candidates(&reference.target);

            if sources.is_empty() || targets.is_empty() {
                resolution.dangling += 1;
                leniency!(
                    self.strict,
                    rel_type = %reference.rel_type,
                    source = ?reference.source,
                    target = ?reference.target,
                    "Dropping reference without candidates"
                );
                continue;
            }

            let (sources, targets) = if sources.len() > 1 || targets.len() > 1 {
                resolution.ambiguous += 1;
                leniency!(
                    self.strict,
                    rel_type = %reference.rel_type,
                    source_candidates = sources.len(),
                    target_candidates = targets.len(),
                    policy = ?self.policy,
                    "Ambiguous reference"
                );
                match self.policy {
                    AmbiguityPolicy::CrossProduct => (sources, targets),
                    AmbiguityPolicy::SkipAmbiguous => continue,
                    AmbiguityPolicy::FirstMatch => (vec![sources[0]], vec![targets[0]]),
                }
            } else {
                (sources, targets)
            };

            for &source in &sources {
                for &target in &targets {
                    resolution.relationships.push(Relationship::new(
                        node_id(&graph.nodes, source),
                        node_id(&graph.nodes, target),
                        reference.rel_type.clone(),
                        reference.properties.clone(),
                    ));
                }
            }
        }

        resolution
    }
}

fn node_id(nodes: &[Node], index: usize) -> String {
    nodes[index].id.clone()
}
