//! Category classification and summary counts.
//!
//! [`summarize`] and [`classify`] share [`CategoryConfig::matches`], so bucket
//! sizes always equal the summary counts for the same node list.

use serde::{Deserialize, Serialize};

use crate::config::{Category, CategoryConfig};
use crate::models::{Node, Relationship, Summary};

/// Nodes partitioned by category. A node can sit in several buckets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryBuckets {
    pub events: Vec<Node>,
    pub persons: Vec<Node>,
    pub locations: Vec<Node>,
    pub times: Vec<Node>,
}

impl CategoryBuckets {
    fn bucket_mut(&mut self, category: Category) -> &mut Vec<Node> {
        match category {
            Category::Event => &mut self.events,
            Category::Person => &mut self.persons,
            Category::Location => &mut self.locations,
            Category::Time => &mut self.times,
        }
    }
}

fn count(nodes: &[Node], category: Category, categories: &CategoryConfig) -> usize {
    nodes
        .iter()
        .filter(|node| categories.matches(category, &node.labels))
        .count()
}

/// Counts totals and category memberships.
pub fn summarize(
    nodes: &[Node],
    relationships: &[Relationship],
    categories: &CategoryConfig,
) -> Summary {
    Summary {
        total_nodes: nodes.len(),
        total_relationships: relationships.len(),
        events: count(nodes, Category::Event, categories),
        persons: count(nodes, Category::Person, categories),
        locations: count(nodes, Category::Location, categories),
        times: count(nodes, Category::Time, categories),
    }
}

/// Copies each node into every bucket one of its labels matches.
pub fn classify(nodes: &[Node], categories: &CategoryConfig) -> CategoryBuckets {
    let mut buckets = CategoryBuckets::default();
    for node in nodes {
        for category in Category::ALL {
            if categories.matches(category, &node.labels) {
                buckets.bucket_mut(category).push(node.clone());
            }
        }
    }
    buckets
}
