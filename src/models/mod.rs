//! Domain models for the unified property graph.

mod dataset;
mod node;
mod property;
mod reference;

pub use dataset::{
    Dataset, Diagnostics, IdScope, RelationshipRecord, SkippedStatement, Summary,
};
pub use node::{Node, Provenance, Relationship, NAME_KEY};
pub use property::{Properties, PropertyValue};
pub use reference::{Endpoint, MatchCriteria, UnresolvedReference};

pub(crate) use property::join_split_integer;
