//! Relationship references awaiting resolution.

use serde::Serialize;

use super::{Properties, PropertyValue};

/// Key/value pair used to look up candidate nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCriteria {
    pub key: String,
    pub value: PropertyValue,
}

impl MatchCriteria {
    pub fn new(key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One end of an unresolved relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Endpoint {
    /// Symbolic reference by property match (script sources).
    Match(MatchCriteria),
    /// Internal numeric identity (path/record exports).
    Identity(i64),
}

/// A relationship whose endpoints are not yet bound to node ids.
///
/// Only lives between loading and resolution of a single source.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedReference {
    pub source: Endpoint,
    pub target: Endpoint,
    pub rel_type: String,
    pub properties: Properties,
}
