//! Parsing of graph-construction scripts and raw property values.

mod coerce;
mod cypher;

pub use coerce::{coerce, coerce_float, coerce_int};
pub use cypher::{parse_script, NodeStatement, ParseError, ParsedScript, RelationshipStatement};
