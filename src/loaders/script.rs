//! Script sources: statements become nodes and name-matched references.

use super::{LocalGraph, SourceLoader, UniqueIds};
use crate::error::AppError;
use crate::models::{Endpoint, IdScope, Node, UnresolvedReference};
use crate::parser::{parse_script, ParsedScript};

/// Loads graph-construction scripts.
pub struct ScriptLoader {
    match_key: String,
}

impl ScriptLoader {
    pub fn new(match_key: &str) -> Self {
        Self {
            match_key: match_key.to_string(),
        }
    }
}

impl SourceLoader for ScriptLoader {
    fn load(&self, text: &str) -> Result<LocalGraph, AppError> {
        let parsed = parse_script(text, &self.match_key)?;
        Ok(into_local_graph(parsed))
    }
}

/// Node ids are the bound variable names. A reused variable gets the first
/// free numeric suffix so ids stay unique within the script.
fn into_local_graph(parsed: ParsedScript) -> LocalGraph {
    let mut graph = LocalGraph {
        id_scope: IdScope::Local,
        ..LocalGraph::default()
    };
    let mut ids = UniqueIds::default();

    for (index, statement) in parsed.nodes.into_iter().enumerate() {
        let base = statement
            .variable
            .unwrap_or_else(|| format!("node_{}", index));
        let (id, renamed) = ids.claim(base);
        if renamed {
            graph.diagnostics.duplicate_ids += 1;
        }

        graph
            .nodes
            .push(Node::new(id, statement.labels, statement.properties));
    }

    graph.references = parsed
        .relationships
        .into_iter()
        .map(|statement| UnresolvedReference {
            source: Endpoint::Match(statement.source),
            target: Endpoint::Match(statement.target),
            rel_type: statement.rel_type,
            properties: statement.properties,
        })
        .collect();

    graph.diagnostics.skipped_statements = parsed.skipped;
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchCriteria;

    #[test]
    fn test_script_to_local_graph() {
        let graph = ScriptLoader::new("name")
            .load(
                r#"
                CREATE (a:人物 {name: "A"});
                CREATE (b:人物 {name: "B"});
                MATCH (x:人物 {name: "A"}), (y:人物 {name: "B"}) CREATE (x)-[:ADVISED]->(y);
                "#,
            )
            .unwrap();

        assert_eq!(graph.id_scope, IdScope::Local);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].id, "a");
        assert_eq!(graph.references.len(), 1);
        assert_eq!(
            graph.references[0].source,
            Endpoint::Match(MatchCriteria::new("name", "A"))
        );
        assert!(graph.diagnostics.is_empty());
    }

    #[test]
    fn test_reused_variable_gets_suffix() {
        let graph = ScriptLoader::new("name")
            .load(
                r#"
                CREATE (n:人物 {name: "A"});
                CREATE (n:人物 {name: "B"});
                CREATE (n:人物 {name: "C"});
                "#,
            )
            .unwrap();

        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n", "n_2", "n_3"]);
        assert_eq!(graph.diagnostics.duplicate_ids, 2);
    }

    #[test]
    fn test_suffix_does_not_collide_with_declared_variable() {
        let graph = ScriptLoader::new("name")
            .load(
                r#"
                CREATE (n:人物 {name: "A"});
                CREATE (n:人物 {name: "B"});
                CREATE (n_2:人物 {name: "C"});
                "#,
            )
            .unwrap();

        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n", "n_2", "n_2_2"]);
        assert_eq!(graph.diagnostics.duplicate_ids, 2);
    }

    #[test]
    fn test_anonymous_node_id() {
        let graph = ScriptLoader::new("name")
            .load(r#"CREATE (:时间 {name: "1938年"})"#)
            .unwrap();
        assert_eq!(graph.nodes[0].id, "node_0");
    }

    #[test]
    fn test_skipped_statements_carried_into_diagnostics() {
        let graph = ScriptLoader::new("name")
            .load("MERGE (n:人物 {name: \"A\"});")
            .unwrap();
        assert!(graph.nodes.is_empty());
        assert_eq!(graph.diagnostics.skipped_statements.len(), 1);
    }
}
