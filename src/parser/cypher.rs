//! Statement parser for graph-construction scripts.
//!
//! Recovers node-creation and relationship-creation statements from a script
//! written in the Cypher subset used by hand-made import files. Text that does
//! not match either statement form is skipped; statement-like text that fails
//! to match is reported through [`ParsedScript::skipped`].
//!
//! # Example
//!
//! ```
//! use histograph::parser::parse_script;
//!
//! let script = r#"
//!     CREATE (a:人物 {name: "A"});
//!     CREATE (b:人物 {name: "B"});
//!     MATCH (x:人物 {name: "A"}), (y:人物 {name: "B"}) CREATE (x)-[:ADVISED]->(y);
//! "#;
//!
//! let parsed = parse_script(script, "name").unwrap();
//! assert_eq!(parsed.nodes.len(), 2);
//! assert_eq!(parsed.relationships.len(), 1);
//! assert_eq!(parsed.relationships[0].rel_type, "ADVISED");
//! ```

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use super::coerce;
use crate::models::{MatchCriteria, Properties, PropertyValue, SkippedStatement};

#[derive(Parser)]
#[grammar = "parser/cypher.pest"]
struct ScriptParser;

/// A parsed `CREATE (v:Label {..})` node pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStatement {
    /// Bound variable, `None` for anonymous patterns.
    pub variable: Option<String>,
    pub labels: Vec<String>,
    pub properties: Properties,
    /// 1-indexed line of the pattern.
    pub line: usize,
}

/// A parsed `MATCH .. CREATE (a)-[:TYPE]->(b)` statement.
///
/// Endpoints are still symbolic; they are bound to nodes by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipStatement {
    pub source_var: String,
    pub target_var: String,
    pub source: MatchCriteria,
    pub target: MatchCriteria,
    pub rel_type: String,
    pub properties: Properties,
    pub line: usize,
}

/// All statements recovered from one script, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedScript {
    pub nodes: Vec<NodeStatement>,
    pub relationships: Vec<RelationshipStatement>,
    pub skipped: Vec<SkippedStatement>,
}

/// Errors raised when a script cannot be parsed at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),
}

/// A `(var:Labels {props})` pattern inside a MATCH clause.
struct MatchPatternInfo {
    variable: String,
    criteria: Option<MatchCriteria>,
}

/// Parses a script into node and relationship statements.
///
/// `match_key` selects which pattern property becomes the match criteria of
/// a relationship endpoint; when a pattern lacks it, its first declared
/// property is used instead.
pub fn parse_script(text: &str, match_key: &str) -> Result<ParsedScript, ParseError> {
    let mut pairs = ScriptParser::parse(Rule::Script, text)
        .map_err(|e| ParseError::InvalidSyntax(e.to_string()))?;

    let mut parsed = ParsedScript::default();
    let Some(script) = pairs.next() else {
        return Ok(parsed);
    };

    for pair in script.into_inner() {
        match pair.as_rule() {
            Rule::NodeStatement => {
                for pattern in pair.into_inner() {
                    if pattern.as_rule() == Rule::NodePattern {
                        parsed.nodes.push(node_statement(pattern));
                    }
                }
            }
            Rule::RelationshipStatement => {
                let text = pair.as_str().trim().to_string();
                for (line, result) in relationship_statements(pair, match_key) {
                    match result {
                        Ok(statement) => parsed.relationships.push(statement),
                        Err(reason) => parsed.skipped.push(SkippedStatement {
                            line,
                            text: text.clone(),
                            reason,
                        }),
                    }
                }
            }
            Rule::Malformed => parsed.skipped.push(SkippedStatement {
                line: pair.line_col().0,
                text: pair.as_str().trim().to_string(),
                reason: "does not match a node or relationship statement".to_string(),
            }),
            _ => {}
        }
    }

    Ok(parsed)
}

fn node_statement(pattern: Pair<Rule>) -> NodeStatement {
    let line = pattern.line_col().0;
    let mut variable = None;
    let mut labels = Vec::new();
    let mut properties = Properties::new();

    for inner in pattern.into_inner() {
        match inner.as_rule() {
            Rule::Variable => variable = Some(identifier(inner.as_str())),
            Rule::Labels => labels = inner.into_inner().map(|l| identifier(l.as_str())).collect(),
            Rule::Properties => properties = property_list(inner).into_iter().collect(),
            _ => {}
        }
    }

    NodeStatement {
        variable,
        labels,
        properties,
        line,
    }
}

/// One statement per edge clause; every edge shares the MATCH patterns.
fn relationship_statements(
    pair: Pair<Rule>,
    match_key: &str,
) -> Vec<(usize, Result<RelationshipStatement, String>)> {
    let mut patterns = Vec::with_capacity(2);
    let mut edges = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::MatchPattern => patterns.push(match_pattern(inner, match_key)),
            Rule::EdgePattern => edges.push(inner),
            _ => {}
        }
    }

    edges
        .into_iter()
        .map(|edge| {
            let line = edge.line_col().0;
            (line, relationship_statement(edge, &patterns, line))
        })
        .collect()
}

fn relationship_statement(
    edge: Pair<Rule>,
    patterns: &[MatchPatternInfo],
    line: usize,
) -> Result<RelationshipStatement, String> {
    let (source_var, target_var, rel_type, properties) = edge_clause(edge)?;

    let bound = |var: &str| -> Result<MatchCriteria, String> {
        let pattern = patterns
            .iter()
            .find(|p| p.variable == var)
            .ok_or_else(|| format!("edge references unbound variable `{}`", var))?;
        pattern
            .criteria
            .clone()
            .ok_or_else(|| format!("pattern `{}` has no match properties", var))
    };

    Ok(RelationshipStatement {
        source: bound(&source_var)?,
        target: bound(&target_var)?,
        source_var,
        target_var,
        rel_type,
        properties,
        line,
    })
}

fn match_pattern(pattern: Pair<Rule>, match_key: &str) -> MatchPatternInfo {
    let mut variable = String::new();
    let mut criteria = None;

    for inner in pattern.into_inner() {
        match inner.as_rule() {
            Rule::Variable => variable = identifier(inner.as_str()),
            Rule::Properties => criteria = select_criteria(property_list(inner), match_key),
            _ => {}
        }
    }

    MatchPatternInfo { variable, criteria }
}

/// Extracts `(from, to, type, properties)` from an edge clause, normalising
/// `(b)<-[:T]-(a)` to `a -> b`.
fn edge_clause(edge: Pair<Rule>) -> Result<(String, String, String, Properties), String> {
    let mut variables = Vec::with_capacity(2);
    let mut rel_type = None;
    let mut properties = Properties::new();
    let mut incoming = false;

    for inner in edge.into_inner() {
        match inner.as_rule() {
            Rule::Variable => variables.push(identifier(inner.as_str())),
            Rule::OutgoingEdge | Rule::IncomingEdge => {
                incoming = inner.as_rule() == Rule::IncomingEdge;
                for part in inner.into_inner() {
                    match part.as_rule() {
                        Rule::RelType => rel_type = Some(identifier(part.as_str())),
                        Rule::Properties => properties = property_list(part).into_iter().collect(),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    let rel_type = rel_type.ok_or_else(|| "edge has no relationship type".to_string())?;
    let [left, right]: [String; 2] = variables
        .try_into()
        .map_err(|_| "edge must reference two variables".to_string())?;

    if incoming {
        Ok((right, left, rel_type, properties))
    } else {
        Ok((left, right, rel_type, properties))
    }
}

/// Properties in declaration order, values coerced.
fn property_list(properties: Pair<Rule>) -> Vec<(String, PropertyValue)> {
    properties
        .into_inner()
        .filter(|p| p.as_rule() == Rule::Property)
        .filter_map(|property| {
            let mut parts = property.into_inner();
            let key = parts.next()?;
            let value = parts.next()?;
            Some((identifier(key.as_str()), coerce(value.as_str())))
        })
        .collect()
}

fn select_criteria(properties: Vec<(String, PropertyValue)>, match_key: &str) -> Option<MatchCriteria> {
    let index = properties
        .iter()
        .position(|(key, _)| key == match_key)
        .unwrap_or(0);
    properties
        .into_iter()
        .nth(index)
        .map(|(key, value)| MatchCriteria { key, value })
}

/// Trims an identifier and removes backtick quoting.
fn identifier(text: &str) -> String {
    let text = text.trim();
    if text.len() >= 2 && text.starts_with('`') && text.ends_with('`') {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParsedScript {
        parse_script(text, "name").unwrap()
    }

    #[test]
    fn test_node_statement_two_labels() {
        let parsed = parse(
            r#"CREATE (n1:人物:花园口 {name: "蒋介石", lat: 32.06004, lng: 118.79688})"#,
        );
        assert_eq!(parsed.nodes.len(), 1);

        let node = &parsed.nodes[0];
        assert_eq!(node.variable.as_deref(), Some("n1"));
        assert_eq!(node.labels, vec!["人物", "花园口"]);
        assert_eq!(node.properties["name"], PropertyValue::String("蒋介石".into()));
        assert_eq!(node.properties["lat"], PropertyValue::Float(32.06004));
        assert_eq!(node.properties["lng"], PropertyValue::Float(118.79688));
    }

    #[test]
    fn test_node_statement_single_label_integer_value() {
        let parsed = parse(r#"CREATE (e1:事件 {name: "决堤", year: 1938});"#);
        assert_eq!(parsed.nodes[0].labels, vec!["事件"]);
        assert_eq!(parsed.nodes[0].properties["year"], PropertyValue::Integer(1938));
    }

    #[test]
    fn test_scenario_two_nodes_one_reference() {
        let parsed = parse(
            r#"
            CREATE (a:人物 {name: "A"});
            CREATE (b:人物 {name: "B"});
            MATCH (x:人物 {name: "A"}), (y:人物 {name: "B"}) CREATE (x)-[:ADVISED]->(y);
            "#,
        );

        assert_eq!(parsed.nodes.len(), 2);
        assert_eq!(parsed.relationships.len(), 1);
        assert!(parsed.skipped.is_empty());

        let rel = &parsed.relationships[0];
        assert_eq!(rel.rel_type, "ADVISED");
        assert_eq!(rel.source, MatchCriteria::new("name", "A"));
        assert_eq!(rel.target, MatchCriteria::new("name", "B"));
        assert_eq!(rel.source_var, "x");
        assert_eq!(rel.target_var, "y");
    }

    #[test]
    fn test_relationship_before_nodes() {
        let parsed = parse(
            r#"
            MATCH (a:人物 {name: "A"}), (b:人物 {name: "B"}) CREATE (a)-[:建议]->(b);
            CREATE (n1:人物 {name: "A"});
            "#,
        );
        assert_eq!(parsed.relationships.len(), 1);
        assert_eq!(parsed.nodes.len(), 1);
    }

    #[test]
    fn test_multiline_relationship_with_second_match() {
        let parsed = parse(
            "MATCH (a:人物:花园口 {name: \"蒋介石\"})\nMATCH (b:人物:花园口 {name: \"陈果夫\"})\nCREATE (a)-[:建议]->(b);",
        );
        assert_eq!(parsed.relationships.len(), 1);
        assert_eq!(parsed.relationships[0].rel_type, "建议");
    }

    #[test]
    fn test_incoming_edge_normalised() {
        let parsed = parse(
            r#"MATCH (a {name: "A"}), (b {name: "B"}) CREATE (b)<-[:LED]-(a)"#,
        );
        let rel = &parsed.relationships[0];
        assert_eq!(rel.source, MatchCriteria::new("name", "A"));
        assert_eq!(rel.target, MatchCriteria::new("name", "B"));
    }

    #[test]
    fn test_edge_properties_parsed() {
        let parsed = parse(
            r#"MATCH (a {name: "A"}), (b {name: "B"}) CREATE (a)-[r:FOUGHT {year: 383}]->(b)"#,
        );
        assert_eq!(parsed.relationships[0].properties["year"], PropertyValue::Integer(383));
    }

    #[test]
    fn test_criteria_falls_back_to_first_property() {
        let parsed = parse(
            r#"MATCH (a:事件 {code: "E1"}), (b:事件 {code: "E2", name: "B"}) CREATE (a)-[:NEXT]->(b)"#,
        );
        let rel = &parsed.relationships[0];
        assert_eq!(rel.source, MatchCriteria::new("code", "E1"));
        assert_eq!(rel.target, MatchCriteria::new("name", "B"));
    }

    #[test]
    fn test_unbound_edge_variable_skipped() {
        let parsed = parse(
            r#"MATCH (a {name: "A"}), (b {name: "B"}) CREATE (a)-[:X]->(c);"#,
        );
        assert!(parsed.relationships.is_empty());
        assert_eq!(parsed.skipped.len(), 1);
        assert!(parsed.skipped[0].reason.contains("`c`"));
    }

    #[test]
    fn test_malformed_statement_skipped_and_parse_continues() {
        let parsed = parse(
            "CREATE (broken:人物 {name: \"x\"\nsome stray text here\nCREATE (ok:人物 {name: \"y\"});",
        );
        assert_eq!(parsed.nodes.len(), 1);
        assert_eq!(parsed.nodes[0].variable.as_deref(), Some("ok"));
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].line, 1);
    }

    #[test]
    fn test_keyword_inside_word_ignored() {
        let parsed = parse("RECREATE (n:A {name: \"x\"})");
        assert!(parsed.nodes.is_empty());
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_comments_ignored() {
        let parsed = parse(
            "// CREATE (hidden:人物 {name: \"no\"})\nCREATE (n:人物 {name: \"yes\"})",
        );
        assert_eq!(parsed.nodes.len(), 1);
        assert_eq!(parsed.nodes[0].properties["name"], PropertyValue::String("yes".into()));
    }

    #[test]
    fn test_quoted_value_keeps_commas() {
        let parsed = parse(r#"CREATE (n:事件 {name: "淝水之战", description: "前秦, 东晋"})"#);
        assert_eq!(
            parsed.nodes[0].properties["description"],
            PropertyValue::String("前秦, 东晋".into())
        );
    }

    #[test]
    fn test_multiple_patterns_in_one_create() {
        let parsed = parse(r#"CREATE (a:人物 {name: "A"}), (b:地点 {name: "寿春"})"#);
        assert_eq!(parsed.nodes.len(), 2);
        assert_eq!(parsed.nodes[1].labels, vec!["地点"]);
    }

    #[test]
    fn test_lowercase_keywords() {
        let parsed = parse(
            r#"create (a:人物 {name: "A"}); match (x {name: "A"}), (y {name: "A"}) create (x)-[:SELF]->(y)"#,
        );
        assert_eq!(parsed.nodes.len(), 1);
        assert_eq!(parsed.relationships.len(), 1);
    }

    #[test]
    fn test_anonymous_node_and_backticks() {
        let parsed = parse("CREATE (:`Time Point` {`full name`: '1938年6月'})");
        let node = &parsed.nodes[0];
        assert_eq!(node.variable, None);
        assert_eq!(node.labels, vec!["Time Point"]);
        assert_eq!(node.properties["full name"], PropertyValue::String("1938年6月".into()));
    }

    #[test]
    fn test_unrelated_statements_reported() {
        let parsed = parse("CREATE INDEX ON :人物(name);\nCREATE (n:人物 {name: \"A\"});");
        assert_eq!(parsed.nodes.len(), 1);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].text, "CREATE INDEX ON :人物(name)");
    }

    #[test]
    fn test_unclosed_properties_do_not_swallow_next_statement() {
        let parsed = parse(
            r#"CREATE (a:人物 {name: "A", age: 3); CREATE (b:人物 {name: "B"})"#,
        );
        assert_eq!(parsed.nodes.len(), 1);
        assert_eq!(parsed.nodes[0].variable.as_deref(), Some("b"));
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].text, r#"CREATE (a:人物 {name: "A", age: 3)"#);
    }

    #[test]
    fn test_several_edges_in_one_create() {
        let parsed = parse(
            r#"MATCH (a {name: "A"}), (b {name: "B"}) CREATE (a)-[:R1]->(b), (b)-[:R2]->(a), (a)-[:R3]->(c);"#,
        );
        let types: Vec<&str> = parsed
            .relationships
            .iter()
            .map(|r| r.rel_type.as_str())
            .collect();
        assert_eq!(types, vec!["R1", "R2"]);
        assert_eq!(parsed.relationships[1].source, MatchCriteria::new("name", "B"));
        assert_eq!(parsed.skipped.len(), 1);
        assert!(parsed.skipped[0].reason.contains("`c`"));
    }

    #[test]
    fn test_empty_script() {
        let parsed = parse("");
        assert_eq!(parsed, ParsedScript::default());
    }
}
