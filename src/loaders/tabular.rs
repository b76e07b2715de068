//! Delimited tabular sources with a header row.

use csv::{ReaderBuilder, StringRecord};
use serde_json::{Map, Value as JsonValue};

use super::{LocalGraph, SourceLoader, UniqueIds};
use crate::config::{EntityKind, COORDINATE_COLUMNS};
use crate::error::AppError;
use crate::models::{IdScope, Node, Properties, PropertyValue, RelationshipRecord};
use crate::parser::{coerce_float, coerce_int};

/// Description used when a relationship table declares none.
const UNKNOWN_DESCRIPTION: &str = "unknown source";

/// Iterates `(row_index, headers, record)` for every decodable row.
///
/// Rows that fail to decode are counted in `skipped` and left out.
fn read_rows(
    text: &str,
    skipped: &mut usize,
) -> Result<(StringRecord, Vec<(usize, StringRecord)>), AppError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for (index, result) in reader.records().enumerate() {
        match result {
            Ok(record) => rows.push((index, record)),
            Err(e) => {
                tracing::debug!(row = index, error = %e, "Skipping undecodable row");
                *skipped += 1;
            }
        }
    }

    Ok((headers, rows))
}

/// Loads entity tables: one node per row with a fixed label.
pub struct TabularEntityLoader {
    kind: EntityKind,
    id_column: String,
    label: String,
}

impl TabularEntityLoader {
    pub fn new(kind: EntityKind, id_column: String, label: &str) -> Self {
        Self {
            kind,
            id_column,
            label: label.to_string(),
        }
    }

    /// Typed value for a cell: coordinates become floats, declared integer
    /// columns integers, everything else stays text.
    fn cell_value(&self, column: &str, raw: &str) -> PropertyValue {
        if COORDINATE_COLUMNS.contains(&column) {
            coerce_float(raw)
        } else if self.kind.integer_columns().contains(&column) {
            coerce_int(raw)
        } else {
            PropertyValue::String(raw.to_string())
        }
    }

    fn row_id(&self, headers: &StringRecord, record: &StringRecord, row_index: usize) -> String {
        headers
            .iter()
            .position(|h| h == self.id_column)
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_{}", self.kind.as_str(), row_index))
    }
}

impl SourceLoader for TabularEntityLoader {
    fn load(&self, text: &str) -> Result<LocalGraph, AppError> {
        let mut graph = LocalGraph {
            id_scope: IdScope::Local,
            ..LocalGraph::default()
        };
        let (headers, rows) = read_rows(text, &mut graph.diagnostics.skipped_records)?;
        let mut ids = UniqueIds::default();

        for (row_index, record) in rows {
            let properties: Properties = headers
                .iter()
                .zip(record.iter())
                .map(|(column, raw)| (column.to_string(), self.cell_value(column, raw)))
                .collect();

            let (id, renamed) = ids.claim(self.row_id(&headers, &record, row_index));
            if renamed {
                tracing::debug!(row = row_index, id = %id, "Renamed duplicate row id");
                graph.diagnostics.duplicate_ids += 1;
            }

            graph.nodes.push(Node::new(
                id,
                vec![self.label.clone()],
                properties,
            ));
        }

        Ok(graph)
    }
}

/// Loads relationship tables as opaque records.
///
/// Rows reference entities from other files, so they are kept for counting
/// and audit rather than resolved into relationships.
pub struct TabularRelationshipLoader {
    source_file: String,
    description: String,
}

impl TabularRelationshipLoader {
    pub fn new(source_file: String, description: Option<String>) -> Self {
        Self {
            source_file,
            description: description.unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string()),
        }
    }
}

impl SourceLoader for TabularRelationshipLoader {
    fn load(&self, text: &str) -> Result<LocalGraph, AppError> {
        let mut graph = LocalGraph::default();
        let (headers, rows) = read_rows(text, &mut graph.diagnostics.skipped_records)?;

        graph.records = rows
            .into_iter()
            .map(|(_, record)| RelationshipRecord {
                source_file: self.source_file.clone(),
                description: self.description.clone(),
                raw_data: headers
                    .iter()
                    .zip(record.iter())
                    .map(|(column, value)| {
                        (column.to_string(), JsonValue::String(value.to_string()))
                    })
                    .collect::<Map<_, _>>(),
                provenance: None,
            })
            .collect();

        Ok(graph)
    }
}
