//! Source-specific loaders producing per-source local graphs.
//!
//! Each declared [`SourceKind`] maps to one [`SourceLoader`]:
//!
//! - [`ScriptLoader`] - graph-construction scripts
//! - [`PathRecordLoader`] - nested JSON path/record exports
//! - [`TabularEntityLoader`] - entity tables (one node per row)
//! - [`TabularRelationshipLoader`] - relationship tables (opaque records)
//!
//! Loaders are pure: they receive the document text and return a
//! [`LocalGraph`] whose references are still unresolved.

mod path_records;
mod script;
mod tabular;

use std::collections::{HashMap, HashSet};

pub use path_records::{connecting_segments, PathObject, PathRecordLoader, PathSegment};
pub use script::ScriptLoader;
pub use tabular::{TabularEntityLoader, TabularRelationshipLoader};

use crate::config::{Config, Source, SourceKind};
use crate::error::AppError;
use crate::models::{Diagnostics, IdScope, Node, RelationshipRecord, UnresolvedReference};

/// Nodes and unresolved references recovered from one source document.
#[derive(Debug, Clone, Default)]
pub struct LocalGraph {
    pub nodes: Vec<Node>,
    pub references: Vec<UnresolvedReference>,
    /// Internal numeric identity → index into `nodes`.
    pub identities: HashMap<i64, usize>,
    /// Opaque records from relationship tables.
    pub records: Vec<RelationshipRecord>,
    pub id_scope: IdScope,
    pub diagnostics: Diagnostics,
}

/// Converts the text of one source document into a [`LocalGraph`].
pub trait SourceLoader {
    fn load(&self, text: &str) -> Result<LocalGraph, AppError>;
}

/// Builds the loader matching a source's declared kind.
pub fn loader_for(source: &Source, config: &Config) -> Result<Box<dyn SourceLoader>, AppError> {
    let loader: Box<dyn SourceLoader> = match source.kind {
        SourceKind::Script => Box::new(ScriptLoader::new(&config.pipeline.match_key)),
        SourceKind::PathJson => Box::new(PathRecordLoader::new(
            source.key(),
            config.pipeline.path_expansion,
        )),
        SourceKind::TabularEntity => {
            let entity = source.entity.ok_or_else(|| AppError::InvalidSource {
                name: source.name.clone(),
                reason: "tabular_entity sources must declare `entity`".to_string(),
            })?;
            let id_column = source
                .id_column
                .clone()
                .unwrap_or_else(|| entity.default_id_column().to_string());
            Box::new(TabularEntityLoader::new(
                entity,
                id_column,
                entity.label(&config.categories),
            ))
        }
        SourceKind::TabularRelationship => Box::new(TabularRelationshipLoader::new(
            source.file_name(),
            source.description.clone(),
        )),
    };

    Ok(loader)
}

/// Hands out node ids that are unique within one source.
///
/// A taken id gets the first free `{id}_{k}` suffix, k = 2, 3, …
#[derive(Debug, Default)]
pub(crate) struct UniqueIds {
    taken: HashSet<String>,
}

impl UniqueIds {
    /// Returns a free id for `base` and whether it had to be renamed.
    pub(crate) fn claim(&mut self, base: String) -> (String, bool) {
        if self.taken.insert(base.clone()) {
            return (base, false);
        }

        let mut k = 2;
        loop {
            let candidate = format!("{}_{}", base, k);
            if self.taken.insert(candidate.clone()) {
                return (candidate, true);
            }
            k += 1;
        }
    }
}

/// Removes a leading UTF-8 byte-order mark.
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EntityKind;
    use std::path::PathBuf;

    fn source(kind: SourceKind, entity: Option<EntityKind>) -> Source {
        Source {
            name: "test".to_string(),
            key: None,
            path: PathBuf::from("test.csv"),
            kind,
            description: None,
            entity,
            id_column: None,
        }
    }

    #[test]
    fn test_tabular_entity_requires_entity_kind() {
        let config = Config::default();
        let result = loader_for(&source(SourceKind::TabularEntity, None), &config);
        assert!(matches!(result, Err(AppError::InvalidSource { .. })));

        let result = loader_for(
            &source(SourceKind::TabularEntity, Some(EntityKind::Event)),
            &config,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_unique_ids_skip_taken_suffixes() {
        let mut ids = UniqueIds::default();
        assert_eq!(ids.claim("n".to_string()), ("n".to_string(), false));
        assert_eq!(ids.claim("n_2".to_string()), ("n_2".to_string(), false));
        assert_eq!(ids.claim("n".to_string()), ("n_3".to_string(), true));
        assert_eq!(ids.claim("n_2".to_string()), ("n_2_2".to_string(), true));
    }

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom("\u{feff}a,b"), "a,b");
        assert_eq!(strip_bom("a,b"), "a,b");
    }
}
