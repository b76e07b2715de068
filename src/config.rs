//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/histograph/config.toml` (XDG) or platform config dir
//! 2. Project config: `.histograph.toml`, or the file passed with `--config`
//! 3. Environment variables: `HISTOGRAPH_*`, `__` separating nested keys
//!    (e.g. `HISTOGRAPH_PIPELINE__STRICT_MODE=true`)
//!
//! # Intended Usage
//!
//! **Project config** (`.histograph.toml` next to the source documents):
//! ```toml
//! [pipeline]
//! strict_mode = false
//!
//! [output]
//! dir = "output"
//!
//! [[sources]]
//! name = "花园口决堤"
//! key = "huayuankou"
//! path = "花园口决堤_Neo4j导入脚本_最终版.cypher"
//! kind = "script"
//!
//! [[sources]]
//! name = "淝水之战"
//! key = "feishui"
//! path = "neo4j导入数据/淝水.json"
//! kind = "path_json"
//!
//! [[sources]]
//! name = "人物"
//! path = "neo4j导入数据/persons.csv"
//! kind = "tabular_entity"
//! entity = "person"
//! ```
//!
//! Sources are folded into the combined graph in declaration order, so the
//! combined output is reproducible for a given config.

use std::ops::Deref;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Default project config file name.
pub const PROJECT_CONFIG_FILE: &str = ".histograph.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub categories: CategoryConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Source documents, folded in this order.
    #[serde(default)]
    pub sources: Vec<Source>,
}

/// Where source documents live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Base directory for relative source paths.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

/// How multiple candidate nodes for one reference endpoint are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// One relationship for every (source, target) candidate pair.
    #[default]
    CrossProduct,
    /// Drop references with more than one candidate on either side.
    SkipAmbiguous,
    /// Use the first candidate of each side, in node order.
    FirstMatch,
}

/// Which segments of a multi-hop path become relationships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathExpansion {
    /// Only the first segment of each path.
    #[default]
    FirstSegment,
    /// Every segment of each path.
    AllSegments,
}

/// Pipeline behaviour knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Report silent skips at warn level instead of debug.
    #[serde(default)]
    pub strict_mode: bool,
    #[serde(default)]
    pub ambiguity: AmbiguityPolicy,
    #[serde(default)]
    pub path_expansion: PathExpansion,
    /// Pattern property used as match criteria in script relationship statements.
    #[serde(default = "default_match_key")]
    pub match_key: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            ambiguity: AmbiguityPolicy::default(),
            path_expansion: PathExpansion::default(),
            match_key: default_match_key(),
        }
    }
}

fn default_match_key() -> String {
    crate::models::NAME_KEY.to_string()
}

/// How a label is tested against a category marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMatch {
    /// Label contains the marker as a substring.
    #[default]
    Contains,
    /// Label equals the marker.
    Exact,
}

/// Category markers used for classification and for tabular entity labels.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryConfig {
    #[serde(default = "default_event_marker")]
    pub event: String,
    #[serde(default = "default_person_marker")]
    pub person: String,
    #[serde(default = "default_location_marker")]
    pub location: String,
    #[serde(default = "default_time_marker")]
    pub time: String,
    #[serde(default)]
    pub match_mode: LabelMatch,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            event: default_event_marker(),
            person: default_person_marker(),
            location: default_location_marker(),
            time: default_time_marker(),
            match_mode: LabelMatch::default(),
        }
    }
}

/// Node category used for classification buckets and summary counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Event,
    Person,
    Location,
    Time,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Event,
        Category::Person,
        Category::Location,
        Category::Time,
    ];
}

impl CategoryConfig {
    /// Marker configured for a category.
    pub fn marker(&self, category: Category) -> &str {
        match category {
            Category::Event => &self.event,
            Category::Person => &self.person,
            Category::Location => &self.location,
            Category::Time => &self.time,
        }
    }

    /// Whether any of `labels` matches the category marker.
    pub fn matches(&self, category: Category, labels: &[String]) -> bool {
        let marker = self.marker(category);
        labels.iter().any(|label| match self.match_mode {
            LabelMatch::Contains => label.contains(marker),
            LabelMatch::Exact => label == marker,
        })
    }
}

fn default_event_marker() -> String {
    "事件".to_string()
}

fn default_person_marker() -> String {
    "人物".to_string()
}

fn default_location_marker() -> String {
    "地点".to_string()
}

fn default_time_marker() -> String {
    "时间".to_string()
}

/// Output artifact settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// File name of the combined document.
    #[serde(default = "default_combined_file")]
    pub combined_file: String,
    /// Prefix of per-dataset file names.
    #[serde(default = "default_dataset_prefix")]
    pub dataset_prefix: String,
    /// Version stamped into the output metadata.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            combined_file: default_combined_file(),
            dataset_prefix: default_dataset_prefix(),
            version: default_version(),
            pretty: default_pretty(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_combined_file() -> String {
    "data.json".to_string()
}

fn default_dataset_prefix() -> String {
    "data_".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_pretty() -> bool {
    true
}

/// Declared shape of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Graph-construction script.
    Script,
    /// Nested JSON export of paths and records.
    PathJson,
    /// Delimited table, one entity per row.
    TabularEntity,
    /// Delimited table, one relationship record per row.
    TabularRelationship,
}

/// Entity kind of a tabular entity file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Event,
    Person,
    Location,
}

impl EntityKind {
    /// Name used in fallback ids (`{kind}_{row_index}`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Event => "event",
            EntityKind::Person => "person",
            EntityKind::Location => "location",
        }
    }

    /// Identifier column used when a source does not override it.
    pub fn default_id_column(&self) -> &'static str {
        match self {
            EntityKind::Event => "事件ID",
            EntityKind::Person => "人物序号",
            EntityKind::Location => "LocationID",
        }
    }

    /// Columns coerced to integers.
    pub fn integer_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Person => &["权重"],
            EntityKind::Event | EntityKind::Location => &[],
        }
    }

    /// The single label given to every node of this kind.
    pub fn label<'a>(&self, categories: &'a CategoryConfig) -> &'a str {
        match self {
            EntityKind::Event => &categories.event,
            EntityKind::Person => &categories.person,
            EntityKind::Location => &categories.location,
        }
    }
}

/// Coordinate columns coerced to floats for every entity kind.
pub const COORDINATE_COLUMNS: &[&str] = &["lat", "lng"];

/// A declared source document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Source {
    /// Dataset display name.
    pub name: String,
    /// Id prefix in the combined graph; defaults to `name`.
    #[serde(default)]
    pub key: Option<String>,
    /// Path to the document, relative to `input.base_dir` unless absolute.
    pub path: PathBuf,
    pub kind: SourceKind,
    /// Human-readable description for output metadata.
    #[serde(default)]
    pub description: Option<String>,
    /// Entity kind, required for `tabular_entity` sources.
    #[serde(default)]
    pub entity: Option<EntityKind>,
    /// Identifier column override for `tabular_entity` sources.
    #[serde(default)]
    pub id_column: Option<String>,
}

impl Source {
    /// Id prefix for this source.
    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }

    /// File name of the source document.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string())
    }

    /// Absolute or base-relative location of the document.
    pub fn resolve_path(&self, base_dir: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            base_dir.join(&self.path)
        }
    }
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    ///
    /// `project_file` replaces the default `.histograph.toml` lookup.
    pub fn load(project_file: Option<&Path>) -> Result<Self, ConfigError> {
        let project_file = project_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));

        Self::figment(Self::user_config_path(), project_file)
            .extract()
            .map_err(ConfigError::from)
    }

    /// Builds the layered provider chain.
    fn figment(user_config: PathBuf, project_config: PathBuf) -> Figment {
        Figment::new()
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(user_config))
            // Layer 2: Project config
            .merge(Toml::file(project_config))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("HISTOGRAPH_").split("__"))
    }

    /// User config path: ~/.config/histograph/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("histograph").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("histograph").join("config.toml"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_defaults_without_files() {
        let config: Config = Config::figment(
            PathBuf::from("/nonexistent/user.toml"),
            PathBuf::from("/nonexistent/project.toml"),
        )
        .extract()
        .unwrap();

        assert!(!config.pipeline.strict_mode);
        assert_eq!(config.pipeline.ambiguity, AmbiguityPolicy::CrossProduct);
        assert_eq!(config.pipeline.path_expansion, PathExpansion::FirstSegment);
        assert_eq!(config.pipeline.match_key, "name");
        assert_eq!(config.categories.person, "人物");
        assert_eq!(config.output.combined_file, "data.json");
        assert!(config.sources.is_empty());
    }

    #[test]
    #[serial]
    fn test_project_file_sources() {
        let project = write_config(
            r#"
            [pipeline]
            ambiguity = "skip_ambiguous"

            [[sources]]
            name = "淝水之战"
            key = "feishui"
            path = "淝水.json"
            kind = "path_json"

            [[sources]]
            name = "人物"
            path = "persons.csv"
            kind = "tabular_entity"
            entity = "person"
            "#,
        );

        let config: Config =
            Config::figment(PathBuf::from("/nonexistent/user.toml"), project.path().into())
                .extract()
                .unwrap();

        assert_eq!(config.pipeline.ambiguity, AmbiguityPolicy::SkipAmbiguous);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].key(), "feishui");
        assert_eq!(config.sources[0].kind, SourceKind::PathJson);
        assert_eq!(config.sources[1].key(), "人物");
        assert_eq!(config.sources[1].entity, Some(EntityKind::Person));
    }

    #[test]
    #[serial]
    fn test_env_overrides_project_file() {
        let project = write_config("[pipeline]\nstrict_mode = false\n");
        std::env::set_var("HISTOGRAPH_PIPELINE__STRICT_MODE", "true");

        let config: Result<Config, _> =
            Config::figment(PathBuf::from("/nonexistent/user.toml"), project.path().into())
                .extract();
        std::env::remove_var("HISTOGRAPH_PIPELINE__STRICT_MODE");

        assert!(config.unwrap().pipeline.strict_mode);
    }

    #[test]
    fn test_source_path_resolution() {
        let source = Source {
            name: "events".to_string(),
            key: None,
            path: PathBuf::from("data/events.csv"),
            kind: SourceKind::TabularEntity,
            description: None,
            entity: Some(EntityKind::Event),
            id_column: None,
        };

        assert_eq!(
            source.resolve_path(Path::new("/srv/input")),
            PathBuf::from("/srv/input/data/events.csv")
        );
        assert_eq!(source.file_name(), "events.csv");
    }

    #[test]
    fn test_entity_kind_defaults() {
        let categories = CategoryConfig::default();
        assert_eq!(EntityKind::Location.default_id_column(), "LocationID");
        assert_eq!(EntityKind::Person.integer_columns(), &["权重"]);
        assert_eq!(EntityKind::Event.label(&categories), "事件");
    }

    #[test]
    fn test_category_match_modes() {
        let mut categories = CategoryConfig::default();
        let labels = vec!["重要人物".to_string()];

        assert!(categories.matches(Category::Person, &labels));
        assert!(!categories.matches(Category::Event, &labels));

        categories.match_mode = LabelMatch::Exact;
        assert!(!categories.matches(Category::Person, &labels));
        assert!(categories.matches(Category::Person, &["人物".to_string()]));
    }
}
