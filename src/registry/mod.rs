pub mod catalog;
pub mod validation;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Built-in command table, shipped with the crate.
const BUILTIN_TABLE: &str = include_str!("../../resources/commands.json");

// ── Command metadata ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCategory {
    Editor,
    Blueprint,
    Widget,
    #[default]
    #[serde(other)]
    Other,
}

impl CommandCategory {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::Blueprint => "blueprint",
            Self::Widget => "widget",
            Self::Other => "other",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Editor => "Level actors, viewport and screenshots",
            Self::Blueprint => "Create, extend and compile Blueprint classes",
            Self::Widget => "UMG widget blueprints, elements and event bindings",
            Self::Other => "Commands from custom tables",
        }
    }

    pub fn all() -> &'static [CommandCategory] {
        &[Self::Editor, Self::Blueprint, Self::Widget, Self::Other]
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.slug().eq_ignore_ascii_case(slug))
    }
}

/// One row of the command table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    #[serde(default)]
    pub category: CommandCategory,
    #[serde(default)]
    pub description: String,
    /// Keys that must be present and truthy before the command is sent.
    #[serde(default)]
    pub required: Vec<String>,
    /// Other parameters the command understands. Documented only; the remote
    /// side checks them.
    #[serde(default, alias = "optional", skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TableFile {
    commands: Vec<CommandSpec>,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read command table {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid command table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("command table entry {0} has an empty name")]
    EmptyName(usize),
}

// ── Table ───────────────────────────────────────────────────────

/// Command kind → required parameter keys, kept in file order.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    specs: IndexMap<String, CommandSpec>,
}

impl CommandTable {
    /// The table bundled in `resources/commands.json`.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_TABLE).unwrap_or_else(|e| {
            error!(error = %e, "built-in command table is invalid; validation disabled");
            Self::default()
        })
    }

    pub fn from_json(text: &str) -> Result<Self, TableError> {
        let file: TableFile = serde_json::from_str(text)?;
        Self::from_specs(file.commands)
    }

    pub fn load(path: &Path) -> Result<Self, TableError> {
        let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_specs(specs: impl IntoIterator<Item = CommandSpec>) -> Result<Self, TableError> {
        let mut table = Self::default();
        for (i, spec) in specs.into_iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(TableError::EmptyName(i));
            }
            table.insert(spec);
        }
        Ok(table)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, spec: CommandSpec) {
        if let Some(previous) = self.specs.insert(spec.name.clone(), spec) {
            warn!(command = %previous.name, "command table entry replaced");
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.specs.get(name)
    }

    /// Required keys for `name`; empty for commands the table does not list.
    pub fn required(&self, name: &str) -> &[String] {
        self.specs
            .get(name)
            .map(|spec| spec.required.as_slice())
            .unwrap_or_default()
    }

    pub fn specs(&self) -> impl Iterator<Item = &CommandSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_parses() {
        let table = CommandTable::from_json(BUILTIN_TABLE).unwrap();
        assert_eq!(table.len(), 14);
        assert_eq!(table.required("create_blueprint"), ["name", "parent_class"]);
        assert_eq!(table.required("spawn_actor"), ["name", "type"]);
        assert_eq!(
            table.required("add_component_to_blueprint"),
            ["blueprint_name", "component_type", "component_name"]
        );
        assert!(table.required("get_actors_in_level").is_empty());
        assert!(table.required("not_a_command").is_empty());
    }

    #[test]
    fn catalog_entries_document_without_requiring() {
        let table = CommandTable::builtin();
        let enforced: Vec<&str> = table
            .specs()
            .filter(|s| !s.required.is_empty())
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(enforced, ["spawn_actor", "create_blueprint", "add_component_to_blueprint"]);
        assert_eq!(table.get("find_actors_by_name").unwrap().params, ["pattern"]);
        assert!(table.required("bind_widget_event").is_empty());
    }

    #[test]
    fn every_builtin_entry_has_a_known_category() {
        let table = CommandTable::builtin();
        assert!(table.specs().all(|s| s.category != CommandCategory::Other));
        assert!(table.specs().all(|s| !s.description.is_empty()));
    }

    #[test]
    fn custom_table_extends_without_code() {
        let table = CommandTable::from_json(
            r#"{"commands": [{"name": "set_light_color", "category": "lighting", "required": ["name", "color"]}]}"#,
        )
        .unwrap();
        let spec = table.get("set_light_color").unwrap();
        assert_eq!(spec.category, CommandCategory::Other);
        assert_eq!(spec.required, ["name", "color"]);
    }

    #[test]
    fn later_entries_replace_earlier_ones() {
        let table = CommandTable::from_json(
            r#"{"commands": [{"name": "a", "required": ["x"]}, {"name": "a", "required": ["y"]}]}"#,
        )
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.required("a"), ["y"]);
    }

    #[test]
    fn empty_names_are_rejected() {
        let err = CommandTable::from_json(r#"{"commands": [{"name": " "}]}"#).unwrap_err();
        assert!(matches!(err, TableError::EmptyName(0)));
    }

    #[test]
    fn load_reports_the_path() {
        let err = CommandTable::load(Path::new("/nonexistent/commands.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/commands.json"));
    }

    #[test]
    fn category_slugs() {
        assert_eq!(CommandCategory::from_slug("Blueprint"), Some(CommandCategory::Blueprint));
        assert_eq!(CommandCategory::from_slug("nope"), None);
    }
}
