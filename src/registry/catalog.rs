//! Help text and tool descriptions for the model, generated from the command table.

use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{CommandCategory, CommandSpec, CommandTable};

/// Wire shape of one command as the model should emit it.
#[allow(dead_code)]
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CommandRecord {
    /// Command name, e.g. `spawn_actor`.
    pub command: String,
    /// Command parameters; see `help` for the required keys.
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Input of the batch tool.
#[allow(dead_code)]
#[derive(Debug, Deserialize, JsonSchema)]
pub struct BatchRequest {
    /// Commands to run in order. Later commands may depend on earlier ones.
    pub commands_list: Vec<CommandRecord>,
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

pub(crate) fn schema_value<T: JsonSchema>() -> Value {
    let root = schema_for!(T);
    serde_json::to_value(root).unwrap_or_else(|_| empty_object_schema())
}

/// The `tools` array offered to the model: `help` for discovery, `execute_command`
/// for one command and `execute_command_batch` for an ordered list.
pub fn to_llm_tools(table: &CommandTable) -> Value {
    let names: Vec<&str> = table.specs().map(|s| s.name.as_str()).collect();
    serde_json::json!([
        {
            "name": "help",
            "description": "Discover available editor commands. No args = list categories. Provide a category name to see its commands, or a command name to see its required parameters.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "topic": {
                        "type": "string",
                        "description": "Category name (e.g. 'blueprint') or command name (e.g. 'spawn_actor')"
                    }
                }
            }
        },
        {
            "name": "execute_command",
            "description": format!(
                "Execute a single editor command. Known commands: {}. Use help() for parameters.",
                names.join(", ")
            ),
            "input_schema": schema_value::<CommandRecord>()
        },
        {
            "name": "execute_command_batch",
            "description": "Execute several editor commands in order. A failing command does not stop the ones after it.",
            "input_schema": schema_value::<BatchRequest>()
        }
    ])
}

/// Three tiers: no topic → categories, category → command list, command → details.
pub fn help_text(table: &CommandTable, topic: Option<&str>) -> String {
    match topic {
        None => {
            let mut lines = vec!["Available command categories:".to_string()];
            for cat in CommandCategory::all() {
                let count = table.specs().filter(|s| s.category == *cat).count();
                if count > 0 {
                    lines.push(format!("  {} ({count}): {}", cat.slug(), cat.description()));
                }
            }
            lines.push(String::new());
            lines.push("Use help({topic: \"blueprint\"}) to list commands in a category.".to_string());
            lines.push("Use help({topic: \"spawn_actor\"}) for parameter details.".to_string());
            lines.join("\n")
        }
        Some(topic) => {
            if let Some(spec) = table.get(topic) {
                return command_details(spec);
            }

            let matching: Vec<&CommandSpec> = match CommandCategory::from_slug(topic) {
                Some(cat) => table.specs().filter(|s| s.category == cat).collect(),
                None => Vec::new(),
            };
            if matching.is_empty() {
                format!("Unknown topic: \"{topic}\". Use help() to see categories and commands.")
            } else {
                let mut lines = vec![format!("{topic} commands:")];
                for spec in &matching {
                    lines.push(format!("  - {}: {}", spec.name, spec.description));
                }
                lines.push(String::new());
                lines.push("Use help({topic: \"command_name\"}) for parameter details.".to_string());
                lines.join("\n")
            }
        }
    }
}

fn command_details(spec: &CommandSpec) -> String {
    let list = |keys: &[String]| {
        if keys.is_empty() {
            "none".to_string()
        } else {
            keys.join(", ")
        }
    };
    let mut text = format!(
        "{}: {}\nCategory: {}\nRequired: {}",
        spec.name,
        spec.description,
        spec.category.slug(),
        list(&spec.required),
    );
    if !spec.params.is_empty() {
        text.push_str(&format!("\nParameters: {}", list(&spec.params)));
    }
    text
}

/// Category → {command: description}, the listing handed to planning agents.
pub fn to_json(table: &CommandTable) -> Value {
    let mut by_category = Map::new();
    for cat in CommandCategory::all() {
        let commands: Map<String, Value> = table
            .specs()
            .filter(|s| s.category == *cat)
            .map(|s| (s.name.clone(), Value::String(s.description.clone())))
            .collect();
        if !commands.is_empty() {
            by_category.insert(cat.slug().to_string(), Value::Object(commands));
        }
    }
    Value::Object(by_category)
}
