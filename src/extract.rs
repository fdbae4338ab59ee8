//! Recover an ordered command list from model output of unknown shape.
//!
//! Strategies run in a fixed order and the first structural success wins, so
//! the same input always yields the same candidates.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ParseError;
use crate::literal;
use crate::params::{self, kind_name};

/// Keys under which models tend to nest the real command list, in lookup order.
pub const WRAPPER_KEYS: &[&str] = &[
    "commands_list",
    "commands",
    "command_list",
    "batch",
    "input",
    "data",
];

const PARAMS_KEYS: &[&str] = &["params", "parameters"];

/// How many wrapper layers (or re-encoded strings) are peeled before giving up.
pub const MAX_WRAPPER_DEPTH: usize = 4;

#[allow(clippy::expect_used)] // constant pattern
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:[A-Za-z0-9_+-]*[ \t]*\r?\n)?(.*?)```").expect("fence pattern")
});

#[allow(clippy::expect_used)] // constant pattern
static COMMAND_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""command"\s*:"#).expect("command key pattern"));

/// Shape-ambiguous input handed to the extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandInput {
    List(Vec<Value>),
    Mapping(Map<String, Value>),
    Text(String),
    SingleCommand(Map<String, Value>),
}

impl CommandInput {
    /// Classify an untyped value.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => CommandInput::List(items),
            Value::Object(map) => {
                if !has_wrapper_key(&map) && is_command_record(&map) {
                    CommandInput::SingleCommand(map)
                } else {
                    CommandInput::Mapping(map)
                }
            }
            Value::String(text) => CommandInput::Text(text),
            Value::Null => CommandInput::List(Vec::new()),
            other => CommandInput::Text(other.to_string()),
        }
    }
}

impl From<Value> for CommandInput {
    fn from(value: Value) -> Self {
        CommandInput::from_value(value)
    }
}

impl From<&str> for CommandInput {
    fn from(text: &str) -> Self {
        CommandInput::Text(text.to_string())
    }
}

impl From<String> for CommandInput {
    fn from(text: String) -> Self {
        CommandInput::Text(text)
    }
}

/// One recovered command, possibly unusable. Defective candidates keep their
/// place in the sequence so the batch result lines up with the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandCandidate {
    pub index: usize,
    pub name: Option<String>,
    pub parameters: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defect: Option<String>,
    pub raw: Value,
}

impl CommandCandidate {
    fn from_element(index: usize, element: Value) -> Self {
        let mut candidate = CommandCandidate {
            index,
            name: None,
            parameters: Map::new(),
            defect: None,
            raw: Value::Null,
        };
        match &element {
            Value::Object(map) => candidate.read_record(map),
            Value::String(s) if !s.trim().is_empty() => {
                candidate.name = Some(s.trim().to_string());
            }
            other => {
                candidate.defect = Some(format!(
                    "expected a command mapping or name, got {}",
                    kind_name(other)
                ));
            }
        }
        candidate.raw = element;
        candidate
    }

    fn read_record(&mut self, map: &Map<String, Value>) {
        let params_value = PARAMS_KEYS.iter().find_map(|key| map.get(*key));
        let name_value = map
            .get("command")
            .or_else(|| params_value.and_then(|_| map.get("name")));

        match name_value {
            Some(Value::String(s)) if !s.trim().is_empty() => self.name = Some(s.trim().to_string()),
            Some(Value::String(_)) | None => {}
            Some(other) => {
                self.defect = Some(format!("command name must be a string, got {}", kind_name(other)));
            }
        }

        match params_value {
            Some(value) => match params::normalize(value) {
                Ok(parameters) => self.parameters = parameters,
                Err(e) => {
                    self.defect.get_or_insert_with(|| e.to_string());
                }
            },
            None => {
                self.parameters = map
                    .iter()
                    .filter(|(key, _)| !matches!(key.as_str(), "command" | "description"))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
            }
        }
    }

    /// Canonical `{"command": ..., "params": {...}}` form. Candidates without a
    /// usable name return the element they came from.
    pub fn to_record(&self) -> Value {
        match (&self.name, &self.defect) {
            (Some(name), None) => {
                let mut record = Map::new();
                record.insert("command".into(), Value::String(name.clone()));
                record.insert("params".into(), Value::Object(self.parameters.clone()));
                Value::Object(record)
            }
            _ => self.raw.clone(),
        }
    }
}

/// Recover the ordered candidate list.
pub fn extract(input: CommandInput) -> Result<Vec<CommandCandidate>, ParseError> {
    let elements = recover(input, 0)?;
    debug!(count = elements.len(), "recovered command list");
    Ok(elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| CommandCandidate::from_element(index, element))
        .collect())
}

fn recover(input: CommandInput, depth: usize) -> Result<Vec<Value>, ParseError> {
    match input {
        CommandInput::List(items) => Ok(from_list(items, depth)),
        CommandInput::Mapping(map) => from_mapping(map, depth),
        CommandInput::SingleCommand(map) => Ok(vec![Value::Object(map)]),
        CommandInput::Text(text) => from_text(&text, depth),
    }
}

fn from_list(items: Vec<Value>, depth: usize) -> Vec<Value> {
    // `[{"commands": [...]}]`: a lone wrapper inside a list.
    if let [Value::Object(map)] = items.as_slice() {
        if !is_command_record(map) && has_wrapper_key(map) {
            if let Ok(inner) = from_mapping(map.clone(), depth + 1) {
                debug!("unwrapped single-element list holding a wrapper");
                return inner;
            }
        }
    }
    items
}

fn from_mapping(map: Map<String, Value>, depth: usize) -> Result<Vec<Value>, ParseError> {
    if depth > MAX_WRAPPER_DEPTH {
        return Err(ParseError::new(format!(
            "wrappers nested deeper than {MAX_WRAPPER_DEPTH} levels"
        )));
    }

    for key in WRAPPER_KEYS {
        match map.get(*key) {
            Some(Value::Array(items)) => {
                debug!(key, "command list found under wrapper key");
                return Ok(from_list(items.clone(), depth + 1));
            }
            Some(Value::String(text)) => match from_text(text, depth + 1) {
                Ok(list) => return Ok(list),
                Err(e) => debug!(key, error = %e, "wrapper text did not hold a command list"),
            },
            Some(Value::Object(inner)) => match from_mapping(inner.clone(), depth + 1) {
                Ok(list) => return Ok(list),
                Err(e) => debug!(key, error = %e, "wrapper mapping did not hold a command list"),
            },
            _ => {}
        }
    }

    if is_command_record(&map) {
        return Ok(vec![Value::Object(map)]);
    }

    if map.len() == 1 {
        match map.into_iter().next() {
            Some((key, Value::Array(items))) => {
                debug!(key = %key, "unwrapped single-entry mapping");
                return Ok(from_list(items, depth + 1));
            }
            Some((key, Value::String(text))) => {
                debug!(key = %key, "unwrapped single-entry mapping holding text");
                return from_text(&text, depth + 1);
            }
            _ => {}
        }
    }

    Err(ParseError::new(format!(
        "mapping has no command list under any of [{}] and no \"command\" key",
        WRAPPER_KEYS.join(", ")
    )))
}

fn from_text(text: &str, depth: usize) -> Result<Vec<Value>, ParseError> {
    if depth > MAX_WRAPPER_DEPTH {
        return Err(ParseError::new(format!(
            "text re-encoded deeper than {MAX_WRAPPER_DEPTH} levels"
        )));
    }
    let trimmed = text.trim();
    let mut failures: Vec<String> = Vec::new();

    // a. the whole string is JSON
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => {
            debug!("input decoded as JSON");
            if let Some(result) = from_decoded(value, depth) {
                return result;
            }
            failures.push("JSON decodes to a scalar".into());
        }
        Err(e) => failures.push(format!("not JSON ({e})")),
    }

    // b. JSON inside a fenced code block
    let fence = fenced_body(trimmed);
    match fence {
        Some(body) => match serde_json::from_str::<Value>(body) {
            Ok(value) => {
                debug!("fenced block decoded as JSON");
                if let Some(result) = from_decoded(value, depth) {
                    return result;
                }
                failures.push("fenced block decodes to a scalar".into());
            }
            Err(e) => failures.push(format!("fenced block is not JSON ({e})")),
        },
        None => failures.push("no fenced code block".into()),
    }

    // c. literal notation, on the raw text and then on the fence body. The raw
    // text is not trimmed so offsets point into the caller's input.
    let mut literal_offset = None;
    for source in std::iter::once(text).chain(fence) {
        match literal::parse(source) {
            Ok(value) => {
                debug!("input parsed as literal notation");
                if let Some(result) = from_decoded(value, depth) {
                    return result;
                }
                failures.push("literal is a scalar".into());
            }
            Err(e) => {
                literal_offset.get_or_insert(e.offset());
                failures.push(format!("not a literal ({e})"));
            }
        }
    }

    // d. first embedded object carrying a command key
    if let Some(record) = first_command_object(trimmed) {
        debug!("recovered a single embedded command object");
        return Ok(vec![Value::Object(record)]);
    }
    failures.push("no embedded object with a \"command\" key".into());

    Err(ParseError {
        message: failures.join("; "),
        offset: literal_offset,
    })
}

/// Route a decoded value back through the structural strategies. Scalars are
/// not a command list.
fn from_decoded(value: Value, depth: usize) -> Option<Result<Vec<Value>, ParseError>> {
    match value {
        Value::Array(items) => Some(Ok(from_list(items, depth))),
        Value::Object(map) => Some(from_mapping(map, depth + 1)),
        Value::String(inner) => Some(from_text(&inner, depth + 1)),
        _ => None,
    }
}

fn fenced_body(text: &str) -> Option<&str> {
    FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|body| !body.is_empty())
}

/// How many candidate spans the brace scan hands to the JSON decoder.
const MAX_SCAN_ATTEMPTS: usize = 64;

/// Return the first `{...}` span, by start position, that decodes to an object
/// with a `command` key. Braces are paired in one pass and only spans holding a
/// `"command":` match are decoded.
fn first_command_object(text: &str) -> Option<Map<String, Value>> {
    let keys: Vec<usize> = COMMAND_KEY.find_iter(text).map(|m| m.start()).collect();
    if keys.is_empty() {
        return None;
    }
    let mut spans = brace_spans(text);
    spans.sort_unstable_by_key(|&(start, _)| start);
    spans
        .into_iter()
        .filter(|&(start, end)| {
            let next_key = keys.partition_point(|&k| k < start);
            keys.get(next_key).is_some_and(|&k| k < end)
        })
        .take(MAX_SCAN_ATTEMPTS)
        .find_map(|(start, end)| match serde_json::from_str::<Value>(text.get(start..=end)?) {
            Ok(Value::Object(map)) if map.contains_key("command") => Some(map),
            _ => None,
        })
}

/// Byte positions of every matched `{`/`}` pair. Quotes only open a string
/// inside braces, so quotes in surrounding prose do not hide objects.
fn brace_spans(text: &str) -> Vec<(usize, usize)> {
    let mut open: Vec<usize> = Vec::new();
    let mut spans = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (offset, byte) in text.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(offset),
            b'}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, offset));
                }
            }
            _ => {}
        }
    }
    spans
}

fn has_wrapper_key(map: &Map<String, Value>) -> bool {
    WRAPPER_KEYS.iter().any(|key| map.contains_key(*key))
}

fn is_command_record(map: &Map<String, Value>) -> bool {
    map.contains_key("command")
        || (map.contains_key("name") && PARAMS_KEYS.iter().any(|key| map.contains_key(*key)))
}
