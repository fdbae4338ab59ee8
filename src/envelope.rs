//! Uniform per-command result.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
    Unknown,
    Warning,
}

impl Status {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" | "ok" => Some(Self::Success),
            "error" => Some(Self::Error),
            "unknown" => Some(Self::Unknown),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }
}

/// `{status, error?, ...payload}`. Payload keys serialize next to `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ResponseEnvelope {
    pub fn success(payload: Map<String, Value>) -> Self {
        Self {
            status: Status::Success,
            error: None,
            payload,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("message".into(), Value::String(message.into()));
        Self {
            status: Status::Warning,
            error: None,
            payload,
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("error_kind".into(), Value::String(kind.as_str().into()));
        Self {
            status: Status::Error,
            error: Some(message.into()),
            payload,
        }
    }

    /// Normalize whatever the remote side returned.
    pub fn from_response(response: Option<Value>) -> Self {
        match response {
            None => Self::failure(ErrorKind::Invocation, "no response"),
            Some(Value::Object(mut map)) => {
                let status = match map.remove("status") {
                    None | Some(Value::Null) => Status::Success,
                    Some(Value::String(s)) => Status::parse(&s).unwrap_or_else(|| {
                        map.insert("remote_status".into(), Value::String(s));
                        Status::Unknown
                    }),
                    Some(other) => {
                        map.insert("remote_status".into(), other);
                        Status::Unknown
                    }
                };
                let error = match map.remove("error") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s),
                    Some(other) => Some(other.to_string()),
                };
                Self {
                    status,
                    error,
                    payload: map,
                }
            }
            Some(other) => {
                let mut payload = Map::new();
                payload.insert("raw_response".into(), other);
                Self {
                    status: Status::Unknown,
                    error: None,
                    payload,
                }
            }
        }
    }

    pub fn with_command(mut self, name: &str) -> Self {
        self.payload
            .entry("command")
            .or_insert_with(|| Value::String(name.to_string()));
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.payload
            .entry("index")
            .or_insert_with(|| Value::from(index));
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }

    pub fn command(&self) -> Option<&str> {
        self.payload.get("command").and_then(Value::as_str)
    }

    pub fn index(&self) -> Option<usize> {
        self.payload
            .get("index")
            .and_then(Value::as_u64)
            .and_then(|i| usize::try_from(i).ok())
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.payload
            .get("error_kind")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn object_response_passes_through() {
        let env = ResponseEnvelope::from_response(Some(json!({"status": "success", "result": {"actors": []}})));
        assert_eq!(env.status, Status::Success);
        assert_eq!(serde_json::to_value(&env).unwrap(), json!({"status": "success", "result": {"actors": []}}));
    }

    #[test]
    fn missing_status_defaults_to_success() {
        let env = ResponseEnvelope::from_response(Some(json!({"actors": ["A"]})));
        assert_eq!(env.status, Status::Success);
        assert_eq!(env.payload.get("actors"), Some(&json!(["A"])));
    }

    #[test]
    fn remote_error_moves_into_error_field() {
        let env = ResponseEnvelope::from_response(Some(json!({"status": "error", "error": "Blueprint not found"})));
        assert!(env.is_error());
        assert_eq!(env.error.as_deref(), Some("Blueprint not found"));
        assert!(!env.payload.contains_key("error"));
    }

    #[test]
    fn unknown_status_is_kept_as_remote_status() {
        let env = ResponseEnvelope::from_response(Some(json!({"status": "queued"})));
        assert_eq!(env.status, Status::Unknown);
        assert_eq!(env.payload.get("remote_status"), Some(&json!("queued")));
    }

    #[test]
    fn non_object_response_is_unknown() {
        let env = ResponseEnvelope::from_response(Some(json!("done")));
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"status": "unknown", "raw_response": "done"})
        );
    }

    #[test]
    fn no_response_is_an_error() {
        let env = ResponseEnvelope::from_response(None).with_command("focus_viewport");
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"status": "error", "error": "no response", "error_kind": "invocation", "command": "focus_viewport"})
        );
        assert_eq!(env.error_kind(), Some(ErrorKind::Invocation));
        assert_eq!(env.command(), Some("focus_viewport"));
    }

    #[test]
    fn index_does_not_overwrite_remote_keys() {
        let env = ResponseEnvelope::from_response(Some(json!({"index": "remote"}))).with_index(2);
        assert_eq!(env.payload.get("index"), Some(&json!("remote")));
        let env = ResponseEnvelope::warning("empty command list").with_index(0);
        assert_eq!(env.index(), Some(0));
    }

    #[test]
    fn deserializes_flat_form() {
        let env: ResponseEnvelope =
            serde_json::from_value(json!({"status": "warning", "message": "empty command list"})).unwrap();
        assert_eq!(env, ResponseEnvelope::warning("empty command list"));
    }
}
