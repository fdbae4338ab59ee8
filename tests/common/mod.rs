//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use unreal_pilot::remote::{Connection, ConnectionSlot, TransportError};

/// In-memory editor: records every command and answers from a script, or
/// with a plain success once the script runs out.
#[derive(Default)]
pub struct RecordingConnection {
    pub calls: Mutex<Vec<(String, Map<String, Value>)>>,
    replies: Mutex<VecDeque<Result<Option<Value>, TransportError>>>,
}

impl RecordingConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn scripted(replies: Vec<Result<Option<Value>, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.into()),
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn params(&self, call: usize) -> Map<String, Value> {
        self.calls.lock().get(call).map(|(_, p)| p.clone()).unwrap_or_default()
    }
}

impl Connection for RecordingConnection {
    fn send_command(&self, name: &str, params: &Map<String, Value>) -> Result<Option<Value>, TransportError> {
        self.calls.lock().push((name.to_string(), params.clone()));
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Some(json!({"status": "success", "result": {"command": name}}))))
    }
}

pub fn connected() -> (ConnectionSlot, Arc<RecordingConnection>) {
    let conn = RecordingConnection::new();
    (ConnectionSlot::new(conn.clone()), conn)
}
