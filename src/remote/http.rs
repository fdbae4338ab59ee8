//! HTTP bridge endpoint: `POST {base_url}/api/send-command` with
//! `{"command": name, "parameters": {...}}` as the body.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::{Connection, TransportError};

const SEND_COMMAND_ROUTE: &str = "/api/send-command";

#[derive(Serialize)]
struct CommandRequest<'a> {
    command: &'a str,
    parameters: &'a Map<String, Value>,
}

pub struct HttpConnection {
    client: Client,
    base_url: String,
}

impl HttpConnection {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{SEND_COMMAND_ROUTE}", self.base_url)
    }
}

impl Connection for HttpConnection {
    fn send_command(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<Option<Value>, TransportError> {
        let url = self.endpoint();
        debug!(command = name, %url, "posting command");
        let request = CommandRequest {
            command: name,
            parameters: params,
        };
        let response = self.client.post(&url).json(&request).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }
}
