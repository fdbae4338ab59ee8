use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::ParamsError;
use crate::remote::TransportError;

/// No command list could be recovered from the input. The only error that
/// stops a batch before any command runs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("could not recover a command list: {message}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset reported by the literal parser, when it got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            offset: None,
        }
    }
}

/// A single command rejected before it reaches the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum ValidationError {
    #[error("item {index} has no command name")]
    MissingName { index: usize },
    #[error("item {index} is malformed: {reason}")]
    Malformed { index: usize, reason: String },
    #[error("missing required parameters for '{command}': {}", missing.join(", "))]
    MissingParameters { command: String, missing: Vec<String> },
}

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("no connection")]
    NoConnection,
    #[error("no response")]
    NoResponse,
    #[error("invalid parameters: {0}")]
    BadParameters(#[from] ParamsError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl InvocationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InvocationError::NoConnection => ErrorKind::Connection,
            InvocationError::NoResponse
            | InvocationError::BadParameters(_)
            | InvocationError::Transport(_) => ErrorKind::Invocation,
        }
    }
}

/// Category stamped on every error envelope as `error_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Parse,
    Validation,
    Connection,
    Invocation,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Validation => "validation",
            ErrorKind::Connection => "connection",
            ErrorKind::Invocation => "invocation",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}
