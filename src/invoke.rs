//! Send one command to the remote endpoint. Every outcome is an envelope.

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::envelope::ResponseEnvelope;
use crate::error::{ErrorKind, InvocationError, ValidationError};
use crate::extract::CommandCandidate;
use crate::params;
use crate::registry::validation::{validate, ValidatedCommand};
use crate::registry::CommandTable;
use crate::remote::ConnectionProvider;

/// Invoke `name` with parameters of any shape: a mapping, a JSON string, or
/// nothing. Undecodable parameters never reach the remote side.
pub fn invoke(provider: &dyn ConnectionProvider, name: &str, parameters: &Value) -> ResponseEnvelope {
    match params::normalize(parameters) {
        Ok(params) => invoke_normalized(provider, name, &params),
        Err(e) => {
            let err = InvocationError::from(e);
            warn!(command = name, error = %err, "rejected parameters");
            ResponseEnvelope::failure(err.kind(), err.to_string()).with_command(name)
        }
    }
}

/// Invoke a command that already passed validation.
pub fn invoke_validated(provider: &dyn ConnectionProvider, command: &ValidatedCommand) -> ResponseEnvelope {
    invoke_normalized(provider, &command.name, &command.parameters)
}

fn invoke_normalized(
    provider: &dyn ConnectionProvider,
    name: &str,
    params: &Map<String, Value>,
) -> ResponseEnvelope {
    match call(provider, name, params) {
        Ok(response) => {
            let envelope = ResponseEnvelope::from_response(Some(response));
            info!(command = name, status = ?envelope.status, "command finished");
            envelope
        }
        Err(err) => {
            warn!(command = name, error = %err, "command failed");
            ResponseEnvelope::failure(err.kind(), err.to_string()).with_command(name)
        }
    }
}

fn call(
    provider: &dyn ConnectionProvider,
    name: &str,
    params: &Map<String, Value>,
) -> Result<Value, InvocationError> {
    let connection = provider.get_connection().ok_or(InvocationError::NoConnection)?;
    info!(command = name, "sending command");
    connection
        .send_command(name, params)?
        .ok_or(InvocationError::NoResponse)
}

/// Normalize, validate and invoke one command outside of a batch.
pub fn execute_single(
    provider: &dyn ConnectionProvider,
    table: &CommandTable,
    name: &str,
    parameters: &Value,
) -> ResponseEnvelope {
    let parameters = match params::normalize(parameters) {
        Ok(p) => p,
        Err(e) => {
            let err = InvocationError::from(e);
            return ResponseEnvelope::failure(err.kind(), err.to_string()).with_command(name);
        }
    };
    let candidate = CommandCandidate {
        index: 0,
        name: Some(name.to_string()),
        parameters,
        defect: None,
        raw: Value::Null,
    };
    match validate(&candidate, table) {
        Ok(command) => invoke_validated(provider, &command),
        Err(e) => {
            warn!(command = name, error = %e, "validation failed");
            rejected(&e).with_command(name)
        }
    }
}

/// Error envelope for a command stopped before it was sent. Missing keys are
/// also listed under `missing`.
pub(crate) fn rejected(e: &ValidationError) -> ResponseEnvelope {
    let mut envelope = ResponseEnvelope::failure(ErrorKind::Validation, e.to_string());
    if let ValidationError::MissingParameters { missing, .. } = e {
        envelope.payload.insert("missing".into(), Value::from(missing.clone()));
    }
    envelope
}
