//! Required-parameter checks against the command table.

use serde::Serialize;
use serde_json::{Map, Value};

use super::CommandTable;
use crate::error::ValidationError;
use crate::extract::CommandCandidate;
use crate::params::is_truthy;

/// A candidate that is safe to hand to the invoker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedCommand {
    pub index: usize,
    pub name: String,
    pub parameters: Map<String, Value>,
}

/// Check one candidate. Commands the table does not list pass through; the
/// remote side decides whether they exist.
pub fn validate(
    candidate: &CommandCandidate,
    table: &CommandTable,
) -> Result<ValidatedCommand, ValidationError> {
    if let Some(reason) = &candidate.defect {
        return Err(ValidationError::Malformed {
            index: candidate.index,
            reason: reason.clone(),
        });
    }
    let name = candidate
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(ValidationError::MissingName {
            index: candidate.index,
        })?;

    let missing = missing_required(table.required(name), &candidate.parameters);
    if !missing.is_empty() {
        return Err(ValidationError::MissingParameters {
            command: name.to_string(),
            missing,
        });
    }

    Ok(ValidatedCommand {
        index: candidate.index,
        name: name.to_string(),
        parameters: candidate.parameters.clone(),
    })
}

/// Required keys that are absent or falsy, in table order.
pub fn missing_required(required: &[String], parameters: &Map<String, Value>) -> Vec<String> {
    required
        .iter()
        .filter(|key| !parameters.get(key.as_str()).is_some_and(is_truthy))
        .cloned()
        .collect()
}
