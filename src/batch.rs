//! Sequential batch execution with per-item failure isolation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::envelope::ResponseEnvelope;
use crate::error::{ErrorKind, ParseError};
use crate::extract::{extract, CommandCandidate, CommandInput};
use crate::invoke::{invoke_validated, rejected};
use crate::registry::validation::validate;
use crate::registry::CommandTable;
use crate::remote::ConnectionProvider;

/// Cooperative cancellation, checked between items.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One envelope per recovered command, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BatchResult(pub Vec<ResponseEnvelope>);

impl BatchResult {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResponseEnvelope> {
        self.0.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(ResponseEnvelope::is_error)
    }

    pub fn into_inner(self) -> Vec<ResponseEnvelope> {
        self.0
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a ResponseEnvelope;
    type IntoIter = std::slice::Iter<'a, ResponseEnvelope>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub struct BatchExecutor<'a> {
    table: &'a CommandTable,
    provider: &'a dyn ConnectionProvider,
    cancel: Option<CancelFlag>,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(table: &'a CommandTable, provider: &'a dyn ConnectionProvider) -> Self {
        Self {
            table,
            provider,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Recover the command list and run it. Never fails: a parse failure is a
    /// single error envelope, an empty list a single warning.
    pub fn run(&self, input: CommandInput) -> BatchResult {
        match extract(input) {
            Ok(candidates) => self.run_candidates(&candidates),
            Err(e) => {
                error!(error = %e, "no command list recovered");
                BatchResult(vec![parse_failure(&e)])
            }
        }
    }

    pub fn run_candidates(&self, candidates: &[CommandCandidate]) -> BatchResult {
        if candidates.is_empty() {
            warn!("empty command list");
            return BatchResult(vec![ResponseEnvelope::warning("empty command list")]);
        }
        info!(count = candidates.len(), "running batch");
        BatchResult(candidates.iter().map(|c| self.run_one(c)).collect())
    }

    fn run_one(&self, candidate: &CommandCandidate) -> ResponseEnvelope {
        let index = candidate.index;
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            let mut envelope = ResponseEnvelope::failure(ErrorKind::Cancelled, "cancelled before execution");
            if let Some(name) = &candidate.name {
                envelope = envelope.with_command(name);
            }
            return envelope.with_index(index);
        }

        match validate(candidate, self.table) {
            Ok(command) => invoke_validated(self.provider, &command).with_index(index),
            Err(e) => {
                warn!(index, error = %e, "command rejected");
                let mut envelope = rejected(&e);
                if let Some(name) = &candidate.name {
                    envelope = envelope.with_command(name);
                }
                envelope.with_index(index)
            }
        }
    }
}

fn parse_failure(e: &ParseError) -> ResponseEnvelope {
    let mut envelope = ResponseEnvelope::failure(ErrorKind::Parse, e.to_string());
    if let Some(offset) = e.offset {
        envelope.payload.insert("offset".into(), Value::from(offset));
    }
    envelope
}

/// Run `input` against `provider` with no cancellation.
pub fn run_batch(
    input: impl Into<CommandInput>,
    table: &CommandTable,
    provider: &dyn ConnectionProvider,
) -> BatchResult {
    BatchExecutor::new(table, provider).run(input.into())
}

// ── Dry run ─────────────────────────────────────────────────────

/// What a batch would send, without contacting the remote side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedCommand {
    pub index: usize,
    pub command: Option<String>,
    pub params: Map<String, Value>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn plan(input: impl Into<CommandInput>, table: &CommandTable) -> Result<Vec<PlannedCommand>, ParseError> {
    let candidates = extract(input.into())?;
    Ok(candidates
        .iter()
        .map(|candidate| {
            let error = validate(candidate, table).err().map(|e| e.to_string());
            PlannedCommand {
                index: candidate.index,
                command: candidate.name.clone(),
                params: candidate.parameters.clone(),
                valid: error.is_none(),
                error,
            }
        })
        .collect())
}
