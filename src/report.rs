//! Render a batch result for callers: a JSON array for machines, a short
//! per-item listing for people.

use std::fmt::Write;

use serde::Serialize;

use crate::batch::BatchResult;
use crate::envelope::{ResponseEnvelope, Status};

/// The JSON array handed back to the model or the calling agent.
pub fn to_json(result: &BatchResult, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    };
    rendered.unwrap_or_else(|e| {
        format!(r#"[{{"status": "error", "error": "could not serialize result: {e}", "error_kind": "invocation"}}]"#)
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub unknown: usize,
    pub warnings: usize,
}

pub fn summarize(result: &BatchResult) -> Summary {
    let mut summary = Summary {
        total: result.len(),
        ..Summary::default()
    };
    for envelope in result {
        match envelope.status {
            Status::Success => summary.succeeded += 1,
            Status::Error => summary.failed += 1,
            Status::Unknown => summary.unknown += 1,
            Status::Warning => summary.warnings += 1,
        }
    }
    summary
}

/// One line per envelope, then a totals line.
pub fn render_text(result: &BatchResult) -> String {
    let mut out = String::new();
    for (position, envelope) in result.iter().enumerate() {
        let _ = writeln!(out, "{}", describe(position, envelope));
    }
    let s = summarize(result);
    let _ = write!(
        out,
        "{} command(s): {} ok, {} failed, {} unknown",
        s.total, s.succeeded, s.failed, s.unknown
    );
    if s.warnings > 0 {
        let _ = write!(out, ", {} warning(s)", s.warnings);
    }
    out
}

fn describe(position: usize, envelope: &ResponseEnvelope) -> String {
    let index = envelope.index().unwrap_or(position);
    let command = envelope.command().unwrap_or("-");
    let status = match envelope.status {
        Status::Success => "ok",
        Status::Error => "error",
        Status::Unknown => "unknown",
        Status::Warning => "warning",
    };
    match (&envelope.error, envelope.payload.get("message").and_then(|m| m.as_str())) {
        (Some(error), _) => format!("[{index}] {command}: {status} ({error})"),
        (None, Some(message)) => format!("[{index}] {command}: {status} ({message})"),
        (None, None) => format!("[{index}] {command}: {status}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::error::ErrorKind;

    fn sample() -> BatchResult {
        BatchResult(vec![
            ResponseEnvelope::success(Map::new()).with_command("focus_viewport").with_index(0),
            ResponseEnvelope::failure(ErrorKind::Validation, "missing required parameters for 'spawn_actor': type")
                .with_command("spawn_actor")
                .with_index(1),
            ResponseEnvelope::from_response(Some(json!("done"))).with_index(2),
        ])
    }

    #[test]
    fn json_is_a_flat_array() {
        let value: Value = serde_json::from_str(&to_json(&sample(), false)).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1]["status"], "error");
        assert_eq!(items[1]["error_kind"], "validation");
        assert_eq!(items[2]["raw_response"], "done");
    }

    #[test]
    fn summary_counts() {
        assert_eq!(
            summarize(&sample()),
            Summary {
                total: 3,
                succeeded: 1,
                failed: 1,
                unknown: 1,
                warnings: 0
            }
        );
    }

    #[test]
    fn text_rendering() {
        let text = render_text(&sample());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[0] focus_viewport: ok");
        assert_eq!(lines[1], "[1] spawn_actor: error (missing required parameters for 'spawn_actor': type)");
        assert_eq!(lines[2], "[2] -: unknown");
        assert_eq!(lines[3], "3 command(s): 1 ok, 1 failed, 1 unknown");
    }

    #[test]
    fn warning_rendering() {
        let text = render_text(&BatchResult(vec![ResponseEnvelope::warning("empty command list")]));
        assert!(text.starts_with("[0] -: warning (empty command list)"));
        assert!(text.ends_with(", 1 warning(s)"));
    }
}
