//! End-to-end batch runs against an in-memory editor connection.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use std::sync::Arc;

use serde_json::{json, Value};

use common::{connected, RecordingConnection};
use unreal_pilot::batch::{plan, BatchExecutor, CancelFlag};
use unreal_pilot::remote::{Connection, ConnectionSlot, TransportError};
use unreal_pilot::{report, run_batch, CommandInput, CommandTable, ErrorKind, Status};

#[test]
fn unlisted_command_passes_straight_through() {
    let (slot, conn) = connected();
    let result = run_batch(
        json!([{"command": "get_actors_in_level", "parameters": {}}]),
        &CommandTable::builtin(),
        &slot,
    );
    assert_eq!(result.len(), 1);
    assert_eq!(result.0[0].status, Status::Success);
    assert_eq!(conn.names(), vec!["get_actors_in_level"]);
}

#[test]
fn missing_parent_class_makes_no_call() {
    let (slot, conn) = connected();
    let result = run_batch(
        r#"{"command":"create_blueprint","parameters":{"name":"BP_X"}}"#,
        &CommandTable::builtin(),
        &slot,
    );
    assert_eq!(result.len(), 1);
    let env = &result.0[0];
    assert_eq!(env.error_kind(), Some(ErrorKind::Validation));
    assert_eq!(
        env.error.as_deref(),
        Some("missing required parameters for 'create_blueprint': parent_class")
    );
    assert_eq!(env.command(), Some("create_blueprint"));
    assert!(conn.calls.lock().is_empty());
}

#[test]
fn fenced_model_output() {
    let (slot, conn) = connected();
    let text = "Sure! Here is the plan:\n\n```json\n{\"commands_list\": [\n  {\"command\": \"create_blueprint\", \"params\": {\"name\": \"BP_Door\", \"parent_class\": \"Actor\"}},\n  {\"command\": \"compile_blueprint\", \"params\": {\"blueprint_name\": \"BP_Door\"}}\n]}\n```\nLet me know if you need anything else.";
    let result = run_batch(text, &CommandTable::builtin(), &slot);
    assert!(!result.has_errors());
    assert_eq!(conn.names(), vec!["create_blueprint", "compile_blueprint"]);
    assert_eq!(conn.params(0).get("parent_class"), Some(&json!("Actor")));
}

#[test]
fn literal_notation_is_parsed_not_evaluated() {
    let (slot, conn) = connected();
    let text = "[spawn_actor(name='Lamp', type='PointLight', location=[0, 0, 120]), focus_viewport(target='Lamp')]";
    let result = run_batch(text, &CommandTable::builtin(), &slot);
    assert!(!result.has_errors());
    assert_eq!(conn.names(), vec!["spawn_actor", "focus_viewport"]);
    assert_eq!(conn.params(0).get("location"), Some(&json!([0, 0, 120])));
    assert_eq!(conn.params(1).get("target"), Some(&json!("Lamp")));
}

#[test]
fn hostile_text_is_a_parse_error() {
    let (slot, conn) = connected();
    let result = run_batch(r#"__import__("os").system("rm -rf /")"#, &CommandTable::builtin(), &slot);
    assert_eq!(result.len(), 1);
    assert_eq!(result.0[0].error_kind(), Some(ErrorKind::Parse));
    assert_eq!(result.0[0].payload.get("offset"), Some(&json!(16)));
    assert!(conn.calls.lock().is_empty());
}

#[test]
fn wrapper_holding_encoded_text() {
    let (slot, conn) = connected();
    let inner = json!([{"command": "delete_actor", "params": {"name": "Cube"}}]).to_string();
    let result = run_batch(json!({"input": inner}), &CommandTable::builtin(), &slot);
    assert_eq!(result.len(), 1);
    assert_eq!(conn.names(), vec!["delete_actor"]);
    assert_eq!(conn.params(0).get("name"), Some(&json!("Cube")));
}

#[test]
fn single_command_record() {
    let (slot, conn) = connected();
    let input = CommandInput::from_value(json!({"command": "take_screenshot", "params": {"filename": "shot.png"}}));
    assert!(matches!(input, CommandInput::SingleCommand(_)));
    let table = CommandTable::builtin();
    let result = BatchExecutor::new(&table, &slot).run(input);
    assert_eq!(result.len(), 1);
    assert_eq!(conn.names(), vec!["take_screenshot"]);
}

#[test]
fn falsy_required_values_are_missing() {
    let (slot, conn) = connected();
    let result = run_batch(
        json!([
            {"command": "spawn_actor", "params": {"name": "", "type": "StaticMeshActor"}},
            {"command": "spawn_actor", "params": {"name": "Rock", "type": "StaticMeshActor"}},
        ]),
        &CommandTable::builtin(),
        &slot,
    );
    assert!(result.0[0].error.as_deref().unwrap().ends_with(": name"));
    assert_eq!(result.0[1].status, Status::Success);
    assert_eq!(conn.names(), vec!["spawn_actor"]);
}

#[test]
fn remote_errors_and_transport_failures_stay_per_item() {
    let conn = RecordingConnection::scripted(vec![
        Ok(Some(json!({"status": "error", "error": "Actor 'Ghost' not found"}))),
        Err(TransportError::Closed("peer reset".into())),
        Ok(None),
        Ok(Some(json!("OK"))),
    ]);
    let slot = ConnectionSlot::new(conn.clone());
    let result = run_batch(
        json!([
            {"command": "delete_actor", "params": {"name": "Ghost"}},
            {"command": "focus_viewport"},
            {"command": "take_screenshot"},
            {"command": "get_actors_in_level"},
            {"command": "get_actors_in_level"},
        ]),
        &CommandTable::builtin(),
        &slot,
    );
    assert_eq!(result.len(), 5);
    assert_eq!(result.0[0].error.as_deref(), Some("Actor 'Ghost' not found"));
    assert_eq!(result.0[1].error.as_deref(), Some("connection closed: peer reset"));
    assert_eq!(result.0[1].command(), Some("focus_viewport"));
    assert_eq!(result.0[2].error.as_deref(), Some("no response"));
    assert_eq!(result.0[3].status, Status::Unknown);
    assert_eq!(result.0[3].payload.get("raw_response"), Some(&json!("OK")));
    assert_eq!(result.0[4].status, Status::Success);
    for (i, env) in result.iter().enumerate() {
        assert_eq!(env.index(), Some(i));
    }
    assert_eq!(conn.calls.lock().len(), 5);
}

#[test]
fn provider_without_connection() {
    let provider = || -> Option<Arc<dyn Connection>> { None };
    let result = run_batch(
        "[focus_viewport(), take_screenshot()]",
        &CommandTable::builtin(),
        &provider,
    );
    assert_eq!(result.len(), 2);
    assert!(result
        .iter()
        .all(|env| env.error_kind() == Some(ErrorKind::Connection)));
}

#[test]
fn cancelled_up_front_sends_nothing() {
    let (slot, conn) = connected();
    let table = CommandTable::builtin();
    let flag = CancelFlag::new();
    flag.cancel();
    let result = BatchExecutor::new(&table, &slot)
        .with_cancel(flag)
        .run(CommandInput::from_value(json!(["focus_viewport", "take_screenshot"])));
    assert_eq!(result.len(), 2);
    assert!(result
        .iter()
        .all(|env| env.error_kind() == Some(ErrorKind::Cancelled)));
    assert!(conn.calls.lock().is_empty());
}

#[test]
fn json_report_lines_up_with_input() {
    let (slot, _) = connected();
    let result = run_batch(
        json!({"commands": [
            {"command": "create_umg_widget_blueprint", "params": {"name": "WBP_Menu"}},
            {"command": "spawn_actor", "params": {"name": "MenuCamera"}},
            42,
        ]}),
        &CommandTable::builtin(),
        &slot,
    );
    let report: Value = serde_json::from_str(&report::to_json(&result, false)).unwrap();
    let items = report.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["status"], "success");
    assert_eq!(items[1]["error_kind"], "validation");
    assert_eq!(items[1]["index"], 1);
    assert_eq!(items[2]["status"], "error");
    assert_eq!(items[2]["index"], 2);

    let text = report::render_text(&result);
    assert!(text.ends_with("3 command(s): 1 ok, 2 failed, 0 unknown"));
}

#[test]
fn dry_run_reports_without_calling() {
    let table = CommandTable::builtin();
    let planned = plan(
        "```\n[add_component_to_blueprint(blueprint_name='BP_Door', component_type='StaticMeshComponent'), compile_blueprint(blueprint_name='BP_Door')]\n```",
        &table,
    )
    .unwrap();
    assert_eq!(planned.len(), 2);
    assert!(!planned[0].valid);
    assert!(planned[0].error.as_deref().unwrap().contains("component_name"));
    assert!(planned[1].valid);
    assert_eq!(planned[1].command.as_deref(), Some("compile_blueprint"));
}

#[test]
fn replacement_command_table() {
    let table = CommandTable::from_json(
        r#"{"commands": [{"name": "set_light_color", "category": "editor", "description": "Tint a light", "required": ["name", "color"]}]}"#,
    )
    .unwrap();
    let (slot, conn) = connected();
    let result = run_batch(
        json!([
            {"command": "set_light_color", "params": {"name": "Lamp"}},
            {"command": "create_blueprint", "params": {"name": "BP_X"}},
        ]),
        &table,
        &slot,
    );
    assert_eq!(result.0[0].error_kind(), Some(ErrorKind::Validation));
    // create_blueprint is unknown to this table and goes through unchecked.
    assert_eq!(result.0[1].status, Status::Success);
    assert_eq!(conn.names(), vec!["create_blueprint"]);
}

#[test]
fn encoded_batches_match_native_ones() {
    let commands = json!([
        {"command": "create_blueprint", "params": {"name": "BP_Door", "parent_class": "Actor"}},
        {"command": "spawn_actor", "params": {"name": "Door"}},
        {"command": "get_actors_in_level", "parameters": {}},
        "focus_viewport",
        {"command": "delete_actor", "name": "Door"},
    ]);
    let table = CommandTable::builtin();
    let shapes = [
        commands.clone(),
        json!({"commands_list": commands.clone()}),
        json!({"commands": commands.clone()}),
        json!({"command_list": commands.clone()}),
    ];
    for native in shapes {
        let (native_slot, native_conn) = connected();
        let (text_slot, text_conn) = connected();
        let from_native = run_batch(native.clone(), &table, &native_slot);
        let from_text = run_batch(native.to_string(), &table, &text_slot);
        assert_eq!(from_native.len(), 5, "{native}");
        assert_eq!(from_native, from_text, "{native}");
        assert_eq!(*native_conn.calls.lock(), *text_conn.calls.lock(), "{native}");
    }
}

#[test]
fn catalog_only_commands_reach_the_editor() {
    let (slot, conn) = connected();
    let result = run_batch(
        json!([{"command": "find_actors_by_name", "params": {"name": "Player*"}}]),
        &CommandTable::builtin(),
        &slot,
    );
    assert_eq!(result.0[0].status, Status::Success);
    assert_eq!(conn.names(), vec!["find_actors_by_name"]);
    assert_eq!(conn.params(0).get("name"), Some(&json!("Player*")));
}
