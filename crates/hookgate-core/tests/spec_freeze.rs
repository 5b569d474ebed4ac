//! Spec-freeze gate driven from raw hook payloads.

use hookgate_core::{AllowReason, FreezePolicy, GateDecision, SpecFreezeGate};
use serde_json::json;

fn gate() -> SpecFreezeGate {
    SpecFreezeGate::new(FreezePolicy::default()).unwrap()
}

#[test]
fn frozen_plan_edit_blocks_with_exit_2() {
    let raw = json!({
        "tool_name": "Edit",
        "tool_input": {
            "file_path": "/work/app/.specify/specs/002-billing/plan.md",
            "old_string": "a",
            "new_string": "b"
        },
        "session_id": "s-1"
    })
    .to_string();

    let decision = gate().evaluate_raw(&raw);
    assert_eq!(decision.exit_code(), 2);

    let body: serde_json::Value =
        serde_json::from_str(&decision.payload().unwrap().to_json()).unwrap();
    assert!(body["error"].as_str().unwrap().contains("plan.md"));
    assert!(body["resolution"].as_array().unwrap().len() >= 2);
}

#[test]
fn ordinary_source_edit_allowed() {
    let raw = json!({
        "tool_name": "Write",
        "tool_input": {"file_path": "/work/app/src/lib.rs", "content": ""}
    })
    .to_string();
    assert_eq!(
        gate().evaluate_raw(&raw),
        GateDecision::Allow(AllowReason::UnprotectedPath)
    );
}

#[test]
fn malformed_payload_fails_open() {
    assert_eq!(
        gate().evaluate_raw("{\"tool_name\": \"Edit\""),
        GateDecision::Allow(AllowReason::MalformedInput)
    );
    assert_eq!(
        gate().evaluate_raw("   "),
        GateDecision::Allow(AllowReason::EmptyInput)
    );
}

#[test]
fn custom_policy_protects_extra_paths() {
    let policy = FreezePolicy {
        protected_patterns: vec![r"(^|/)ROADMAP\.md$".to_string()],
        ..FreezePolicy::default()
    };
    let gate = SpecFreezeGate::new(policy).unwrap();
    assert!(gate.is_protected("docs/roadmap.md"));
    assert!(!gate.is_protected("docs/PRD.md"));
}

#[test]
fn multi_edit_with_top_level_path_blocks() {
    let raw = r#"{"tool_name":"MultiEdit","tool_input":{"file_path":"/repo/docs/PRD.md","edits":[{"old_string":"a","new_string":"b"}]}}"#;
    let decision = gate().evaluate_raw(raw);
    assert_eq!(decision.exit_code(), 2);
    assert!(decision.payload().unwrap().error.contains("PRD.md"));
}
