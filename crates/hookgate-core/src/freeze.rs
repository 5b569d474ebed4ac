//! Spec-freeze gate.
//!
//! Blocks file-editing tools from modifying frozen requirement documents
//! (specs, plans, task lists, PRDs, API contracts). For multi-edit requests
//! any protected entry blocks the whole request.

use regex::{Regex, RegexBuilder};

use crate::decision::{AllowReason, BlockPayload, GateDecision};
use crate::error::Result;
use crate::event::HookEvent;
use crate::obs;
use crate::policy::FreezePolicy;

/// Gate name used in log events.
pub const FREEZE_GATE: &str = "protect-specs";

/// The spec-freeze gate.
#[derive(Debug, Clone)]
pub struct SpecFreezeGate {
    policy: FreezePolicy,
    patterns: Vec<Regex>,
}

impl SpecFreezeGate {
    pub fn new(policy: FreezePolicy) -> Result<Self> {
        let patterns = policy
            .protected_patterns
            .iter()
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { policy, patterns })
    }

    /// Whether `path` names a frozen document. Backslashes count as `/`.
    pub fn is_protected(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        let normalized = path.replace('\\', "/");
        self.patterns.iter().any(|re| re.is_match(&normalized))
    }

    /// Evaluate raw stdin contents. Unparseable input is allowed.
    pub fn evaluate_raw(&self, raw: &str) -> GateDecision {
        if raw.trim().is_empty() {
            return GateDecision::Allow(AllowReason::EmptyInput);
        }
        match HookEvent::parse(raw) {
            Ok(event) => self.evaluate(&event),
            Err(e) => {
                obs::emit_input_malformed(&e);
                GateDecision::Allow(AllowReason::MalformedInput)
            }
        }
    }

    pub fn evaluate(&self, event: &HookEvent) -> GateDecision {
        let decision = self.decide(event);
        obs::emit_gate_evaluated(FREEZE_GATE, &event.tool_name, &decision);
        decision
    }

    fn decide(&self, event: &HookEvent) -> GateDecision {
        if !self.policy.edit_tools.contains(&event.tool_name) {
            return GateDecision::Allow(AllowReason::UnwatchedTool);
        }

        if event.contains_skip_keyword(&self.policy.skip_keywords) {
            return GateDecision::Allow(AllowReason::SkipKeyword);
        }

        let target = event
            .edit_targets(&self.policy.multi_edit_tool)
            .into_iter()
            .find(|path| self.is_protected(path));

        match target {
            Some(path) => GateDecision::Block(self.payload(path)),
            None => GateDecision::Allow(AllowReason::UnprotectedPath),
        }
    }

    fn payload(&self, path: &str) -> BlockPayload {
        let normalized = path.replace('\\', "/");
        let name = normalized.rsplit('/').next().unwrap_or(path);
        let skip = self
            .policy
            .skip_keywords
            .first()
            .map(String::as_str)
            .unwrap_or("a skip keyword");
        BlockPayload::new(format!("spec freeze: editing {name} is not allowed"))
            .with_reason("specification files are protected until the requirement is accepted")
            .with_resolution("take spec changes through the acceptance process first")
            .with_resolution(format!("in an emergency, add {skip} for a one-off exemption"))
            .with_resolution("re-check spec consistency once the change is done")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gate() -> SpecFreezeGate {
        SpecFreezeGate::new(FreezePolicy::default()).unwrap()
    }

    fn edit(tool: &str, path: &str) -> HookEvent {
        HookEvent::from_value(&json!({
            "tool_name": tool,
            "tool_input": {"file_path": path, "new_string": "x"}
        }))
        .unwrap()
    }

    #[test]
    fn test_protected_patterns() {
        let g = gate();
        assert!(g.is_protected("/repo/.specify/specs/001-login/spec.md"));
        assert!(g.is_protected("/repo/.specify/specs/001-login/tasks.md"));
        assert!(g.is_protected("/repo/.specify/memory/constitution.md"));
        assert!(g.is_protected("C:\\work\\docs\\PRD.md"));
        assert!(g.is_protected("/repo/docs/prd.md"));
        assert!(g.is_protected("/repo/specs/v1/api-spec.json"));
        assert!(g.is_protected("/repo/specs/v1/data-model.md"));
        assert!(!g.is_protected("/repo/src/spec.md"));
        assert!(!g.is_protected("/repo/README.md"));
        assert!(!g.is_protected(""));
    }

    #[test]
    fn test_edit_of_frozen_spec_blocked() {
        let decision = gate().evaluate(&edit("Edit", "/repo/.specify/specs/001/spec.md"));
        let payload = decision.payload().unwrap();
        assert!(payload.error.contains("spec.md"));
        assert!(!payload.error.contains(".specify"));
        assert_eq!(payload.resolution.len(), 3);
    }

    #[test]
    fn test_read_tool_allowed() {
        assert_eq!(
            gate().evaluate(&edit("Read", "/repo/.specify/specs/001/spec.md")),
            GateDecision::Allow(AllowReason::UnwatchedTool)
        );
    }

    #[test]
    fn test_relative_path_fallback() {
        let event = HookEvent::from_value(&json!({
            "tool_name": "mcp__serena__create_text_file",
            "tool_input": {"relative_path": "docs/requirements.md"}
        }))
        .unwrap();
        assert!(!gate().evaluate(&event).is_allowed());
    }

    #[test]
    fn test_multi_edit_blocks_on_any_protected_entry() {
        let event = HookEvent::from_value(&json!({
            "tool_name": "MultiEdit",
            "tool_input": {"edits": [
                {"file_path": "/repo/src/main.rs"},
                {"file_path": "/repo/docs/PRD.md"}
            ]}
        }))
        .unwrap();
        let decision = gate().evaluate(&event);
        assert!(decision.payload().unwrap().error.contains("PRD.md"));
    }

    #[test]
    fn test_multi_edit_top_level_path_is_checked() {
        let event = HookEvent::from_value(&json!({
            "tool_name": "MultiEdit",
            "tool_input": {
                "file_path": "/repo/docs/PRD.md",
                "edits": [{"old_string": "a", "new_string": "b"}]
            }
        }))
        .unwrap();
        let decision = gate().evaluate(&event);
        assert!(decision.payload().unwrap().error.contains("PRD.md"));
    }

    #[test]
    fn test_skip_keyword_exempts() {
        let event = HookEvent::from_value(&json!({
            "tool_name": "Write",
            "tool_input": {"file_path": "/repo/docs/PRD.md", "content": "临时修改 scope"}
        }))
        .unwrap();
        assert_eq!(
            gate().evaluate(&event),
            GateDecision::Allow(AllowReason::SkipKeyword)
        );
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let policy = FreezePolicy {
            protected_patterns: vec!["(".to_string()],
            ..FreezePolicy::default()
        };
        assert!(SpecFreezeGate::new(policy).is_err());
    }
}
