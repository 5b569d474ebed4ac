//! Structured observability hooks for gate evaluation.
//!
//! Events are emitted through `tracing`; the binary routes them to stderr at
//! `warn` by default (override with `RUST_LOG`).

use tracing::{debug, info, warn};

use crate::decision::GateDecision;

/// Emit event: a gate reached a decision for one tool call.
pub fn emit_gate_evaluated(gate: &str, tool_name: &str, decision: &GateDecision) {
    match decision {
        GateDecision::Allow(reason) => debug!(
            event = "gate.evaluated",
            gate = %gate,
            tool = %tool_name,
            decision = "allow",
            reason = %reason,
        ),
        GateDecision::Block(payload) => info!(
            event = "gate.evaluated",
            gate = %gate,
            tool = %tool_name,
            decision = "block",
            error = %payload.error,
            violations = payload.violations.len(),
        ),
    }
}

/// Emit event: a read-only git query failed and the gate fell back to allow.
pub fn emit_git_query_failed(query: &str, error: &dyn std::fmt::Display) {
    warn!(event = "git.query_failed", query = %query, error = %error);
}

/// Emit event: a policy file could not be loaded; built-in defaults apply.
pub fn emit_policy_load_failed(path: &str, error: &dyn std::fmt::Display) {
    warn!(event = "policy.load_failed", path = %path, error = %error);
}

/// Emit event: a workflow state file exists but could not be used.
pub fn emit_state_unreadable(path: &str, error: &dyn std::fmt::Display) {
    warn!(event = "workflow.state_unreadable", path = %path, error = %error);
}

/// Emit event: stdin did not hold a usable hook event.
pub fn emit_input_malformed(error: &dyn std::fmt::Display) {
    warn!(event = "hook.input_malformed", error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{AllowReason, BlockPayload};

    #[test]
    fn emitters_accept_both_outcomes() {
        emit_gate_evaluated("git", "Bash", &GateDecision::Allow(AllowReason::NotAGitWrite));
        emit_gate_evaluated(
            "git",
            "Bash",
            &GateDecision::Block(BlockPayload::new("force push is forbidden")),
        );
        emit_git_query_failed("status --porcelain", &"exit status 128");
        emit_policy_load_failed("/nope.json", &"not found");
        emit_state_unreadable("/repo/.workflow-state.json", &"expected value");
        emit_input_malformed(&"expected value at line 1 column 1");
    }
}
