//! Gate decision types.
//!
//! Every gate is a total function from a hook event to a [`GateDecision`].
//! There are exactly two outcomes: allow (exit 0) or block (exit 2 with a
//! [`BlockPayload`] written to stderr).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Process exit code for an allowed tool call.
pub const EXIT_ALLOW: i32 = 0;

/// Process exit code for a blocked tool call.
pub const EXIT_BLOCK: i32 = 2;

/// Why a gate let a tool call through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    /// stdin was empty.
    EmptyInput,
    /// stdin was not a JSON object.
    MalformedInput,
    /// An operator skip phrase was present.
    SkipKeyword,
    /// The tool is not one this gate inspects.
    UnwatchedTool,
    /// The shell command text was empty.
    EmptyCommand,
    /// The command is neither `git commit` nor `git push`.
    NotAGitWrite,
    /// The working directory is not inside a git work tree.
    OutsideRepository,
    /// A git query failed, so no policy applies.
    GitUnavailable,
    /// Push with a clean tree and a compliant last commit.
    PushCompliant,
    /// Commit carrying the required author.
    CommitCompliant,
    /// The edit target is not a frozen document.
    UnprotectedPath,
    /// No edit target is a source file that needs a spec.
    NoGuardedFile,
    /// A spec exists and every required workflow step is done.
    WorkflowSatisfied,
}

impl AllowReason {
    pub fn as_str(self) -> &'static str {
        match self {
            AllowReason::EmptyInput => "empty_input",
            AllowReason::MalformedInput => "malformed_input",
            AllowReason::SkipKeyword => "skip_keyword",
            AllowReason::UnwatchedTool => "unwatched_tool",
            AllowReason::EmptyCommand => "empty_command",
            AllowReason::NotAGitWrite => "not_a_git_write",
            AllowReason::OutsideRepository => "outside_repository",
            AllowReason::GitUnavailable => "git_unavailable",
            AllowReason::PushCompliant => "push_compliant",
            AllowReason::CommitCompliant => "commit_compliant",
            AllowReason::UnprotectedPath => "unprotected_path",
            AllowReason::NoGuardedFile => "no_guarded_file",
            AllowReason::WorkflowSatisfied => "workflow_satisfied",
        }
    }
}

impl fmt::Display for AllowReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured diagnostic written to stderr when a gate blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPayload {
    /// Human-readable headline.
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<String>,
    /// Workflow steps still outstanding.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_steps: Vec<String>,
    /// Actionable remediation steps.
    #[serde(default)]
    pub resolution: Vec<String>,
    /// Supporting output, e.g. the first lines of `git status`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    /// Command that records workflow progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how_to_update: Option<String>,
    /// File the blocked tool call would have written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(
        default,
        rename = "projectRoot",
        skip_serializing_if = "Option::is_none"
    )]
    pub project_root: Option<String>,
}

impl BlockPayload {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            reason: None,
            violations: Vec::new(),
            missing_steps: Vec::new(),
            resolution: Vec::new(),
            details: Vec::new(),
            how_to_update: None,
            target: None,
            project_root: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_violations(mut self, violations: Vec<String>) -> Self {
        self.violations = violations;
        self
    }

    pub fn with_resolution(mut self, step: impl Into<String>) -> Self {
        self.resolution.push(step.into());
        self
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    pub fn with_missing_steps(mut self, steps: Vec<String>) -> Self {
        self.missing_steps = steps;
        self
    }

    pub fn with_how_to_update(mut self, command: impl Into<String>) -> Self {
        self.how_to_update = Some(command.into());
        self
    }

    /// Record the blocked file and the project root it resolved to.
    pub fn with_target(mut self, target: impl Into<String>, project_root: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self.project_root = Some(project_root.into());
        self
    }

    /// Pretty JSON with non-ASCII text kept verbatim.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.error.clone())
    }
}

/// Outcome of evaluating one hook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow(AllowReason),
    Block(BlockPayload),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow(_))
    }

    /// Exit code the hook process should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            GateDecision::Allow(_) => EXIT_ALLOW,
            GateDecision::Block(_) => EXIT_BLOCK,
        }
    }

    /// The block diagnostic, if any.
    pub fn payload(&self) -> Option<&BlockPayload> {
        match self {
            GateDecision::Allow(_) => None,
            GateDecision::Block(payload) => Some(payload),
        }
    }

    /// The allow reason, if any.
    pub fn allow_reason(&self) -> Option<AllowReason> {
        match self {
            GateDecision::Allow(reason) => Some(*reason),
            GateDecision::Block(_) => None,
        }
    }
}
