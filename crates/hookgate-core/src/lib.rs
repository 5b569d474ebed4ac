//! hookgate core library
//!
//! Pre-action gates for coding-assistant tool calls. Each gate reads one hook
//! event, decides allow or block, and never mutates the repository.

pub mod classify;
pub mod decision;
pub mod error;
pub mod event;
pub mod freeze;
pub mod gate;
pub mod git;
pub mod message;
pub mod obs;
pub mod policy;
pub mod telemetry;
pub mod workflow;

pub use classify::{CommandClassifier, GitIntent};
pub use decision::{AllowReason, BlockPayload, GateDecision, EXIT_ALLOW, EXIT_BLOCK};
pub use error::{HookgateError, Result};
pub use event::HookEvent;
pub use freeze::{SpecFreezeGate, FREEZE_GATE};
pub use gate::{GitPolicyGate, GIT_GATE};
pub use git::{CommitRecord, GitCli, RepoView};
pub use message::{check_author, strip_comment_lines, subject_line, MessageRules, PolicyViolation};
pub use policy::{
    FreezePolicy, GatePolicy, ScriptRange, StepRequirement, WorkflowPolicy, DEFAULT_AUTHOR,
};
pub use telemetry::init_tracing;
pub use workflow::{WorkflowGate, WORKFLOW_GATE};

/// hookgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
