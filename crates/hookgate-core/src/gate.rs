//! Commit/push policy gate.
//!
//! Intercepts shell tool calls, recognises `git commit` / `git push`, and
//! blocks anything that breaks the configured author and message policy.
//! Rules are evaluated in a fixed order and the first applicable rule
//! decides:
//!
//! 1. skip phrase present → allow
//! 2. not the shell tool → allow
//! 3. empty command → allow
//! 4. neither commit nor push → allow
//! 5. outside a work tree → allow
//! 6. `-f` / `--force` → block
//! 7. push: dirty tree → block; last commit non-compliant → block
//! 8. commit: required author missing from the command → block
//!
//! Message content is only checked at push time; a commit command's message
//! may sit inside shell quoting that cannot be parsed reliably.

use crate::classify::CommandClassifier;
use crate::decision::{AllowReason, BlockPayload, GateDecision};
use crate::error::Result;
use crate::event::HookEvent;
use crate::git::RepoView;
use crate::message::{check_author, MessageRules, PolicyViolation};
use crate::obs;
use crate::policy::GatePolicy;

/// Gate name used in log events.
pub const GIT_GATE: &str = "git";

/// The commit/push policy gate.
#[derive(Debug)]
pub struct GitPolicyGate<P> {
    policy: GatePolicy,
    rules: MessageRules,
    classifier: CommandClassifier,
    repo: P,
}

impl<P: RepoView> GitPolicyGate<P> {
    /// Build a gate; fails only if the policy's patterns do not compile.
    pub fn new(policy: GatePolicy, repo: P) -> Result<Self> {
        policy.validate()?;
        let rules = MessageRules::new(&policy)?;
        Ok(Self {
            policy,
            rules,
            classifier: CommandClassifier::new()?,
            repo,
        })
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

    /// Evaluate one hook event.
    pub fn evaluate(&self, event: &HookEvent) -> GateDecision {
        let decision = self.decide(event);
        obs::emit_gate_evaluated(GIT_GATE, &event.tool_name, &decision);
        decision
    }

    fn decide(&self, event: &HookEvent) -> GateDecision {
        if event.contains_skip_keyword(&self.policy.skip_keywords) {
            return GateDecision::Allow(AllowReason::SkipKeyword);
        }

        if event.tool_name != self.policy.shell_tool {
            return GateDecision::Allow(AllowReason::UnwatchedTool);
        }

        let Some(command) = event.command() else {
            return GateDecision::Allow(AllowReason::EmptyCommand);
        };

        let intent = self.classifier.classify(command);
        if intent.is_none() {
            return GateDecision::Allow(AllowReason::NotAGitWrite);
        }

        if !self.repo.is_inside_work_tree() {
            return GateDecision::Allow(AllowReason::OutsideRepository);
        }

        if self.classifier.has_force_flag(command) {
            return GateDecision::Block(self.force_push_payload());
        }

        if intent.push {
            return self.check_push();
        }

        self.check_commit(command)
    }

    fn check_push(&self) -> GateDecision {
        let status = match self.repo.porcelain_status() {
            Ok(status) => status,
            Err(e) => {
                obs::emit_git_query_failed("status --porcelain", &e);
                return GateDecision::Allow(AllowReason::GitUnavailable);
            }
        };

        if !status.trim().is_empty() {
            let details = status
                .lines()
                .take(self.policy.status_detail_limit)
                .map(str::to_string)
                .collect();
            return GateDecision::Block(
                BlockPayload::new("working tree must be clean before push")
                    .with_reason("uncommitted changes make the pushed history untraceable")
                    .with_resolution("commit or stash pending changes, then push")
                    .with_resolution("or split the push into smaller revertible commits")
                    .with_details(details),
            );
        }

        let violations = match self.check_last_commit() {
            Ok(violations) => violations,
            Err(e) => {
                obs::emit_git_query_failed("log -1", &e);
                return GateDecision::Allow(AllowReason::GitUnavailable);
            }
        };

        if violations.is_empty() {
            return GateDecision::Allow(AllowReason::PushCompliant);
        }

        let author = &self.policy.required_author;
        GateDecision::Block(
            BlockPayload::new("last commit does not follow the commit convention")
                .with_reason("every push must satisfy the shared commit convention")
                .with_violations(violations.iter().map(ToString::to_string).collect())
                .with_resolution(format!(
                    "fix the author: git commit --amend --author=\"{author}\""
                ))
                .with_resolution("fix the message: git commit --amend")
                .with_resolution("then push again: git push"),
        )
    }

    fn check_commit(&self, command: &str) -> GateDecision {
        let author = &self.policy.required_author;
        if command.contains(author.as_str()) {
            return GateDecision::Allow(AllowReason::CommitCompliant);
        }

        GateDecision::Block(
            BlockPayload::new("git commit must use the fixed author")
                .with_reason(format!(
                    "cross-project provenance relies on a consistent author: {author}"
                ))
                .with_resolution(format!("use: git commit ... --author=\"{author}\""))
                .with_resolution(format!(
                    "or fix it afterwards: git commit --amend --author=\"{author}\""
                )),
        )
    }

    fn force_push_payload(&self) -> BlockPayload {
        let skip = self
            .policy
            .skip_keywords
            .first()
            .map(String::as_str)
            .unwrap_or("a skip keyword");
        BlockPayload::new("force push is forbidden")
            .with_reason("force push can destroy remote history")
            .with_resolution(format!(
                "if a force push is truly required, add {skip} to the command and make sure you understand the risk"
            ))
    }

    /// Validate the most recent commit's author and message.
    ///
    /// An author mismatch is reported alone; the message is only checked for
    /// a commit under the right identity.
    pub fn check_last_commit(&self) -> Result<Vec<PolicyViolation>> {
        let commit = self.repo.last_commit()?;
        if let Some(v) = check_author(&self.policy.required_author, &commit.author) {
            return Ok(vec![v]);
        }
        Ok(self.rules.validate(&commit.message))
    }
}
