//! Workflow gate.
//!
//! Before a file-editing tool touches a source file, the owning project must
//! have a written spec and a workflow state file showing that the steps its
//! task weight requires are done. Documentation, configuration, tests and
//! tooling directories are exempt.
//!
//! The state file is a JSON object such as
//! `{"weight": 5, "weight_assessed": true, "task_created": true}`. A missing,
//! unreadable or empty state file counts as a weight-0 task and passes.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::decision::{AllowReason, BlockPayload, GateDecision};
use crate::error::Result;
use crate::event::HookEvent;
use crate::obs;
use crate::policy::{StepRequirement, WorkflowPolicy};

/// Gate name used in log events.
pub const WORKFLOW_GATE: &str = "enforce-workflow";

/// Weight used in the sample state-file command of a block diagnostic.
const SAMPLE_WEIGHT: u32 = 5;

/// The workflow gate.
#[derive(Debug, Clone)]
pub struct WorkflowGate {
    policy: WorkflowPolicy,
    exempt: Vec<Regex>,
    fallback_root: PathBuf,
}

impl WorkflowGate {
    /// Build a gate. Relative edit paths, and files with no project marker
    /// above them, resolve against `fallback_root`.
    pub fn new(policy: WorkflowPolicy, fallback_root: impl Into<PathBuf>) -> Result<Self> {
        policy.validate()?;
        let exempt = policy
            .exempt_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            policy,
            exempt,
            fallback_root: fallback_root.into(),
        })
    }

    pub fn is_code_file(&self, path: &str) -> bool {
        self.policy
            .code_extensions
            .iter()
            .any(|ext| path.ends_with(ext.as_str()))
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        self.exempt.iter().any(|re| re.is_match(&normalized))
    }

    /// Nearest ancestor of `path` holding a root marker, below the
    /// filesystem root.
    pub fn project_root(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.fallback_root.join(path)
        };

        let mut current = absolute.parent();
        while let Some(dir) = current {
            if dir.parent().is_none() {
                break;
            }
            if self
                .policy
                .root_markers
                .iter()
                .any(|marker| dir.join(marker).exists())
            {
                return dir.to_path_buf();
            }
            current = dir.parent();
        }
        self.fallback_root.clone()
    }

    /// First spec file under the project's spec directory, or the reason
    /// there is none.
    pub fn find_spec(&self, root: &Path) -> std::result::Result<PathBuf, String> {
        let dir = root.join(&self.policy.spec_dir);
        if !dir.is_dir() {
            return Err(format!("{}/ directory not found", self.policy.spec_dir));
        }
        WalkDir::new(&dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .find(|entry| {
                !entry.file_type().is_dir()
                    && entry.file_name() == self.policy.spec_file_name.as_str()
            })
            .map(|entry| entry.into_path())
            .ok_or_else(|| format!("no {} found", self.policy.spec_file_name))
    }

    /// Workflow steps the project's state file does not yet mark as done.
    pub fn missing_steps(&self, root: &Path) -> Vec<String> {
        let Some(state) = self.load_state(root) else {
            return Vec::new();
        };

        let weight = state.get("weight").and_then(Value::as_f64).unwrap_or(0.0);
        let shown = state
            .get("weight")
            .filter(|v| v.is_number())
            .map(Value::to_string)
            .unwrap_or_else(|| "0".to_string());

        self.policy
            .requirements
            .iter()
            .filter(|req| req.min_weight == 0 || weight >= f64::from(req.min_weight))
            .filter(|req| !state.get(&req.flag).is_some_and(is_truthy))
            .map(|req| describe_step(req, &shown))
            .collect()
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
        obs::emit_gate_evaluated(WORKFLOW_GATE, &event.tool_name, &decision);
        decision
    }

    fn decide(&self, event: &HookEvent) -> GateDecision {
        if !self.policy.edit_tools.contains(&event.tool_name) {
            return GateDecision::Allow(AllowReason::UnwatchedTool);
        }

        if event.contains_skip_keyword(&self.policy.skip_keywords) {
            return GateDecision::Allow(AllowReason::SkipKeyword);
        }

        let mut checked = false;
        for path in event.edit_targets(&self.policy.multi_edit_tool) {
            if !self.is_code_file(path) || self.is_exempt(path) {
                continue;
            }
            checked = true;

            let root = self.project_root(path);
            if let Err(reason) = self.find_spec(&root) {
                return GateDecision::Block(self.spec_payload(path, &root, reason));
            }

            let missing = self.missing_steps(&root);
            if !missing.is_empty() {
                return GateDecision::Block(self.steps_payload(path, &root, missing));
            }
        }

        if checked {
            GateDecision::Allow(AllowReason::WorkflowSatisfied)
        } else {
            GateDecision::Allow(AllowReason::NoGuardedFile)
        }
    }

    fn load_state(&self, root: &Path) -> Option<Map<String, Value>> {
        let path = root.join(&self.policy.state_file);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                obs::emit_state_unreadable(&path.display().to_string(), &e);
                return None;
            }
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) if !map.is_empty() => Some(map),
            Ok(_) => None,
            Err(e) => {
                obs::emit_state_unreadable(&path.display().to_string(), &e);
                None
            }
        }
    }

    fn skip_hint(&self) -> &str {
        self.policy
            .skip_keywords
            .first()
            .map(String::as_str)
            .unwrap_or("a skip keyword")
    }

    fn spec_payload(&self, path: &str, root: &Path, reason: String) -> BlockPayload {
        BlockPayload::new(format!(
            "a {} is required before writing source code",
            self.policy.spec_file_name
        ))
        .with_reason(reason)
        .with_resolution("create the requirement spec with /speckit.specify")
        .with_resolution(format!(
            "or create {}/<feature>/{} under the project root",
            self.policy.spec_dir, self.policy.spec_file_name
        ))
        .with_resolution(format!(
            "in an emergency, add {} to the request",
            self.skip_hint()
        ))
        .with_target(path, root.display().to_string())
    }

    fn steps_payload(&self, path: &str, root: &Path, missing: Vec<String>) -> BlockPayload {
        let state_file = &self.policy.state_file;
        BlockPayload::new("workflow steps are incomplete")
            .with_missing_steps(missing)
            .with_resolution("assess the task weight first")
            .with_resolution(format!("record progress in {state_file}"))
            .with_resolution("finish the steps the weight requires")
            .with_resolution(format!(
                "or add {} for a one-off exemption",
                self.skip_hint()
            ))
            .with_how_to_update(self.sample_update())
            .with_target(path, root.display().to_string())
    }

    fn sample_update(&self) -> String {
        let mut sample = Map::new();
        sample.insert("weight".to_string(), Value::from(SAMPLE_WEIGHT));
        for req in &self.policy.requirements {
            if req.min_weight <= SAMPLE_WEIGHT {
                sample.insert(req.flag.clone(), Value::Bool(true));
            }
        }
        format!(
            "echo '{}' > {}",
            Value::Object(sample),
            self.policy.state_file
        )
    }
}

fn describe_step(req: &StepRequirement, weight: &str) -> String {
    if req.min_weight == 0 {
        format!("{} ({})", req.label, req.flag)
    } else {
        format!(
            "{} ({}, weight {weight} >= {})",
            req.label, req.flag, req.min_weight
        )
    }
}

/// JSON truthiness: `false`, `null`, zero and empty values are unset.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
