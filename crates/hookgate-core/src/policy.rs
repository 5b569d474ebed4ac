//! Immutable gate configuration.
//!
//! Each gate takes its policy at construction. The `Default` impls carry the
//! built-in organisational constants; a JSON file may override any subset of
//! fields (missing fields keep their defaults).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HookgateError, Result};

/// Identity every commit must be authored under.
pub const DEFAULT_AUTHOR: &str = "YOUR_USERNAME <YOUR_USERNAME@gmail.com>";

/// Maximum number of `git status` lines echoed in a dirty-tree diagnostic.
pub const DEFAULT_STATUS_DETAIL_LIMIT: usize = 50;

/// Inclusive character range the subject description must draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRange {
    pub first: char,
    pub last: char,
}

impl ScriptRange {
    /// CJK Unified Ideographs.
    pub const CJK: ScriptRange = ScriptRange {
        first: '\u{4e00}',
        last: '\u{9fff}',
    };

    pub fn contains(&self, c: char) -> bool {
        (self.first..=self.last).contains(&c)
    }

    /// Whether `text` has at least one character in range.
    pub fn appears_in(&self, text: &str) -> bool {
        text.chars().any(|c| self.contains(c))
    }
}

impl Default for ScriptRange {
    fn default() -> Self {
        Self::CJK
    }
}

/// Configuration for the commit/push policy gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatePolicy {
    /// Required `Name <email>` author string.
    pub required_author: String,
    /// Phrases that bypass every check.
    pub skip_keywords: Vec<String>,
    /// Tool name of shell executions.
    pub shell_tool: String,
    /// Allowed subject type tags.
    pub commit_types: Vec<String>,
    /// Labelled body fields every message must carry.
    pub required_fields: Vec<String>,
    /// Word-bounded, case-insensitive tokens a message must not contain.
    pub banned_tokens: Vec<String>,
    /// Literal markers a message must not contain.
    pub banned_markers: Vec<String>,
    pub description_script: ScriptRange,
    pub status_detail_limit: usize,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            required_author: DEFAULT_AUTHOR.to_string(),
            skip_keywords: strings(&[
                "/skip-git-guard",
                "skip-git-guard",
                "跳过git门禁",
                "跳过 git 门禁",
            ]),
            shell_tool: "Bash".to_string(),
            commit_types: strings(&[
                "feat", "fix", "refactor", "perf", "style", "docs", "chore", "test",
            ]),
            required_fields: strings(&["核心改动", "影响范围", "技术背景", "相关文件"]),
            banned_tokens: strings(&[
                "ai",
                "agent",
                "claude",
                "bot",
                "anthropic",
                "sonnet",
                "opus",
                "haiku",
                "gpt",
                "chatgpt",
                "copilot",
                "generated",
                "co-authored-by",
            ]),
            banned_markers: strings(&["🤖"]),
            description_script: ScriptRange::CJK,
            status_detail_limit: DEFAULT_STATUS_DETAIL_LIMIT,
        }
    }
}

impl GatePolicy {
    /// Load a policy from a JSON file, defaulting any missing field.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let policy: Self = serde_json::from_str(&text)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if self.required_author.trim().is_empty() {
            return Err(HookgateError::InvalidPolicy(
                "required_author must not be empty".to_string(),
            ));
        }
        if self.commit_types.is_empty() {
            return Err(HookgateError::InvalidPolicy(
                "commit_types must not be empty".to_string(),
            ));
        }
        if self.description_script.first > self.description_script.last {
            return Err(HookgateError::InvalidPolicy(format!(
                "description_script range is inverted: U+{:04X} > U+{:04X}",
                self.description_script.first as u32, self.description_script.last as u32
            )));
        }
        Ok(())
    }
}

/// Configuration for the spec-freeze gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreezePolicy {
    /// Tools that write files.
    pub edit_tools: Vec<String>,
    /// Tool whose targets arrive as an `edits[]` list.
    pub multi_edit_tool: String,
    pub skip_keywords: Vec<String>,
    /// Case-insensitive regexes matched against `/`-normalised paths.
    pub protected_patterns: Vec<String>,
}

impl Default for FreezePolicy {
    fn default() -> Self {
        Self {
            edit_tools: strings(&[
                "Edit",
                "Write",
                "MultiEdit",
                "mcp__serena__replace_content",
                "mcp__serena__replace_symbol_body",
                "mcp__serena__create_text_file",
            ]),
            multi_edit_tool: "MultiEdit".to_string(),
            skip_keywords: strings(&["/skip-protect", "skip-protect", "跳过保护", "临时修改"]),
            protected_patterns: strings(&[
                r"\.specify/specs/.*/spec\.md$",
                r"\.specify/specs/.*/plan\.md$",
                r"\.specify/specs/.*/tasks\.md$",
                r"\.specify/memory/constitution\.md$",
                r".*[/\\]PRD\.md$",
                r".*[/\\]requirements\.md$",
                r".*[/\\]specs[/\\].*api-spec\.json$",
                r".*[/\\]specs[/\\].*data-model\.md$",
            ]),
        }
    }
}

impl FreezePolicy {
    /// Load a policy from a JSON file, defaulting any missing field.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// One workflow step the state file must mark as done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRequirement {
    /// Boolean key in the workflow state file.
    pub flag: String,
    /// Human-readable step name used in diagnostics.
    pub label: String,
    /// Task weight from which the step becomes mandatory.
    pub min_weight: u32,
}

impl StepRequirement {
    fn new(flag: &str, label: &str, min_weight: u32) -> Self {
        Self {
            flag: flag.to_string(),
            label: label.to_string(),
            min_weight,
        }
    }
}

/// Configuration for the workflow gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowPolicy {
    /// Tools that write files.
    pub edit_tools: Vec<String>,
    /// Tool whose targets arrive as an `edits[]` list.
    pub multi_edit_tool: String,
    pub skip_keywords: Vec<String>,
    /// Suffixes that mark a source file. Matched case-sensitively.
    pub code_extensions: Vec<String>,
    /// Case-sensitive regexes; a matching source file needs no spec.
    pub exempt_patterns: Vec<String>,
    /// Entries whose presence marks a project root.
    pub root_markers: Vec<String>,
    /// Directory, relative to the project root, searched for spec files.
    pub spec_dir: String,
    pub spec_file_name: String,
    /// Workflow state file, relative to the project root.
    pub state_file: String,
    /// Steps checked in order against the state file.
    pub requirements: Vec<StepRequirement>,
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self {
            edit_tools: strings(&["Write", "Edit", "MultiEdit"]),
            multi_edit_tool: "MultiEdit".to_string(),
            skip_keywords: strings(&[
                "跳过检查",
                "skip-check",
                "skip check",
                "紧急修复",
                "hotfix",
                "quick fix",
            ]),
            code_extensions: strings(&[
                ".ts", ".tsx", ".js", ".jsx", ".py", ".go", ".rs", ".java", ".kt",
            ]),
            exempt_patterns: strings(&[
                r"\.specify/",
                r"\.claude/",
                r"docs/",
                r"\.md$",
                r"\.json$",
                r"\.yaml$",
                r"\.yml$",
                r"test.*\.py$",
                r".*\.test\.(ts|tsx|js|jsx)$",
                r".*\.spec\.(ts|tsx|js|jsx)$",
                r"__tests__/",
                r"scripts/",
                r"hooks/",
            ]),
            root_markers: strings(&[".git", "package.json", "pyproject.toml"]),
            spec_dir: ".specify/specs".to_string(),
            spec_file_name: "spec.md".to_string(),
            state_file: ".workflow-state.json".to_string(),
            requirements: vec![
                StepRequirement::new("weight_assessed", "weight assessment", 0),
                StepRequirement::new("task_created", "task created", 3),
                StepRequirement::new("phase1_completed", "phase 1 analysis", 5),
                StepRequirement::new("phase2_completed", "phase 2 design", 7),
            ],
        }
    }
}

impl WorkflowPolicy {
    /// Load a policy from a JSON file, defaulting any missing field.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let policy: Self = serde_json::from_str(&text)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if self.spec_file_name.trim().is_empty() {
            return Err(HookgateError::InvalidPolicy(
                "spec_file_name must not be empty".to_string(),
            ));
        }
        if self.state_file.trim().is_empty() {
            return Err(HookgateError::InvalidPolicy(
                "state_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
