//! Hook event model.
//!
//! The orchestrator writes one JSON object per tool call to stdin. Only a few
//! fields matter to the gates; everything else is ignored. Field extraction is
//! lenient: a field of the wrong JSON type reads as absent rather than failing
//! the whole event.

use serde_json::Value;

use crate::error::{HookgateError, Result};

/// One intercepted tool call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookEvent {
    /// Tool identifier, e.g. `Bash` or `Edit`.
    pub tool_name: String,
    /// Tool parameters as sent by the orchestrator.
    pub tool_input: Value,
    /// Opaque session identifier; only scanned for skip phrases.
    pub session_id: String,
}

impl HookEvent {
    /// Parse stdin contents into an event.
    ///
    /// Fails with [`HookgateError::InvalidEvent`] on empty input and on
    /// anything that is not a JSON object.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(HookgateError::InvalidEvent("empty input".to_string()));
        }
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(&value)
    }

    /// Build an event from an already-parsed JSON document.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            HookgateError::InvalidEvent("hook event must be a JSON object".to_string())
        })?;

        let tool_name = obj
            .get("tool_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let tool_input = obj.get("tool_input").cloned().unwrap_or(Value::Null);
        let session_id = match obj.get("session_id") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        Ok(Self {
            tool_name,
            tool_input,
            session_id,
        })
    }

    /// Look up a string parameter, treating empty strings as absent.
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.tool_input
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Shell command text: `command`, falling back to `cmd`.
    pub fn command(&self) -> Option<&str> {
        self.input_str("command").or_else(|| self.input_str("cmd"))
    }

    /// Edit target: `file_path`, falling back to `relative_path`.
    pub fn file_path(&self) -> Option<&str> {
        self.input_str("file_path")
            .or_else(|| self.input_str("relative_path"))
    }

    /// Paths of a multi-edit request's `edits[]` entries, in order.
    pub fn edit_paths(&self) -> Vec<&str> {
        self.tool_input
            .get("edits")
            .and_then(Value::as_array)
            .map(|edits| {
                edits
                    .iter()
                    .filter_map(|edit| {
                        let path = edit
                            .get("file_path")
                            .and_then(Value::as_str)
                            .filter(|s| !s.is_empty());
                        path.or_else(|| {
                            edit.get("relative_path")
                                .and_then(Value::as_str)
                                .filter(|s| !s.is_empty())
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every path a file-editing request touches.
    ///
    /// For `multi_edit_tool` this is each `edits[]` entry followed by the
    /// top-level path when no entry repeats it; any other tool yields just
    /// the top-level path.
    pub fn edit_targets(&self, multi_edit_tool: &str) -> Vec<&str> {
        let top = self.file_path();
        if self.tool_name != multi_edit_tool {
            return top.into_iter().collect();
        }
        let mut targets = self.edit_paths();
        if let Some(path) = top {
            if !targets.contains(&path) {
                targets.push(path);
            }
        }
        targets
    }

    /// Whether any skip phrase occurs, case-insensitively, in a top-level
    /// string parameter or in the session id.
    pub fn contains_skip_keyword(&self, keywords: &[String]) -> bool {
        let needles: Vec<String> = keywords
            .iter()
            .filter(|k| !k.is_empty())
            .map(|k| k.to_lowercase())
            .collect();
        if needles.is_empty() {
            return false;
        }

        let hit = |text: &str| {
            let lowered = text.to_lowercase();
            needles.iter().any(|n| lowered.contains(n.as_str()))
        };

        if let Some(params) = self.tool_input.as_object() {
            if params.values().filter_map(Value::as_str).any(|s| hit(s)) {
                return true;
            }
        }
        hit(&self.session_id)
    }
}
