//! Shell command classification for git writes.
//!
//! Matching is token/boundary based on the raw command text, not a shell
//! parse. A `git commit` or `git push` must be preceded by start of text,
//! whitespace, `&&` or `;`. Commands that hide the invocation behind quoting
//! tricks or command substitution are not recognised.

use regex::Regex;

use crate::error::Result;

/// Which git writes a command performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GitIntent {
    pub commit: bool,
    pub push: bool,
}

impl GitIntent {
    /// Neither a commit nor a push.
    pub fn is_none(&self) -> bool {
        !self.commit && !self.push
    }
}

/// Compiled command patterns. Matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    commit: Regex,
    push: Regex,
    force: Regex,
}

impl CommandClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            commit: Regex::new(r"(?:^|\s|&&|;)git\s+commit\b")?,
            push: Regex::new(r"(?:^|\s|&&|;)git\s+push\b")?,
            force: Regex::new(r"(?:^|\s)(?:-f|--force)\b")?,
        })
    }

    /// Classify a shell command.
    pub fn classify(&self, command: &str) -> GitIntent {
        let lowered = command.to_lowercase();
        GitIntent {
            commit: self.commit.is_match(&lowered),
            push: self.push.is_match(&lowered),
        }
    }

    /// Whether the command carries a standalone `-f` or `--force` flag.
    ///
    /// This scans the whole command, so it also fires on
    /// `git commit -F <file>` (read message from file, lowercased to `-f`),
    /// on a commit message containing ` -f`, and on `--force-with-lease`.
    pub fn has_force_flag(&self, command: &str) -> bool {
        self.force.is_match(&command.to_lowercase())
    }
}
