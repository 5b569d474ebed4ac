//! Commit message and author rules.
//!
//! [`MessageRules`] compiles the message-related parts of a [`GatePolicy`]
//! once and then checks messages without further allocation of patterns.
//! All violations are collected; nothing short-circuits except an empty
//! message, which has nothing else to check.

use std::fmt;

use regex::Regex;

use crate::error::Result;
use crate::policy::{GatePolicy, ScriptRange};

/// A single broken rule on the last commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    EmptyMessage,
    MalformedSubject { subject: String, types: Vec<String> },
    SubjectScript { description: String },
    MissingField { field: String },
    BannedToken { token: String },
    BannedMarker { marker: String },
    AuthorMismatch { expected: String, actual: String },
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyViolation::EmptyMessage => write!(f, "commit message must not be empty"),
            PolicyViolation::MalformedSubject { subject, types } => write!(
                f,
                "subject must match <type>(<scope>): <description> with type in [{}], got: {subject:?}",
                types.join(", ")
            ),
            PolicyViolation::SubjectScript { description } => write!(
                f,
                "subject description must contain Chinese text (type and scope excluded), got: {description:?}"
            ),
            PolicyViolation::MissingField { field } => {
                write!(f, "message body must contain a \"{field}:\" field")
            }
            PolicyViolation::BannedToken { token } => {
                write!(f, "message contains banned token: {token}")
            }
            PolicyViolation::BannedMarker { marker } => {
                write!(f, "message contains banned marker: {marker}")
            }
            PolicyViolation::AuthorMismatch { expected, actual } => write!(
                f,
                "last commit author must be {expected}, found: {actual}"
            ),
        }
    }
}

/// Compiled message rules.
#[derive(Debug, Clone)]
pub struct MessageRules {
    subject: Regex,
    types: Vec<String>,
    script: ScriptRange,
    fields: Vec<(String, Regex)>,
    banned_tokens: Vec<(String, Regex)>,
    banned_markers: Vec<String>,
}

impl MessageRules {
    /// Compile the rules of `policy`.
    pub fn new(policy: &GatePolicy) -> Result<Self> {
        let alternation = policy
            .commit_types
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let subject = Regex::new(&format!(r"^(?:{alternation})(?:\([^)]+\))?:\s+(.+)$"))?;

        let fields = policy
            .required_fields
            .iter()
            .map(|field| -> Result<(String, Regex)> {
                let re = Regex::new(&format!(r"(?:^|\n)\s*-?\s*{}[:：]", regex::escape(field)))?;
                Ok((field.clone(), re))
            })
            .collect::<Result<Vec<_>>>()?;

        let banned_tokens = policy
            .banned_tokens
            .iter()
            .map(|token| -> Result<(String, Regex)> {
                let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(token)))?;
                Ok((token.clone(), re))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            subject,
            types: policy.commit_types.clone(),
            script: policy.description_script,
            fields,
            banned_tokens,
            banned_markers: policy.banned_markers.clone(),
        })
    }

    /// Check a full commit message (subject plus body).
    pub fn validate(&self, message: &str) -> Vec<PolicyViolation> {
        let msg = message.trim_matches('\n');
        if msg.trim().is_empty() {
            return vec![PolicyViolation::EmptyMessage];
        }

        let mut violations = Vec::new();

        if let Some(v) = self.check_subject(subject_line(msg)) {
            violations.push(v);
        }

        for (field, re) in &self.fields {
            if !re.is_match(msg) {
                violations.push(PolicyViolation::MissingField {
                    field: field.clone(),
                });
            }
        }

        for (token, re) in &self.banned_tokens {
            if re.is_match(msg) {
                violations.push(PolicyViolation::BannedToken {
                    token: token.clone(),
                });
            }
        }

        for marker in &self.banned_markers {
            if !marker.is_empty() && msg.contains(marker.as_str()) {
                violations.push(PolicyViolation::BannedMarker {
                    marker: marker.clone(),
                });
            }
        }

        violations
    }

    fn check_subject(&self, subject: &str) -> Option<PolicyViolation> {
        let Some(caps) = self.subject.captures(subject) else {
            return Some(PolicyViolation::MalformedSubject {
                subject: subject.to_string(),
                types: self.types.clone(),
            });
        };

        let description = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if self.script.appears_in(description) {
            None
        } else {
            Some(PolicyViolation::SubjectScript {
                description: description.to_string(),
            })
        }
    }
}

/// First non-blank line, trimmed.
pub fn subject_line(message: &str) -> &str {
    message
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
}

/// Check a commit author against the required identity.
pub fn check_author(required: &str, actual: &str) -> Option<PolicyViolation> {
    if actual.contains(required) {
        None
    } else {
        Some(PolicyViolation::AuthorMismatch {
            expected: required.to_string(),
            actual: actual.to_string(),
        })
    }
}

/// Drop `#` comment lines the way git does for an edited message file.
pub fn strip_comment_lines(message: &str) -> String {
    message
        .lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLIANT: &str = "fix(login): 修复登录崩溃问题\n\n\
        - 核心改动：空指针保护\n\
        - 影响范围：登录页\n\
        - 技术背景：会话为空时崩溃\n\
        - 相关文件：src/login.rs\n";

    fn rules() -> MessageRules {
        MessageRules::new(&GatePolicy::default()).unwrap()
    }

    #[test]
    fn test_compliant_message_has_no_violations() {
        assert!(rules().validate(COMPLIANT).is_empty());
    }

    #[test]
    fn test_each_missing_field_reports_exactly_one_violation() {
        let rules = rules();
        for field in ["核心改动", "影响范围", "技术背景", "相关文件"] {
            let message: String = COMPLIANT
                .lines()
                .filter(|line| !line.contains(field))
                .collect::<Vec<_>>()
                .join("\n");
            let violations = rules.validate(&message);
            assert_eq!(
                violations,
                vec![PolicyViolation::MissingField {
                    field: field.to_string()
                }],
                "removing {field}"
            );
        }
    }

    #[test]
    fn test_ascii_colon_and_no_dash_accepted() {
        let message = "docs: 更新文档\n核心改动: a\n影响范围: b\n  技术背景: c\n-相关文件：d";
        assert!(rules().validate(message).is_empty());
    }

    #[test]
    fn test_latin_only_description() {
        let message = COMPLIANT.replace("修复登录崩溃问题", "fixed login crash");
        assert_eq!(
            rules().validate(&message),
            vec![PolicyViolation::SubjectScript {
                description: "fixed login crash".to_string()
            }]
        );
    }

    #[test]
    fn test_unknown_type_is_malformed() {
        let message = COMPLIANT.replace("fix(login)", "hotfix(login)");
        let violations = rules().validate(&message);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            violations[0],
            PolicyViolation::MalformedSubject { .. }
        ));
    }

    #[test]
    fn test_missing_space_after_colon_is_malformed() {
        let message = COMPLIANT.replace("fix(login): ", "fix(login):");
        assert!(matches!(
            rules().validate(&message)[0],
            PolicyViolation::MalformedSubject { .. }
        ));
    }

    #[test]
    fn test_subject_skips_leading_blank_lines() {
        let message = format!("\n   \n{COMPLIANT}");
        assert!(rules().validate(&message).is_empty());
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(
            rules().validate("\n\n  \n"),
            vec![PolicyViolation::EmptyMessage]
        );
    }

    #[test]
    fn test_banned_tokens_are_word_bounded_and_case_insensitive() {
        let message = format!("{COMPLIANT}\nCo-Authored-By: Claude <noreply@example.com>");
        let violations = rules().validate(&message);
        assert!(violations.contains(&PolicyViolation::BannedToken {
            token: "claude".to_string()
        }));
        assert!(violations.contains(&PolicyViolation::BannedToken {
            token: "co-authored-by".to_string()
        }));

        // "maintain" and "robot" contain banned substrings but not tokens.
        let message = format!("{COMPLIANT}\nmaintain the robot arm");
        assert!(rules().validate(&message).is_empty());
    }

    #[test]
    fn test_all_violations_accumulate() {
        let message = "update stuff\n\nGenerated with AI 🤖";
        let violations = rules().validate(message);
        // subject + 4 fields + 2 tokens + marker
        assert_eq!(violations.len(), 8);
        assert!(violations.contains(&PolicyViolation::BannedMarker {
            marker: "🤖".to_string()
        }));
    }

    #[test]
    fn test_custom_types() {
        let policy = GatePolicy {
            commit_types: vec!["build".to_string()],
            ..GatePolicy::default()
        };
        let rules = MessageRules::new(&policy).unwrap();
        let message = COMPLIANT.replace("fix(login)", "build");
        assert!(rules.validate(&message).is_empty());
        assert!(!rules.validate(COMPLIANT).is_empty());
    }

    #[test]
    fn test_check_author() {
        let required = "Jane Doe <jane@example.com>";
        assert_eq!(check_author(required, "Jane Doe <jane@example.com>"), None);
        let violation = check_author(required, "bot <bot@example.com>").unwrap();
        let text = violation.to_string();
        assert!(text.contains(required));
        assert!(text.contains("bot <bot@example.com>"));
    }

    #[test]
    fn test_strip_comment_lines() {
        let raw = "feat: 新增\n# Please enter the commit message\n- 核心改动：x";
        assert_eq!(strip_comment_lines(raw), "feat: 新增\n- 核心改动：x");
    }
}
