//! Command-safety classifier.
//!
//! Inspects a proposed shell command with quoted content stripped and denies
//! anything matching a destructive pattern. Quoted strings are stripped
//! first so that flags and targets are matched positionally, not inside
//! string literals.

use std::sync::LazyLock;

use regex::Regex;

use super::Verdict;
use crate::error::{Error, Result};

struct DenyRule {
    pattern: Regex,
    reason: &'static str,
}

macro_rules! rule {
    ($pattern:expr, $reason:expr) => {
        DenyRule {
            pattern: Regex::new($pattern).expect("deny pattern"),
            reason: $reason,
        }
    };
}

static DENY_RULES: LazyLock<Vec<DenyRule>> = LazyLock::new(|| {
    vec![
        rule!(
            r"\brm\s+(?:-[a-zA-Z]*[rR][a-zA-Z]*\s+)+(?:-[a-zA-Z]+\s+)*(?:/\*?|~|\$HOME)(?:\s|$)",
            "recursive delete of root or home"
        ),
        rule!(
            r"\bgit\s+push\b.*\s(?:--force|-f)(?:\s|$)",
            "forced push"
        ),
        rule!(r"\bgit\s+reset\s+--hard\b", "hard reset"),
        rule!(
            r"\bgit\s+clean\b.*\s(?:-[a-zA-Z]*f[a-zA-Z]*|--force)(?:\s|$)",
            "forced clean"
        ),
        rule!(
            r"\bgit\s+checkout\s+(?:--force|-f)(?:\s|$)",
            "forced checkout"
        ),
        rule!(
            r"\bgit\s+checkout\s+\.(?:\s|$)",
            "checkout over all local changes"
        ),
        rule!(
            r"\bgit\s+branch\s+.*(?:-D|--delete\s+--force)(?:\s|$)",
            "forced branch delete"
        ),
        rule!(
            r"(?i)\b(?:drop\s+(?:table|database|schema)|truncate\s+table)\b",
            "destructive SQL"
        ),
        rule!(
            r"\bchmod\s+(?:-[a-zA-Z]+\s+)*(?:0?777|a\+rwx)\b",
            "world-writable permission change"
        ),
        rule!(
            r"\b(?:curl|wget)\b[^|]*\|\s*(?:sudo\s+)?(?:ba|z|da)?sh\b",
            "remote content piped to a shell"
        ),
    ]
});

/// Remove single- and double-quoted spans, leaving the rest intact.
///
/// Backslash escapes are honored the way a shell parses them: an escaped
/// quote outside quotes (the `'\''` idiom) is literal text and never opens
/// a span, and `\"` inside double quotes does not close one.
fn strip_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '\'' => {
                for inner in chars.by_ref() {
                    if inner == '\'' {
                        break;
                    }
                }
            }
            '"' => {
                let mut escaped = false;
                for inner in chars.by_ref() {
                    if escaped {
                        escaped = false;
                    } else if inner == '\\' {
                        escaped = true;
                    } else if inner == '"' {
                        break;
                    }
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Classify a proposed shell command.
#[must_use]
pub fn check_command(command: &str) -> Verdict {
    let stripped = strip_quoted(command);
    for rule in &*DENY_RULES {
        if rule.pattern.is_match(&stripped) {
            return Verdict::Deny {
                reason: rule.reason.to_string(),
            };
        }
    }
    Verdict::Allow
}

/// Precondition form used by the git adapter before remote-mutating
/// commands.
///
/// # Errors
/// A denied command is `Error::Precondition` carrying the matched reason.
pub fn ensure_allowed(command: &str) -> Result<()> {
    match check_command(command) {
        Verdict::Allow => Ok(()),
        Verdict::Deny { reason } => Err(Error::Precondition(format!(
            "command denied by safety gate ({reason}): {command}"
        ))),
    }
}
