//! Sensitive-file classifier: denies edits to files whose names look like
//! secrets and to designated infrastructure files.

use std::sync::LazyLock;

use regex::Regex;

use super::Verdict;

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
        rule!(r"(^|/)\.env(\.[A-Za-z0-9._-]+)?$", "dotenv file"),
        rule!(r"\.(pem|key|p12|pfx)$", "private key material"),
        rule!(r"(^|/)id_(rsa|ed25519|ecdsa)(\.pub)?$", "ssh key"),
        rule!(r"(?i)(^|/)credentials?(\.(json|ya?ml|toml|ini))?$", "credentials file"),
        rule!(r"(?i)secrets?\.(json|ya?ml|toml|env)$", "secrets file"),
        rule!(r"(?i)(^|/)(?:[^/]*[._-])?tokens?(?:[._-][^/]*)?$", "token file"),
        rule!(r"(^|/)\.netrc$", "netrc"),
        rule!(r"(^|/)kubeconfig$", "cluster credentials"),
        rule!(r"\.tfstate(\.backup)?$", "terraform state"),
        rule!(r"(^|/)\.tkt\.toml$", "orchestrator config"),
        rule!(r"(^|/)\.github/workflows/", "ci workflow definition"),
    ]
});

/// Classify a proposed file edit by path.
#[must_use]
pub fn check_path(path: &str) -> Verdict {
    let normalized = path.trim().replace('\\', "/");
    for rule in &*DENY_RULES {
        if rule.pattern.is_match(&normalized) {
            return Verdict::Deny {
                reason: rule.reason.to_string(),
            };
        }
    }
    Verdict::Allow
}
