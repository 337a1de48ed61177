//! Identifier parser: turns free-form input (bare ID, tracker URL, short
//! numeric reference, branch name) into one canonical ticket ID.
//!
//! Resolution is idempotent across representations: every input that names
//! the same ticket yields the same `TicketId`. Nothing downstream runs
//! without a resolved ID.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Canonical ticket ID: uppercase alphanumeric project prefix, dash, number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct TicketId(String);

static BARE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9]*)-(\d+)$").expect("bare id regex")
});

static URL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/issue/([A-Za-z][A-Za-z0-9]*-\d+)(?:[/?#]|$)").expect("url id regex")
});

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#?(\d+)$").expect("numeric regex"));

/// Branch grammar `{prefix}/{TICKET-ID}-{slug}`. Prefix and slug are
/// discarded; only the ID segment is retained.
static BRANCH_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]+/([A-Za-z][A-Za-z0-9]*-\d+)(?:-|$)").expect("branch id regex")
});

impl TicketId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn canonical(raw: &str) -> Self {
        Self(raw.to_ascii_uppercase())
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve an explicit reference: bare ID, tracker URL, or short numeric
/// reference (the latter needs a configured project prefix).
///
/// # Errors
/// Input matching no representation is `Error::AmbiguousReference`.
pub fn resolve_reference(input: &str, prefix: Option<&str>) -> Result<TicketId> {
    let input = input.trim();

    if let Some(caps) = BARE_ID.captures(input) {
        return Ok(TicketId::canonical(&format!("{}-{}", &caps[1], &caps[2])));
    }
    if let Some(caps) = URL_ID.captures(input) {
        return Ok(TicketId::canonical(&caps[1]));
    }
    if let Some(caps) = NUMERIC.captures(input) {
        return match prefix {
            Some(p) => Ok(TicketId::canonical(&format!("{p}-{}", &caps[1]))),
            None => Err(Error::AmbiguousReference {
                input: input.to_string(),
                hint: "bare number needs a configured project ticket_prefix".to_string(),
            }),
        };
    }

    Err(Error::AmbiguousReference {
        input: input.to_string(),
        hint: "expected a ticket id like NOV-123, a tracker URL, or a number".to_string(),
    })
}

/// Extract a ticket ID from a branch named with the
/// `{prefix}/{TICKET-ID}-{slug}` grammar.
#[must_use]
pub fn from_branch(branch: &str) -> Option<TicketId> {
    BRANCH_ID
        .captures(branch)
        .map(|caps| TicketId::canonical(&caps[1]))
}

/// Resolve a ticket ID from optional input, falling back to the current
/// branch name.
///
/// The default-branch guard runs before anything else on the fallback
/// path: with no explicit reference there is nothing to resolve on the
/// protected branch, and we must not guess.
///
/// # Errors
/// The fallback on the default branch is `Error::WrongBranch`; a branch
/// without an ID segment is `Error::NotFound`.
pub fn resolve(
    input: Option<&str>,
    current_branch: &str,
    default_branch: &str,
    prefix: Option<&str>,
) -> Result<TicketId> {
    if let Some(reference) = input {
        return resolve_reference(reference, prefix);
    }
    if current_branch == default_branch {
        return Err(Error::WrongBranch(default_branch.to_string()));
    }
    from_branch(current_branch).ok_or_else(|| {
        Error::NotFound(format!(
            "no ticket id in branch '{current_branch}' (expected prefix/TICKET-ID-slug)"
        ))
    })
}
