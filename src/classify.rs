//! Branch classifier: maps ticket metadata to a branch-prefix kind and an
//! ordered recommendation of downstream work skills.
//!
//! The skill recommendation is a fixed decision table keyed on
//! (kind, clarity-of-cause). It is advisory output only; a human confirms
//! or overrides it at the start pipeline's confirmation point.

use serde::Serialize;

/// Branch prefix kind. Defaulting to `Feature` when no signal matches is
/// deliberate ambiguity-resolution policy, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BranchKind {
    Fix,
    Feature,
    Docs,
    Test,
    Refactor,
    Chore,
}

impl BranchKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fix => "fix",
            Self::Feature => "feature",
            Self::Docs => "docs",
            Self::Test => "test",
            Self::Refactor => "refactor",
            Self::Chore => "chore",
        }
    }
}

/// Downstream work skill, recommended in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Skill {
    RootCauseAnalysis,
    TestDrivenFix,
    Exploration,
    PlanThenExecute,
}

impl Skill {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RootCauseAnalysis => "root-cause-analysis",
            Self::TestDrivenFix => "test-driven-fix",
            Self::Exploration => "exploration",
            Self::PlanThenExecute => "plan-then-execute",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "root-cause-analysis" => Some(Self::RootCauseAnalysis),
            "test-driven-fix" => Some(Self::TestDrivenFix),
            "exploration" => Some(Self::Exploration),
            "plan-then-execute" => Some(Self::PlanThenExecute),
            _ => None,
        }
    }
}

/// Clarity-of-cause signal: for bugs, is the cause already pinned down;
/// for features, is the shape of the work already clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clarity {
    Clear,
    Ambiguous,
}

const LABEL_SIGNALS: &[(&str, BranchKind)] = &[
    ("bug", BranchKind::Fix),
    ("defect", BranchKind::Fix),
    ("regression", BranchKind::Fix),
    ("feature", BranchKind::Feature),
    ("enhancement", BranchKind::Feature),
    ("documentation", BranchKind::Docs),
    ("docs", BranchKind::Docs),
    ("testing", BranchKind::Test),
    ("test", BranchKind::Test),
    ("refactor", BranchKind::Refactor),
    ("tech-debt", BranchKind::Refactor),
    ("chore", BranchKind::Chore),
    ("maintenance", BranchKind::Chore),
    ("dependencies", BranchKind::Chore),
];

const TEXT_SIGNALS: &[(&str, BranchKind)] = &[
    ("crash", BranchKind::Fix),
    ("panic", BranchKind::Fix),
    ("broken", BranchKind::Fix),
    ("regression", BranchKind::Fix),
    ("error when", BranchKind::Fix),
    ("fails to", BranchKind::Fix),
    ("readme", BranchKind::Docs),
    ("document", BranchKind::Docs),
    ("refactor", BranchKind::Refactor),
    ("clean up", BranchKind::Refactor),
    ("flaky test", BranchKind::Test),
    ("test coverage", BranchKind::Test),
    ("upgrade", BranchKind::Chore),
    ("bump", BranchKind::Chore),
];

/// Classify a ticket into a branch kind. Labels win over free text; free
/// text wins over the `Feature` default.
#[must_use]
pub fn classify(labels: &[String], text: &str) -> BranchKind {
    for label in labels {
        let label = label.to_lowercase();
        for (signal, kind) in LABEL_SIGNALS {
            if label == *signal {
                return *kind;
            }
        }
    }
    let text = text.to_lowercase();
    for (signal, kind) in TEXT_SIGNALS {
        if text.contains(signal) {
            return *kind;
        }
    }
    BranchKind::Feature
}

const CLEAR_CAUSE_SIGNALS: &[&str] = &[
    "steps to reproduce",
    "reproduce:",
    "stack trace",
    "caused by",
    "introduced in",
    "regression from",
];

const MURKY_SIGNALS: &[&str] = &[
    "intermittent",
    "sometimes",
    "occasionally",
    "investigate",
    "unclear",
    "unknown",
    "not sure",
    "no repro",
];

const COMPLEX_FEATURE_SIGNALS: &[&str] = &["design", "migration", "across", "rework", "rearchitect"];

/// Assess the clarity-of-cause signal from ticket text. Bugs without a
/// pinned-down cause default to `Ambiguous`.
#[must_use]
pub fn assess_clarity(kind: BranchKind, text: &str) -> Clarity {
    let text = text.to_lowercase();
    match kind {
        BranchKind::Fix => {
            if MURKY_SIGNALS.iter().any(|s| text.contains(s)) {
                Clarity::Ambiguous
            } else if CLEAR_CAUSE_SIGNALS.iter().any(|s| text.contains(s)) {
                Clarity::Clear
            } else {
                Clarity::Ambiguous
            }
        }
        BranchKind::Feature => {
            let bullets = text.lines().filter(|l| l.trim_start().starts_with('-')).count();
            if text.len() > 600
                || bullets > 3
                || COMPLEX_FEATURE_SIGNALS.iter().any(|s| text.contains(s))
            {
                Clarity::Ambiguous
            } else {
                Clarity::Clear
            }
        }
        _ => Clarity::Clear,
    }
}

/// The fixed (kind, clarity) decision table. Always 1-3 skills, in order.
#[must_use]
pub fn recommend_skills(kind: BranchKind, clarity: Clarity) -> Vec<Skill> {
    match (kind, clarity) {
        (BranchKind::Fix, Clarity::Ambiguous) => {
            vec![Skill::RootCauseAnalysis, Skill::TestDrivenFix]
        }
        (BranchKind::Fix, Clarity::Clear) => vec![Skill::TestDrivenFix],
        (BranchKind::Feature, Clarity::Ambiguous) => {
            vec![Skill::Exploration, Skill::PlanThenExecute]
        }
        _ => vec![Skill::PlanThenExecute],
    }
}

/// Build the branch name `{prefix}/{TICKET-ID}-{slug}`.
#[must_use]
pub fn branch_name(kind: BranchKind, id: &crate::ident::TicketId, title: &str) -> String {
    format!("{}/{}-{}", kind.as_str(), id, slugify(title))
}

const MAX_SLUG_LEN: usize = 40;

fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut prev_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash && !slug.is_empty() {
            slug.push('-');
            prev_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-');
    let mut slug = slug.to_string();
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        let trimmed = slug.trim_end_matches('-').len();
        slug.truncate(trimmed);
    }
    if slug.is_empty() {
        "work".to_string()
    } else {
        slug
    }
}
