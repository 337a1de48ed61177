//! Ticket-domain types shared by both pipelines and the collaborator ports.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classify::{BranchKind, Skill};
use crate::ident::TicketId;

/// Tracker workflow states the orchestrator reads and writes.
///
/// The orchestrator mutates status at exactly two points: entering review
/// (end pipeline phase 4) and entering done (phase 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TicketStatus {
    Backlog,
    Todo,
    InProgress,
    InReview,
    Done,
}

impl TicketStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::InReview => "in-review",
            Self::Done => "done",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "backlog" => Some(Self::Backlog),
            "todo" | "to-do" | "open" => Some(Self::Todo),
            "in-progress" | "in progress" | "started" => Some(Self::InProgress),
            "in-review" | "in review" | "review" => Some(Self::InReview),
            "done" | "closed" | "completed" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Read/write view of a tracker ticket. The tracker owns the record; this
/// is never treated as a cache.
#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub labels: Vec<String>,
    pub priority: Option<String>,
    pub status: TicketStatus,
    pub comments: Vec<String>,
}

impl Ticket {
    /// Concatenated free text used for classification signals.
    #[must_use]
    pub fn text(&self) -> String {
        let mut text = format!("{}\n{}", self.title, self.description);
        for comment in &self.comments {
            text.push('\n');
            text.push_str(comment);
        }
        text
    }
}

/// A pull request on the code host, associated 1:1 with a branch.
#[derive(Debug, Clone, Serialize)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
    pub branch: String,
}

/// One review finding with a numeric severity score (0 = note, 10 = blocker).
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub summary: String,
    pub severity: u8,
}

/// Outcome of one review-loop iteration. Ephemeral: exists only to enforce
/// the iteration bound and to report the run.
#[derive(Debug, Clone)]
pub struct ReviewRound {
    pub ordinal: u32,
    pub findings: Vec<Finding>,
    pub decision: RoundDecision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundDecision {
    NoIssues,
    IssuesFixed,
    IssuesDismissed,
}

/// Everything the start pipeline presents for confirmation and then
/// provisions from. Computed before any side effect.
#[derive(Debug, Clone, Serialize)]
pub struct StartPlan {
    pub ticket: Ticket,
    pub kind: BranchKind,
    pub branch: String,
    pub worktree_path: PathBuf,
    pub skills: Vec<Skill>,
}

/// Execution context handed to the delegated execution unit. The
/// orchestrator itself never writes code or commits.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionBrief {
    pub ticket: Ticket,
    pub branch: String,
    pub worktree_path: PathBuf,
    pub skills: Vec<Skill>,
    pub conventions: Vec<String>,
}

/// Result reported by the delegated execution unit.
#[derive(Debug, Clone)]
pub struct DelegationOutcome {
    pub success: bool,
    pub summary: String,
}

/// The end pipeline's sole externally visible output contract.
#[derive(Debug, Clone, Serialize)]
pub struct ClosureRecord {
    pub ticket: TicketId,
    pub pr_number: u64,
    pub pr_url: String,
    pub merged_at: DateTime<Utc>,
    pub review_rounds: u32,
    pub branch_deleted: bool,
    pub worktree_removed: bool,
}
