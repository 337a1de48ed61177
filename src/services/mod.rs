//! Collaborator ports consumed by the pipelines.
//!
//! Every external system the orchestrator talks to sits behind one of these
//! traits: the production adapters in `infra/` shell out or speak HTTP, and
//! the scenario tests script fakes. All calls are blocking; each phase's
//! external call completes (success or explicit failure) before the next
//! phase begins.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::ident::TicketId;
use crate::ticket::{
    DelegationOutcome, ExecutionBrief, Finding, PullRequest, StartPlan, Ticket, TicketStatus,
};

/// Version control backend (git).
pub trait VersionControl {
    /// # Errors
    /// Fails when the backend invocation fails.
    fn current_branch(&self) -> Result<String>;
    /// # Errors
    /// Fails when the backend invocation fails.
    fn fetch(&self, remote: &str) -> Result<()>;
    /// # Errors
    /// Fails when the backend invocation fails.
    fn branch_exists(&self, branch: &str) -> Result<bool>;
    /// True when running from the primary checkout rather than a linked
    /// worktree.
    ///
    /// # Errors
    /// Fails when the backend invocation fails.
    fn is_primary_checkout(&self) -> Result<bool>;
    /// Create branch and worktree together from `base`.
    ///
    /// # Errors
    /// A collision in either is `Error::AlreadyExists`.
    fn add_worktree(&self, path: &Path, branch: &str, base: &str) -> Result<()>;
    /// # Errors
    /// Fails when the backend invocation fails.
    fn remove_worktree(&self, path: &Path) -> Result<()>;
    /// Worktree directory that has `branch` checked out, if any.
    ///
    /// # Errors
    /// Fails when the backend invocation fails.
    fn worktree_for(&self, branch: &str) -> Result<Option<PathBuf>>;
    /// # Errors
    /// Fails when the backend invocation fails.
    fn is_clean(&self) -> Result<bool>;
    /// # Errors
    /// Fails when the backend invocation fails.
    fn stage_all(&self) -> Result<()>;
    /// Commit staged changes where the invocation directory points.
    ///
    /// # Errors
    /// Fails when the backend invocation fails.
    fn commit(&self, message: &str) -> Result<()>;
    /// Commit staged changes in the primary checkout. The merge phase
    /// stages there even when driven from a linked worktree.
    ///
    /// # Errors
    /// Fails when the backend invocation fails.
    fn commit_primary(&self, message: &str) -> Result<()>;
    /// # Errors
    /// Fails when the backend invocation fails.
    fn checkout(&self, branch: &str) -> Result<()>;
    /// Fast-forward pull; never merges or rebases implicitly.
    ///
    /// # Errors
    /// Fails when the backend invocation fails.
    fn pull(&self, remote: &str, branch: &str) -> Result<()>;
    /// Squash-merge `branch` into the current branch, staging the result
    /// without committing. Returns `false` when the merge succeeded but
    /// staged nothing (branch already merged).
    ///
    /// # Errors
    /// Conflicts are `Error::MergeConflict`.
    fn squash_merge(&self, branch: &str) -> Result<bool>;
    /// # Errors
    /// Fails when the backend invocation fails.
    fn abort_merge(&self) -> Result<()>;
    /// # Errors
    /// Fails when the backend invocation fails.
    fn reset_hard(&self, reference: &str) -> Result<()>;
    /// Remove a path from index and working tree, ignoring absence.
    ///
    /// # Errors
    /// Fails when the backend invocation fails.
    fn remove_path(&self, path: &str) -> Result<()>;
    /// Push a branch, never forced.
    ///
    /// # Errors
    /// A non-fast-forward rejection is `Error::PushRejected`.
    fn push(&self, remote: &str, branch: &str) -> Result<()>;
    /// # Errors
    /// Fails when the backend invocation fails.
    fn delete_remote_branch(&self, remote: &str, branch: &str) -> Result<()>;
    /// # Errors
    /// Fails when the backend invocation fails.
    fn delete_branch(&self, branch: &str) -> Result<()>;
    /// # Errors
    /// Fails when the backend invocation fails.
    fn rev_parse(&self, reference: &str) -> Result<String>;
}

/// Code-hosting API (PRs).
pub trait CodeHost {
    /// Zero-or-one open PR for a branch. The end pipeline always looks up
    /// before creating.
    ///
    /// # Errors
    /// Fails when the host cannot be reached or answers garbage.
    fn find_pr(&self, branch: &str) -> Result<Option<PullRequest>>;
    /// # Errors
    /// Fails when the host refuses the creation.
    fn create_pr(&self, title: &str, body: &str, branch: &str, base: &str) -> Result<PullRequest>;
    /// # Errors
    /// Fails when the host cannot be reached.
    fn comment(&self, pr: &PullRequest, body: &str) -> Result<()>;
}

/// Issue tracker API.
pub trait IssueTracker {
    /// # Errors
    /// An unknown ID is `Error::NotFound`; other failures are
    /// `Error::Tracker`.
    fn fetch(&self, id: &TicketId) -> Result<Ticket>;
    /// # Errors
    /// Fails when the tracker cannot be reached.
    fn set_status(&self, id: &TicketId, status: TicketStatus) -> Result<()>;
    /// # Errors
    /// Fails when the tracker cannot be reached.
    fn attach_link(&self, id: &TicketId, url: &str) -> Result<()>;
}

/// Pass/fail plus failure detail from a test suite run.
#[derive(Debug, Clone)]
pub struct SuiteOutcome {
    pub passed: bool,
    pub failures: Vec<String>,
}

/// Test runner.
pub trait TestRunner {
    /// # Errors
    /// Fails when the configured command cannot be launched; a failing
    /// suite is a non-passing `SuiteOutcome`, not an error.
    fn run_suite(&self) -> Result<SuiteOutcome>;
    /// # Errors
    /// Fails when the configured command cannot be launched.
    fn run_integration(&self) -> Result<SuiteOutcome>;
}

/// Review subroutine: one invocation per review round.
pub trait Reviewer {
    /// # Errors
    /// Fails when the subroutine cannot run or emits unparseable output.
    fn review(&self, pr: &PullRequest) -> Result<Vec<Finding>>;
}

/// Operator response to the start confirmation point.
#[derive(Debug, Clone)]
pub enum Confirmation {
    /// Approved, possibly with an adjusted skill sequence.
    Approved { skills: Vec<crate::classify::Skill> },
    Declined,
}

/// Operator choice at the test-verification gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestChoice {
    Run,
    Skip,
}

/// Operator decision on review findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    /// Agree: fix, commit, push, re-review (counts toward the bound).
    Fix,
    /// Dismiss and proceed to merge.
    Dismiss,
}

/// The explicit human suspension points. These are the only places
/// execution waits on a person; modeling them as a port keeps the machine
/// state serializable and lets tests script responses.
pub trait Interact {
    /// # Errors
    /// Fails when the prompt cannot be presented or read.
    fn confirm_start(&self, plan: &StartPlan) -> Result<Confirmation>;
    /// # Errors
    /// Fails when the prompt cannot be presented or read.
    fn test_choice(&self) -> Result<TestChoice>;
    /// # Errors
    /// Fails when the prompt cannot be presented or read.
    fn review_decision(&self, round: u32, findings: &[Finding]) -> Result<ReviewDecision>;
    /// Disambiguation prompt when no ticket ID is resolvable.
    ///
    /// # Errors
    /// Fails when the prompt cannot be presented or read.
    fn ask_ticket_reference(&self) -> Result<String>;
}

/// Delegated execution unit the start pipeline hands off to.
pub trait Delegate {
    /// # Errors
    /// Fails when the unit cannot be launched; an unsuccessful unit is a
    /// failed `DelegationOutcome`, not an error.
    fn execute(&self, brief: &ExecutionBrief) -> Result<DelegationOutcome>;
}
