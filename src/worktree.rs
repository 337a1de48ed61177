//! Worktree provisioner: creates an isolated working copy on a new branch
//! tracking the remote base ref.
//!
//! Preconditions are strict: runs only from the primary checkout, and
//! always fetches before branching so new work is never based on stale
//! history. A name collision is reported for disambiguation, never
//! auto-resolved.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ident::TicketId;
use crate::services::VersionControl;

/// What to create: branch name, base ref, and the worktree directory
/// (a sibling named after the ticket ID).
#[derive(Debug, Clone, Serialize)]
pub struct WorktreePlan {
    pub branch: String,
    pub base: String,
    pub path: PathBuf,
}

impl WorktreePlan {
    #[must_use]
    pub fn new(config: &Config, repo_root: &Path, id: &TicketId, branch: String) -> Self {
        let base = format!("{}/{}", config.git.remote, config.git.default_branch);
        let path = repo_root
            .join(&config.git.worktree_root)
            .join(id.as_str());
        Self { branch, base, path }
    }
}

/// Create the branch and worktree together. Fetches first.
///
/// # Errors
/// Collisions in branch name or target path are `Error::AlreadyExists`;
/// running from a linked worktree is `Error::Precondition`.
pub fn provision(vcs: &dyn VersionControl, remote: &str, plan: &WorktreePlan) -> Result<()> {
    if !vcs.is_primary_checkout()? {
        return Err(Error::Precondition(
            "worktree provisioning must run from the primary checkout, not a linked worktree"
                .to_string(),
        ));
    }

    vcs.fetch(remote)?;

    if vcs.branch_exists(&plan.branch)? {
        return Err(Error::AlreadyExists {
            kind: "branch",
            name: plan.branch.clone(),
        });
    }
    if plan.path.exists() {
        return Err(Error::AlreadyExists {
            kind: "worktree path",
            name: plan.path.display().to_string(),
        });
    }

    // Branch and worktree come from one git invocation, not two separable
    // steps a partial failure could leave inconsistent.
    vcs.add_worktree(&plan.path, &plan.branch, &plan.base)
}
