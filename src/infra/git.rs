//! Git adapter built on the `git` CLI.
//!
//! Two working directories matter: the invocation directory (where the
//! operator ran the command, possibly a linked worktree) and the primary
//! checkout root. Branch-local operations run in the invocation directory;
//! operations against the default branch run in the primary root so an end
//! pipeline started inside a worktree still merges in the right place.
//!
//! Remote-mutating commands pass through the command-safety gate before
//! execution.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::gate;
use crate::subprocess::Tool;

pub struct GitCli {
    /// Where the operator invoked us.
    cwd: PathBuf,
    /// Root of the primary checkout (owns the shared .git directory).
    primary_root: PathBuf,
}

impl GitCli {
    /// Resolve the primary checkout root from the invocation directory.
    ///
    /// # Errors
    /// Returns an error when `git` is missing or the directory is not
    /// inside a repository.
    pub fn open(cwd: &Path) -> Result<Self> {
        let common = Tool::new("git")
            .args(&["rev-parse", "--path-format=absolute", "--git-common-dir"])
            .cwd(cwd)
            .run_ok()?;
        let common_dir = PathBuf::from(common.stdout.trim());
        let primary_root = common_dir
            .parent()
            .ok_or_else(|| {
                Error::Precondition(format!(
                    "cannot locate a repository root above {}",
                    common_dir.display()
                ))
            })?
            .to_path_buf();
        Ok(Self {
            cwd: cwd.to_path_buf(),
            primary_root,
        })
    }

    #[must_use]
    pub fn primary_root(&self) -> &Path {
        &self.primary_root
    }

    fn git(&self, args: &[&str]) -> Tool {
        Tool::new("git").args(args).cwd(&self.cwd)
    }

    fn git_primary(&self, args: &[&str]) -> Tool {
        Tool::new("git").args(args).cwd(&self.primary_root)
    }

    fn run_gated(&self, tool: &Tool) -> Result<()> {
        gate::command::ensure_allowed(&tool.render())?;
        debug!(command = %tool.render(), "git");
        tool.run_ok()?;
        Ok(())
    }

    fn conflicted_files(&self) -> Result<Vec<String>> {
        let out = self
            .git_primary(&["diff", "--name-only", "--diff-filter=U"])
            .run_ok()?;
        Ok(out
            .stdout
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Branch currently checked out in some worktree, mapped to its
    /// directory. Parsed from `git worktree list --porcelain`.
    fn worktree_table(&self) -> Result<Vec<(PathBuf, Option<String>)>> {
        let out = self.git(&["worktree", "list", "--porcelain"]).run_ok()?;
        let mut table = Vec::new();
        let mut current: Option<PathBuf> = None;
        for line in out.stdout.lines() {
            if let Some(path) = line.strip_prefix("worktree ") {
                if let Some(p) = current.take() {
                    table.push((p, None));
                }
                current = Some(PathBuf::from(path));
            } else if let Some(reference) = line.strip_prefix("branch ") {
                let branch = reference
                    .strip_prefix("refs/heads/")
                    .unwrap_or(reference)
                    .to_string();
                if let Some(p) = current.take() {
                    table.push((p, Some(branch)));
                }
            }
        }
        if let Some(p) = current.take() {
            table.push((p, None));
        }
        Ok(table)
    }
}

impl crate::services::VersionControl for GitCli {
    fn current_branch(&self) -> Result<String> {
        let out = self
            .git(&["rev-parse", "--abbrev-ref", "HEAD"])
            .run_ok()?;
        Ok(out.stdout.trim().to_string())
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.git(&["fetch", remote, "--prune"]).run_ok()?;
        Ok(())
    }

    fn branch_exists(&self, branch: &str) -> Result<bool> {
        let reference = format!("refs/heads/{branch}");
        let out = self
            .git(&["show-ref", "--verify", "--quiet", &reference])
            .run()?;
        Ok(out.success())
    }

    fn is_primary_checkout(&self) -> Result<bool> {
        let git_dir = self
            .git(&["rev-parse", "--path-format=absolute", "--git-dir"])
            .run_ok()?;
        let common_dir = self
            .git(&["rev-parse", "--path-format=absolute", "--git-common-dir"])
            .run_ok()?;
        Ok(git_dir.stdout.trim() == common_dir.stdout.trim())
    }

    fn add_worktree(&self, path: &Path, branch: &str, base: &str) -> Result<()> {
        let path_str = path.display().to_string();
        let out = self
            .git(&["worktree", "add", "-b", branch, &path_str, base])
            .run()?;
        if out.success() {
            return Ok(());
        }
        if out.stderr.contains("already exists") {
            return Err(Error::AlreadyExists {
                kind: "branch",
                name: branch.to_string(),
            });
        }
        Err(Error::ToolFailed {
            tool: "git".to_string(),
            code: out.exit_code,
            message: out.stderr.trim().to_string(),
        })
    }

    fn remove_worktree(&self, path: &Path) -> Result<()> {
        let path_str = path.display().to_string();
        self.git(&["worktree", "remove", &path_str]).run_ok()?;
        Ok(())
    }

    fn worktree_for(&self, branch: &str) -> Result<Option<PathBuf>> {
        Ok(self
            .worktree_table()?
            .into_iter()
            .find(|(_, b)| b.as_deref() == Some(branch))
            .map(|(p, _)| p))
    }

    fn is_clean(&self) -> Result<bool> {
        let out = self.git(&["status", "--porcelain"]).run_ok()?;
        Ok(out.stdout.trim().is_empty())
    }

    fn stage_all(&self) -> Result<()> {
        self.git(&["add", "--all"]).run_ok()?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.git(&["commit", "-m", message]).run_ok()?;
        Ok(())
    }

    fn commit_primary(&self, message: &str) -> Result<()> {
        self.git_primary(&["commit", "-m", message]).run_ok()?;
        Ok(())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        // When the branch lives in another worktree a plain checkout would
        // fail; the branch being active somewhere is already the state we
        // want, so operations on it go through git_primary instead.
        if self.worktree_for(branch)?.is_some() {
            return Ok(());
        }
        self.git_primary(&["checkout", branch]).run_ok()?;
        Ok(())
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.git_primary(&["pull", "--ff-only", remote, branch])
            .run_ok()?;
        Ok(())
    }

    fn squash_merge(&self, branch: &str) -> Result<bool> {
        let out = self.git_primary(&["merge", "--squash", branch]).run()?;
        if out.success() {
            // `merge --squash` of an already-merged branch exits 0 with an
            // empty index; report that so callers do not try to commit it.
            let staged = self.git_primary(&["diff", "--cached", "--quiet"]).run()?;
            return Ok(!staged.success());
        }
        let files = self.conflicted_files()?;
        if files.is_empty() {
            return Err(Error::ToolFailed {
                tool: "git".to_string(),
                code: out.exit_code,
                message: out.stderr.trim().to_string(),
            });
        }
        Err(Error::MergeConflict { files })
    }

    fn abort_merge(&self) -> Result<()> {
        // A squash merge leaves no MERGE_HEAD; clearing index and tree is
        // the abort.
        self.git_primary(&["reset", "--merge"]).run_ok()?;
        Ok(())
    }

    fn reset_hard(&self, reference: &str) -> Result<()> {
        self.git_primary(&["reset", "--hard", reference]).run_ok()?;
        Ok(())
    }

    fn remove_path(&self, path: &str) -> Result<()> {
        self.git_primary(&["rm", "-f", "--ignore-unmatch", "--quiet", "--", path])
            .run_ok()?;
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        let tool = self.git_primary(&["push", remote, branch]);
        gate::command::ensure_allowed(&tool.render())?;
        debug!(command = %tool.render(), "git");
        let out = tool.run()?;
        if out.success() {
            return Ok(());
        }
        if out.stderr.contains("[rejected]") || out.stderr.contains("failed to push") {
            return Err(Error::PushRejected(out.stderr.trim().to_string()));
        }
        Err(Error::ToolFailed {
            tool: "git".to_string(),
            code: out.exit_code,
            message: out.stderr.trim().to_string(),
        })
    }

    fn delete_remote_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.run_gated(&self.git_primary(&["push", remote, "--delete", branch]))
    }

    fn delete_branch(&self, branch: &str) -> Result<()> {
        // After a squash merge the branch is never an ancestor of the
        // default branch, so `-d` would always refuse. This runs only
        // once the merged result has passed integration and been pushed.
        self.git_primary(&["branch", "-D", branch]).run_ok()?;
        Ok(())
    }

    fn rev_parse(&self, reference: &str) -> Result<String> {
        let out = self.git(&["rev-parse", reference]).run_ok()?;
        Ok(out.stdout.trim().to_string())
    }
}
