//! Code-host adapter built on the `gh` CLI.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::services::CodeHost;
use crate::subprocess::Tool;
use crate::ticket::PullRequest;

pub struct GhCli {
    cwd: PathBuf,
}

#[derive(Deserialize)]
struct PrView {
    number: u64,
    url: String,
    #[serde(rename = "headRefName")]
    head_ref_name: String,
}

impl From<PrView> for PullRequest {
    fn from(view: PrView) -> Self {
        Self {
            number: view.number,
            url: view.url,
            branch: view.head_ref_name,
        }
    }
}

impl GhCli {
    #[must_use]
    pub fn new(cwd: &Path) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
        }
    }

    fn gh(&self, args: &[&str]) -> Tool {
        Tool::new("gh").args(args).cwd(&self.cwd)
    }
}

impl CodeHost for GhCli {
    fn find_pr(&self, branch: &str) -> Result<Option<PullRequest>> {
        let out = self
            .gh(&[
                "pr",
                "list",
                "--head",
                branch,
                "--state",
                "open",
                "--json",
                "number,url,headRefName",
                "--limit",
                "1",
            ])
            .run_ok()?;
        let views: Vec<PrView> = out.parse_json()?;
        Ok(views.into_iter().next().map(PullRequest::from))
    }

    fn create_pr(&self, title: &str, body: &str, branch: &str, base: &str) -> Result<PullRequest> {
        debug!(branch, base, "creating pull request");
        self.gh(&[
            "pr", "create", "--title", title, "--body", body, "--head", branch, "--base", base,
        ])
        .run_ok()?;
        // `gh pr create` prints the URL but not the number; read both back.
        self.find_pr(branch)?.ok_or_else(|| {
            Error::NotFound(format!("created PR for '{branch}' but cannot read it back"))
        })
    }

    fn comment(&self, pr: &PullRequest, body: &str) -> Result<()> {
        let number = pr.number.to_string();
        self.gh(&["pr", "comment", &number, "--body", body])
            .run_ok()?;
        Ok(())
    }
}
