use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Config file name constant.
pub const CONFIG_TOML: &str = ".tkt.toml";

/// Top-level `.tkt.toml` config.
///
/// Everything environmental lives here: repository layout, tracker
/// endpoint, test commands, the delegated agent. The pipelines themselves
/// take no flags beyond an optional ticket reference.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    pub version: String,
    pub project: ProjectConfig,
    #[serde(default)]
    pub git: GitConfig,
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub tests: TestsConfig,
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    /// Ephemeral plan file scrubbed from the squash-merge before the
    /// integration run.
    #[serde(default = "default_plan_artifact")]
    pub plan_artifact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProjectConfig {
    pub name: String,
    /// Tracker project prefix (e.g. `NOV` for tickets like `NOV-123`).
    /// Needed to resolve short numeric references.
    #[serde(default)]
    pub ticket_prefix: Option<String>,
    /// Convention reminders passed verbatim into the execution brief.
    #[serde(default)]
    pub conventions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GitConfig {
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Directory that receives ticket worktrees, relative to the primary
    /// checkout. Each worktree is a sibling directory named after its
    /// ticket ID.
    #[serde(default = "default_worktree_root")]
    pub worktree_root: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
            remote: default_remote(),
            worktree_root: default_worktree_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TrackerConfig {
    /// Issue tracker API base URL, e.g. `https://tracker.example.com/api`.
    pub base_url: String,
    /// Env var holding the API token. Falls back to the `tracker-token`
    /// file under the user config dir.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TestsConfig {
    /// Full test suite command, run through `sh -c` (phase 2).
    #[serde(default)]
    pub suite: Option<String>,
    /// Integration suite command, run on the merged result before any push
    /// (phase 6).
    #[serde(default)]
    pub integration: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReviewConfig {
    /// Review subroutine command. Receives the PR URL as its last argument
    /// and prints findings as JSON.
    #[serde(default)]
    pub command: Option<String>,
    /// Record dismissed findings as a PR comment.
    #[serde(default = "default_true")]
    pub dismiss_note: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            command: None,
            dismiss_note: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AgentConfig {
    /// Delegated execution unit. Receives the rendered brief path as its
    /// last argument, cwd set to the new worktree.
    #[serde(default)]
    pub command: Option<String>,
    /// Override the built-in execution brief template.
    #[serde(default)]
    pub brief_template: Option<PathBuf>,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_worktree_root() -> String {
    "..".to_string()
}

fn default_token_env() -> String {
    "TKT_TRACKER_TOKEN".to_string()
}

fn default_plan_artifact() -> String {
    ".tkt-plan.md".to_string()
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load config from an explicit path.
    ///
    /// # Errors
    /// Unreadable or malformed files are `Error::Config`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))
    }

    /// Walk up from `start` until a `.tkt.toml` is found.
    /// Returns the config and the directory containing it.
    ///
    /// # Errors
    /// `Error::Config` when no ancestor carries a config file.
    pub fn discover(start: &Path) -> Result<(Self, PathBuf)> {
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_TOML);
            if candidate.exists() {
                return Ok((Self::load(&candidate)?, dir.to_path_buf()));
            }
        }
        Err(Error::Config(format!(
            "no {CONFIG_TOML} found in {} or any parent",
            start.display()
        )))
    }
}
