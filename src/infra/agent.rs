//! Delegated execution adapter: renders the brief into the worktree and
//! hands it to the configured agent command.

use tracing::info;

use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::services::Delegate;
use crate::subprocess::Tool;
use crate::template;
use crate::ticket::{DelegationOutcome, ExecutionBrief};

const BRIEF_FILE: &str = ".tkt-brief.md";

pub struct AgentProcess {
    command: String,
    brief_template: Option<String>,
}

impl AgentProcess {
    /// # Errors
    /// No configured command, or an unreadable brief template, is
    /// `Error::Config`.
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let command = config.command.clone().ok_or_else(|| {
            Error::Config("no [agent] command configured; cannot delegate execution".to_string())
        })?;
        let brief_template = config
            .brief_template
            .as_ref()
            .map(|path| {
                std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("reading brief template {}: {e}", path.display()))
                })
            })
            .transpose()?;
        Ok(Self {
            command,
            brief_template,
        })
    }
}

impl Delegate for AgentProcess {
    fn execute(&self, brief: &ExecutionBrief) -> Result<DelegationOutcome> {
        let rendered = template::render_brief(brief, self.brief_template.as_deref())?;
        let brief_path = brief.worktree_path.join(BRIEF_FILE);
        std::fs::write(&brief_path, rendered)?;

        info!(command = %self.command, worktree = %brief.worktree_path.display(), "delegating");
        let line = format!("{} {}", self.command, brief_path.display());
        let out = Tool::new("sh")
            .args(&["-c", &line])
            .cwd(&brief.worktree_path)
            .run()?;

        let summary = if out.stdout.trim().is_empty() {
            out.stderr.trim().to_string()
        } else {
            tail(&out.stdout, 10)
        };
        Ok(DelegationOutcome {
            success: out.success(),
            summary,
        })
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim().lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
