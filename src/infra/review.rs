//! Review subroutine adapter: a configured command that takes the PR URL
//! and prints findings as JSON.
//!
//! Accepted output shapes: a bare array of findings, or an object with a
//! `findings` array. Each finding is `{"summary": "...", "severity": 0-10}`.

use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::config::ReviewConfig;
use crate::error::{Error, Result};
use crate::services::Reviewer;
use crate::subprocess::Tool;
use crate::ticket::{Finding, PullRequest};

const REVIEW_TIMEOUT: Duration = Duration::from_secs(600);

pub struct CommandReviewer {
    command: String,
}

#[derive(Deserialize)]
struct FindingDto {
    summary: String,
    #[serde(default)]
    severity: u8,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReviewOutput {
    Bare(Vec<FindingDto>),
    Wrapped { findings: Vec<FindingDto> },
}

impl CommandReviewer {
    /// # Errors
    /// No configured command is `Error::Config`.
    pub fn from_config(config: &ReviewConfig) -> Result<Self> {
        let command = config.command.clone().ok_or_else(|| {
            Error::Config("no [review] command configured; cannot run review rounds".to_string())
        })?;
        Ok(Self { command })
    }
}

impl Reviewer for CommandReviewer {
    fn review(&self, pr: &PullRequest) -> Result<Vec<Finding>> {
        info!(pr = pr.number, "running review round");
        let line = format!("{} {}", self.command, pr.url);
        let out = Tool::new("sh")
            .args(&["-c", &line])
            .timeout(REVIEW_TIMEOUT)
            .run_ok()?;
        let parsed: ReviewOutput = out.parse_json()?;
        let dtos = match parsed {
            ReviewOutput::Bare(dtos) | ReviewOutput::Wrapped { findings: dtos } => dtos,
        };
        Ok(dtos
            .into_iter()
            .map(|d| Finding {
                summary: d.summary,
                severity: d.severity,
            })
            .collect())
    }
}
