//! Test runner adapter: configured shell commands. The branch suite runs
//! where the pipeline was invoked (possibly a linked worktree); the
//! integration suite runs in the primary checkout, where the merge lands.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::config::TestsConfig;
use crate::error::Result;
use crate::services::{SuiteOutcome, TestRunner};
use crate::subprocess::Tool;

const SUITE_TIMEOUT: Duration = Duration::from_secs(1800);

pub struct CommandRunner {
    suite: Option<String>,
    integration: Option<String>,
    suite_root: PathBuf,
    integration_root: PathBuf,
}

impl CommandRunner {
    #[must_use]
    pub fn new(config: &TestsConfig, suite_root: &Path, integration_root: &Path) -> Self {
        Self {
            suite: config.suite.clone(),
            integration: config.integration.clone(),
            suite_root: suite_root.to_path_buf(),
            integration_root: integration_root.to_path_buf(),
        }
    }

    fn run_command(&self, command: &str, root: &Path) -> Result<SuiteOutcome> {
        info!(command, root = %root.display(), "running test suite");
        let out = Tool::new("sh")
            .args(&["-c", command])
            .cwd(root)
            .timeout(SUITE_TIMEOUT)
            .run()?;
        if out.success() {
            return Ok(SuiteOutcome {
                passed: true,
                failures: Vec::new(),
            });
        }
        Ok(SuiteOutcome {
            passed: false,
            failures: failure_lines(&out.stdout, &out.stderr),
        })
    }

    fn run_configured(&self, command: Option<&str>, root: &Path) -> Result<SuiteOutcome> {
        // No configured command means nothing to verify; report a pass so
        // the phase records "skipped" semantics rather than halting.
        command.map_or_else(
            || {
                Ok(SuiteOutcome {
                    passed: true,
                    failures: Vec::new(),
                })
            },
            |cmd| self.run_command(cmd, root),
        )
    }
}

/// Pull the lines that look like failure detail out of a failing run, so
/// the halt message carries tests, not the whole log.
fn failure_lines(stdout: &str, stderr: &str) -> Vec<String> {
    let mut failures: Vec<String> = stdout
        .lines()
        .chain(stderr.lines())
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("fail") || lower.contains("error") || lower.contains("panic")
        })
        .map(|line| line.trim().to_string())
        .take(20)
        .collect();
    if failures.is_empty() {
        failures.push("suite exited non-zero with no recognizable failure lines".to_string());
    }
    failures
}

impl TestRunner for CommandRunner {
    fn run_suite(&self) -> Result<SuiteOutcome> {
        self.run_configured(self.suite.as_deref(), &self.suite_root)
    }

    fn run_integration(&self) -> Result<SuiteOutcome> {
        self.run_configured(self.integration.as_deref(), &self.integration_root)
    }
}
