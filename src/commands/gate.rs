//! Safety gate entry points, wired as shell hooks.
//!
//! Input arrives on stdin as hook JSON (`{"tool_input": {"command": ...}}`
//! or `{"tool_input": {"file_path": ...}}`); bare text is accepted too so
//! the gates stay usable ad hoc. Allow exits 0; deny prints the reason to
//! stderr and exits 2, the hook blocking convention.

use clap::Subcommand;

use crate::gate::{self, Verdict};

#[derive(Debug, Subcommand)]
pub enum GateCommand {
    /// Check a proposed shell command against destructive patterns
    Command,
    /// Check a proposed file edit against sensitive-path patterns
    File,
}

impl GateCommand {
    /// # Errors
    /// Infallible today; the signature matches the other commands so
    /// `main` dispatches uniformly.
    pub fn execute(self) -> anyhow::Result<()> {
        let input = read_stdin();
        let verdict = match self {
            Self::Command => gate::command::check_command(&extract(&input, "command")),
            Self::File => gate::paths::check_path(&extract(&input, "file_path")),
        };
        match verdict {
            Verdict::Allow => Ok(()),
            Verdict::Deny { reason } => {
                eprintln!("denied: {reason}");
                std::process::exit(2);
            }
        }
    }
}

// Size-capped stdin read (64KB).
fn read_stdin() -> String {
    use std::io::Read;
    let mut buf = String::new();
    let mut handle = std::io::stdin().take(64 * 1024);
    handle.read_to_string(&mut buf).ok();
    buf
}

/// Pull the relevant field out of hook JSON, falling back to the raw text.
fn extract(input: &str, key: &str) -> String {
    serde_json::from_str::<serde_json::Value>(input)
        .ok()
        .and_then(|v| v["tool_input"][key].as_str().map(str::to_string))
        .unwrap_or_else(|| input.trim().to_string())
}
