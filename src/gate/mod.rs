//! Safety gate boundary: pure pattern classifiers that approve or deny a
//! proposed action before it reaches the orchestrator or a shell.
//!
//! Both classifiers are pure functions of input text to a verdict and carry
//! no state. They are consumed at the hook boundary (`tkt gate ...`) and by
//! the git adapter before remote-mutating commands.

pub mod command;
pub mod paths;

/// Allow/deny decision with the matched reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny { reason: String },
}

impl Verdict {
    #[must_use]
    pub const fn is_deny(&self) -> bool {
        matches!(self, Self::Deny { .. })
    }
}
