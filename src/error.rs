use std::process::ExitCode;

/// Errors that halt a pipeline or the CLI, each with a distinct exit code.
///
/// The first group is the pipeline halt taxonomy: every variant carries the
/// concrete detail the operator needs (failing tests, conflicting files,
/// colliding names). None of these are retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("cannot resolve a ticket id from {input:?}: {hint}")]
    AmbiguousReference { input: String, hint: String },

    #[error("on protected branch '{0}'; switch to a work branch first")]
    WrongBranch(String),

    #[error("{kind} '{name}' already exists; disambiguate manually before retrying")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("test suite failing:\n  {}", failures.join("\n  "))]
    TestsFailing { failures: Vec<String> },

    #[error("merge conflict in:\n  {}", files.join("\n  "))]
    MergeConflict { files: Vec<String> },

    #[error("integration suite failing on the merged result:\n  {}", failures.join("\n  "))]
    IntegrationFailing { failures: Vec<String> },

    #[error("review limit reached: {rounds} rounds with unresolved findings; PR left unmerged")]
    ReviewLimitReached { rounds: u32 },

    #[error("push rejected by remote: {0}")]
    PushRejected(String),

    // Ambient failures.
    #[error("config error: {0}")]
    Config(String),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} failed (exit {code}): {message}")]
    ToolFailed {
        tool: String,
        code: i32,
        message: String,
    },

    #[error("{tool} timed out after {timeout_secs}s")]
    Timeout { tool: String, timeout_secs: u64 },

    #[error("tracker api error: {0}")]
    Tracker(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::from(2),
            Self::ToolNotFound { .. } => ExitCode::from(3),
            Self::ToolFailed { .. } => ExitCode::from(4),
            Self::Timeout { .. } => ExitCode::from(5),
            Self::Precondition(_) => ExitCode::from(6),
            Self::Tracker(_) => ExitCode::from(7),
            Self::Parse(_) => ExitCode::from(8),
            Self::NotFound(_) => ExitCode::from(10),
            Self::AmbiguousReference { .. } => ExitCode::from(11),
            Self::WrongBranch(_) => ExitCode::from(12),
            Self::AlreadyExists { .. } => ExitCode::from(13),
            Self::TestsFailing { .. } => ExitCode::from(14),
            Self::MergeConflict { .. } => ExitCode::from(15),
            Self::IntegrationFailing { .. } => ExitCode::from(16),
            Self::ReviewLimitReached { .. } => ExitCode::from(17),
            Self::PushRejected(_) => ExitCode::from(18),
            Self::Io(_) => ExitCode::FAILURE,
        }
    }
}
