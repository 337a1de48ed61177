//! Template rendering for the execution brief and the PR body.

use minijinja::Environment;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::ticket::{ExecutionBrief, Ticket};

const BRIEF_TEMPLATE: &str = include_str!("templates/brief.md.jinja");
const PR_BODY_TEMPLATE: &str = include_str!("templates/pr-body.md.jinja");

#[derive(Serialize)]
struct BriefContext<'a> {
    ticket: &'a Ticket,
    branch: &'a str,
    worktree_path: String,
    skills: Vec<&'static str>,
    conventions: &'a [String],
}

#[derive(Serialize)]
struct PrBodyContext<'a> {
    ticket: &'a Ticket,
    tracker_base_url: &'a str,
}

fn render(name: &str, source: &str, ctx: impl Serialize) -> Result<String> {
    let mut env = Environment::new();
    env.add_template(name, source)
        .map_err(|e| Error::Parse(format!("template {name}: {e}")))?;
    let template = env
        .get_template(name)
        .map_err(|e| Error::Parse(format!("template {name}: {e}")))?;
    template
        .render(ctx)
        .map_err(|e| Error::Parse(format!("rendering {name}: {e}")))
}

/// Render the execution brief handed to the delegated execution unit.
/// `override_source` substitutes a project-local template when configured.
///
/// # Errors
/// A malformed template is `Error::Parse`.
pub fn render_brief(brief: &ExecutionBrief, override_source: Option<&str>) -> Result<String> {
    let ctx = BriefContext {
        ticket: &brief.ticket,
        branch: &brief.branch,
        worktree_path: brief.worktree_path.display().to_string(),
        skills: brief.skills.iter().map(|s| s.as_str()).collect(),
        conventions: &brief.conventions,
    };
    render("brief", override_source.unwrap_or(BRIEF_TEMPLATE), ctx)
}

/// Render the PR description for phase 4.
///
/// # Errors
/// A malformed template is `Error::Parse`.
pub fn render_pr_body(ticket: &Ticket, tracker_base_url: &str) -> Result<String> {
    render(
        "pr-body",
        PR_BODY_TEMPLATE,
        PrBodyContext {
            ticket,
            tracker_base_url,
        },
    )
}
