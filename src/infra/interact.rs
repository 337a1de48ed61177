//! Console adapter for the human suspension points, using dialoguer.

use crate::classify::Skill;
use crate::error::{Error, Result};
use crate::services::{Confirmation, Interact, ReviewDecision, TestChoice};
use crate::ticket::{Finding, StartPlan};

pub struct Console;

fn prompt_err(e: dialoguer::Error) -> Error {
    Error::Io(std::io::Error::other(e))
}

fn confirm(prompt: &str, default: bool) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(prompt_err)
}

fn input(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut builder = dialoguer::Input::<String>::new().with_prompt(prompt);
    if let Some(d) = default {
        builder = builder.default(d.to_string());
    }
    builder.interact_text().map_err(prompt_err)
}

fn parse_skills(line: &str) -> Result<Vec<Skill>> {
    line.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Skill::parse(s).ok_or_else(|| Error::Parse(format!("unknown skill {s:?}")))
        })
        .collect()
}

fn render_skills(skills: &[Skill]) -> String {
    skills
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Interact for Console {
    fn confirm_start(&self, plan: &StartPlan) -> Result<Confirmation> {
        println!("{}: {}", plan.ticket.id, plan.ticket.title);
        println!("  kind:     {}", plan.kind.as_str());
        println!("  branch:   {}", plan.branch);
        println!("  worktree: {}", plan.worktree_path.display());
        println!("  skills:   {}", render_skills(&plan.skills));

        if !confirm("Proceed with this plan?", true)? {
            return Ok(Confirmation::Declined);
        }
        let skills = if confirm("Adjust the skill sequence?", false)? {
            let line = input(
                "Skills (comma-separated)",
                Some(&render_skills(&plan.skills)),
            )?;
            parse_skills(&line)?
        } else {
            plan.skills.clone()
        };
        Ok(Confirmation::Approved { skills })
    }

    fn test_choice(&self) -> Result<TestChoice> {
        if confirm("Run the test suite before opening a PR?", true)? {
            Ok(TestChoice::Run)
        } else {
            Ok(TestChoice::Skip)
        }
    }

    fn review_decision(&self, round: u32, findings: &[Finding]) -> Result<ReviewDecision> {
        println!("Review round {round} found {} issue(s):", findings.len());
        for finding in findings {
            println!("  [{}] {}", finding.severity, finding.summary);
        }
        let choice = dialoguer::Select::new()
            .with_prompt("How do you want to proceed?")
            .items(&["fix and re-review", "dismiss and merge"])
            .default(0)
            .interact()
            .map_err(prompt_err)?;
        Ok(if choice == 0 {
            ReviewDecision::Fix
        } else {
            ReviewDecision::Dismiss
        })
    }

    fn ask_ticket_reference(&self) -> Result<String> {
        input("Ticket reference (ID, URL, or number)", None)
    }
}
