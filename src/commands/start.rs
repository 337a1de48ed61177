//! Start pipeline: resolve a ticket, classify it, provision an isolated
//! worktree, and delegate execution with full context.
//!
//! The machine is `FetchingTicket -> Classifying -> AwaitingConfirmation ->
//! Provisioning -> Delegating -> Done`, with failure reachable from every
//! state. Confirmation is a mandatory suspension point: nothing is
//! provisioned before the operator approves, and declining performs no
//! side effect at all. This pipeline never commits, never mutates ticket
//! status; it ends by reporting the delegated unit's outcome.

use std::path::Path;

use clap::Args;
use tracing::info;

use crate::classify;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::ident;
use crate::infra::agent::AgentProcess;
use crate::infra::git::GitCli;
use crate::infra::interact::Console;
use crate::infra::tracker::HttpTracker;
use crate::services::{Confirmation, Delegate, Interact, IssueTracker, VersionControl};
use crate::ticket::{DelegationOutcome, ExecutionBrief, StartPlan, Ticket};
use crate::worktree::{self, WorktreePlan};

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Ticket reference: bare ID, tracker URL, or short number
    pub reference: Option<String>,
}

impl StartArgs {
    /// # Errors
    /// Any pipeline failure surfaces as a typed
    /// [`Error`](crate::error::Error) so `main` can map it to an exit code.
    pub fn execute(self) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let (config, _config_root) = Config::discover(&cwd)?;
        let vcs = GitCli::open(&cwd)?;
        let repo_root = vcs.primary_root().to_path_buf();
        let tracker = HttpTracker::new(&config.tracker)?;
        let delegate = AgentProcess::from_config(&config.agent)?;

        let pipeline = StartPipeline {
            config: &config,
            repo_root: &repo_root,
            vcs: &vcs,
            tracker: &tracker,
            interact: &Console,
            delegate: &delegate,
        };
        match pipeline.run(self.reference.as_deref())? {
            StartOutcome::Delegated { branch, outcome } => {
                if outcome.success {
                    println!("delegated work on {branch} completed");
                } else {
                    println!("delegated work on {branch} reported failure");
                }
                if !outcome.summary.is_empty() {
                    println!("{}", outcome.summary);
                }
            }
            StartOutcome::Declined => println!("declined; nothing was created"),
        }
        Ok(())
    }
}

/// Terminal result of a start run. Failures are `Err` from `run`.
#[derive(Debug)]
pub enum StartOutcome {
    Delegated {
        branch: String,
        outcome: DelegationOutcome,
    },
    Declined,
}

enum StartState {
    FetchingTicket,
    Classifying(Ticket),
    AwaitingConfirmation(StartPlan),
    Provisioning(StartPlan),
    Delegating(ExecutionBrief),
    Done(StartOutcome),
}

pub struct StartPipeline<'a> {
    pub config: &'a Config,
    /// Primary checkout root; worktrees are placed relative to it.
    pub repo_root: &'a Path,
    pub vcs: &'a dyn VersionControl,
    pub tracker: &'a dyn IssueTracker,
    pub interact: &'a dyn Interact,
    pub delegate: &'a dyn Delegate,
}

impl StartPipeline<'_> {
    /// # Errors
    /// Halts with the failing state's typed error; a decline is `Ok`.
    pub fn run(&self, reference: Option<&str>) -> Result<StartOutcome> {
        let mut state = StartState::FetchingTicket;
        loop {
            state = match state {
                StartState::FetchingTicket => {
                    StartState::Classifying(self.fetch_ticket(reference)?)
                }
                StartState::Classifying(ticket) => {
                    StartState::AwaitingConfirmation(self.plan(ticket))
                }
                StartState::AwaitingConfirmation(plan) => {
                    match self.interact.confirm_start(&plan)? {
                        Confirmation::Approved { skills } => {
                            let mut plan = plan;
                            plan.skills = skills;
                            StartState::Provisioning(plan)
                        }
                        Confirmation::Declined => StartState::Done(StartOutcome::Declined),
                    }
                }
                StartState::Provisioning(plan) => StartState::Delegating(self.provision(plan)?),
                StartState::Delegating(brief) => {
                    let outcome = self.delegate.execute(&brief)?;
                    StartState::Done(StartOutcome::Delegated {
                        branch: brief.branch,
                        outcome,
                    })
                }
                StartState::Done(outcome) => return Ok(outcome),
            };
        }
    }

    fn fetch_ticket(&self, reference: Option<&str>) -> Result<Ticket> {
        let prefix = self.config.project.ticket_prefix.as_deref();
        let current = self.vcs.current_branch()?;
        let id = match ident::resolve(
            reference,
            &current,
            &self.config.git.default_branch,
            prefix,
        ) {
            Ok(id) => id,
            Err(Error::NotFound(_) | Error::AmbiguousReference { .. }) if reference.is_none() => {
                let line = self.interact.ask_ticket_reference()?;
                ident::resolve_reference(&line, prefix)?
            }
            Err(e) => return Err(e),
        };
        info!(%id, "fetching ticket");
        self.tracker.fetch(&id)
    }

    fn plan(&self, ticket: Ticket) -> StartPlan {
        let text = ticket.text();
        let kind = classify::classify(&ticket.labels, &text);
        let clarity = classify::assess_clarity(kind, &text);
        let skills = classify::recommend_skills(kind, clarity);
        let branch = classify::branch_name(kind, &ticket.id, &ticket.title);
        let wt_plan = WorktreePlan::new(self.config, self.repo_root, &ticket.id, branch.clone());
        StartPlan {
            ticket,
            kind,
            branch,
            worktree_path: wt_plan.path,
            skills,
        }
    }

    fn provision(&self, plan: StartPlan) -> Result<ExecutionBrief> {
        let wt_plan = WorktreePlan::new(
            self.config,
            self.repo_root,
            &plan.ticket.id,
            plan.branch.clone(),
        );
        worktree::provision(self.vcs, &self.config.git.remote, &wt_plan)?;
        info!(branch = %wt_plan.branch, path = %wt_plan.path.display(), "provisioned");
        Ok(ExecutionBrief {
            ticket: plan.ticket,
            branch: plan.branch,
            worktree_path: wt_plan.path,
            skills: plan.skills,
            conventions: self.config.project.conventions.clone(),
        })
    }
}
