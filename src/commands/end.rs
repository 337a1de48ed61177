//! End pipeline: seven ordered phases, each a precondition gate for the
//! next. Any phase halts with a typed error that names what went wrong;
//! there is no silent auto-recovery anywhere in this pipeline.
//!
//! 1. identify (branch + ticket)      5. review loop (bounded at 3)
//! 2. verify tests                    6. merge and verify locally
//! 3. commit outstanding work         7. push, close, clean up
//! 4. create or reuse the PR
//!
//! Only phase 7 pushes the default branch, and only after the integration
//! suite has passed on the locally merged result. Merges and pushes are
//! never forced; conflicts and rejections halt for a human.

use chrono::Utc;
use clap::Args;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ident::{self, TicketId};
use crate::infra::git::GitCli;
use crate::infra::github::GhCli;
use crate::infra::interact::Console;
use crate::infra::review::CommandReviewer;
use crate::infra::testcmd::CommandRunner;
use crate::infra::tracker::HttpTracker;
use crate::services::{
    CodeHost, Interact, IssueTracker, Reviewer, ReviewDecision, TestChoice, TestRunner,
    VersionControl,
};
use crate::template;
use crate::ticket::{
    ClosureRecord, Finding, PullRequest, ReviewRound, RoundDecision, Ticket, TicketStatus,
};

/// Review rounds are bounded at 3, inclusive of the first pass. A constant,
/// not configuration: the bound is the contract.
pub const MAX_REVIEW_ROUNDS: u32 = 3;

#[derive(Debug, Args)]
pub struct EndArgs {
    /// Ticket reference: bare ID, tracker URL, or short number
    pub reference: Option<String>,
}

impl EndArgs {
    /// # Errors
    /// Any phase failure surfaces as a typed [`Error`](crate::error::Error)
    /// so `main` can map it to an exit code.
    pub fn execute(self) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let (config, _config_root) = Config::discover(&cwd)?;
        let vcs = GitCli::open(&cwd)?;
        let host = GhCli::new(&cwd);
        let tracker = HttpTracker::new(&config.tracker)?;
        // The branch suite verifies the tree the operator is standing in;
        // the integration suite always verifies the merged primary.
        let tests = CommandRunner::new(&config.tests, &cwd, vcs.primary_root());
        let reviewer = CommandReviewer::from_config(&config.review)?;

        let pipeline = EndPipeline {
            config: &config,
            vcs: &vcs,
            host: &host,
            tracker: &tracker,
            tests: &tests,
            reviewer: &reviewer,
            interact: &Console,
        };
        let record = pipeline.run(self.reference.as_deref())?;
        println!("{}", serde_json::to_string_pretty(&record)?);
        Ok(())
    }
}

pub struct EndPipeline<'a> {
    pub config: &'a Config,
    pub vcs: &'a dyn VersionControl,
    pub host: &'a dyn CodeHost,
    pub tracker: &'a dyn IssueTracker,
    pub tests: &'a dyn TestRunner,
    pub reviewer: &'a dyn Reviewer,
    pub interact: &'a dyn Interact,
}

impl EndPipeline<'_> {
    /// # Errors
    /// Halts with the first phase's typed error; later phases never run.
    pub fn run(&self, reference: Option<&str>) -> Result<ClosureRecord> {
        let (branch, ticket) = self.identify(reference)?;
        self.verify_tests()?;
        self.commit_outstanding(&ticket)?;
        let pr = self.create_or_reuse_pr(&branch, &ticket)?;
        let review_rounds = self.review_loop(&ticket.id, &branch, &pr)?;
        self.merge_and_verify(&branch, &ticket, &pr)?;
        self.finalize(branch, ticket, pr, review_rounds)
    }

    /// Phase 1. The protected-branch check runs before any other I/O.
    fn identify(&self, reference: Option<&str>) -> Result<(String, Ticket)> {
        let branch = self.vcs.current_branch()?;
        let default = &self.config.git.default_branch;
        if branch == *default {
            return Err(Error::WrongBranch(branch));
        }
        let prefix = self.config.project.ticket_prefix.as_deref();
        let id = match ident::resolve(reference, &branch, default, prefix) {
            Ok(id) => id,
            Err(Error::NotFound(_) | Error::AmbiguousReference { .. }) if reference.is_none() => {
                let line = self.interact.ask_ticket_reference()?;
                ident::resolve_reference(&line, prefix)?
            }
            Err(e) => return Err(e),
        };
        let ticket = self.tracker.fetch(&id)?;
        info!(%id, %branch, "identified");
        Ok((branch, ticket))
    }

    /// Phase 2. The operator chooses re-run or skip; a failing suite stops
    /// everything here.
    fn verify_tests(&self) -> Result<()> {
        if self.interact.test_choice()? == TestChoice::Skip {
            info!("test verification skipped by operator");
            return Ok(());
        }
        let outcome = self.tests.run_suite()?;
        if outcome.passed {
            Ok(())
        } else {
            Err(Error::TestsFailing {
                failures: outcome.failures,
            })
        }
    }

    /// Phase 3. A clean tree is fine; a dirty one is committed under the
    /// ticket ID. Commit failures surface, never swallowed.
    fn commit_outstanding(&self, ticket: &Ticket) -> Result<()> {
        if self.vcs.is_clean()? {
            return Ok(());
        }
        self.vcs.stage_all()?;
        self.vcs
            .commit(&format!("{}: {}", ticket.id, ticket.title))
    }

    /// Phase 4. Looks up an existing PR first so re-runs never create a
    /// second one. Link and status are recorded either way.
    fn create_or_reuse_pr(&self, branch: &str, ticket: &Ticket) -> Result<PullRequest> {
        let remote = &self.config.git.remote;
        let pr = match self.host.find_pr(branch)? {
            Some(pr) => {
                info!(pr = pr.number, "reusing existing pull request");
                pr
            }
            None => {
                self.vcs.push(remote, branch)?;
                let title = format!("{}: {}", ticket.id, ticket.title);
                let body = template::render_pr_body(ticket, &self.config.tracker.base_url)?;
                let pr = self.host.create_pr(
                    &title,
                    &body,
                    branch,
                    &self.config.git.default_branch,
                )?;
                info!(pr = pr.number, "created pull request");
                pr
            }
        };
        self.tracker.attach_link(&ticket.id, &pr.url)?;
        self.tracker.set_status(&ticket.id, TicketStatus::InReview)?;
        Ok(pr)
    }

    /// Phase 5. Each round invokes the review subroutine once. Agreeing to
    /// fix commits and pushes the fixes and counts toward the bound;
    /// dismissing proceeds to merge, optionally leaving a PR comment. A
    /// fourth round never runs.
    fn review_loop(&self, id: &TicketId, branch: &str, pr: &PullRequest) -> Result<u32> {
        let mut rounds: Vec<ReviewRound> = Vec::new();
        for ordinal in 1..=MAX_REVIEW_ROUNDS {
            let findings = self.reviewer.review(pr)?;
            if findings.is_empty() {
                info!(round = ordinal, "review clean");
                rounds.push(ReviewRound {
                    ordinal,
                    findings,
                    decision: RoundDecision::NoIssues,
                });
                break;
            }
            match self.interact.review_decision(ordinal, &findings)? {
                ReviewDecision::Dismiss => {
                    if self.config.review.dismiss_note {
                        self.host.comment(pr, &dismissal_note(ordinal, &findings))?;
                    }
                    warn!(round = ordinal, count = findings.len(), "findings dismissed");
                    rounds.push(ReviewRound {
                        ordinal,
                        findings,
                        decision: RoundDecision::IssuesDismissed,
                    });
                    break;
                }
                ReviewDecision::Fix => {
                    if ordinal == MAX_REVIEW_ROUNDS {
                        return Err(Error::ReviewLimitReached {
                            rounds: MAX_REVIEW_ROUNDS,
                        });
                    }
                    // The fixes are in the tree by the time the operator
                    // answers; land them and go around again.
                    if !self.vcs.is_clean()? {
                        self.vcs.stage_all()?;
                        self.vcs
                            .commit(&format!("{id}: address review round {ordinal}"))?;
                    }
                    self.vcs.push(&self.config.git.remote, branch)?;
                    rounds.push(ReviewRound {
                        ordinal,
                        findings,
                        decision: RoundDecision::IssuesFixed,
                    });
                }
            }
        }
        Ok(rounds.last().map_or(0, |round| round.ordinal))
    }

    /// Phase 6. The squash-merge and the integration suite both happen
    /// locally; the remote default branch is untouched until phase 7. On
    /// integration failure the local default branch is reset to the remote
    /// tip recorded before the merge, byte-for-byte.
    fn merge_and_verify(&self, branch: &str, ticket: &Ticket, pr: &PullRequest) -> Result<()> {
        let remote = &self.config.git.remote;
        let default = &self.config.git.default_branch;
        self.vcs.checkout(default)?;
        self.vcs.pull(remote, default)?;
        let remote_tip = self.vcs.rev_parse(&format!("{remote}/{default}"))?;

        let staged = match self.vcs.squash_merge(branch) {
            Ok(staged) => staged,
            Err(err) => {
                if matches!(err, Error::MergeConflict { .. }) {
                    self.vcs.abort_merge()?;
                    self.vcs.checkout(branch)?;
                }
                return Err(err);
            }
        };
        if !staged {
            self.vcs.checkout(branch)?;
            return Err(Error::Precondition(format!(
                "squash merge of '{branch}' staged no changes; the branch \
                 appears to be merged already"
            )));
        }
        self.vcs.remove_path(&self.config.plan_artifact)?;
        self.vcs.commit_primary(&format!(
            "{}: {} (#{})",
            ticket.id, ticket.title, pr.number
        ))?;

        let outcome = self.tests.run_integration()?;
        if outcome.passed {
            return Ok(());
        }
        warn!("integration failed on merged result; rolling back");
        self.vcs.reset_hard(&remote_tip)?;
        self.vcs.checkout(branch)?;
        Err(Error::IntegrationFailing {
            failures: outcome.failures,
        })
    }

    /// Phase 7. Pushing the default branch is what lands the merge and
    /// closes the PR; a rejection halts before any deletion so nothing is
    /// cleaned up for a merge that did not land.
    fn finalize(
        &self,
        branch: String,
        ticket: Ticket,
        pr: PullRequest,
        review_rounds: u32,
    ) -> Result<ClosureRecord> {
        let remote = &self.config.git.remote;
        self.vcs.push(remote, &self.config.git.default_branch)?;
        self.vcs.delete_remote_branch(remote, &branch)?;
        self.tracker.set_status(&ticket.id, TicketStatus::Done)?;

        let worktree = self.vcs.worktree_for(&branch)?;
        let worktree_removed = worktree.is_some();
        if let Some(path) = worktree {
            self.vcs.remove_worktree(&path)?;
        }
        self.vcs.delete_branch(&branch)?;

        info!(%branch, pr = pr.number, "closed");
        Ok(ClosureRecord {
            ticket: ticket.id,
            pr_number: pr.number,
            pr_url: pr.url,
            merged_at: Utc::now(),
            review_rounds,
            branch_deleted: true,
            worktree_removed,
        })
    }
}

fn dismissal_note(round: u32, findings: &[Finding]) -> String {
    let mut note = format!("Merging with review round {round} findings dismissed:\n");
    for finding in findings {
        note.push_str(&format!(
            "- [severity {}] {}\n",
            finding.severity, finding.summary
        ));
    }
    note
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dismissal_note_lists_findings() {
        let findings = vec![
            Finding {
                summary: "missing test".into(),
                severity: 4,
            },
            Finding {
                summary: "typo in docs".into(),
                severity: 1,
            },
        ];
        let note = dismissal_note(3, &findings);
        assert!(note.contains("round 3"));
        assert!(note.contains("[severity 4] missing test"));
        assert!(note.contains("[severity 1] typo in docs"));
    }
}
