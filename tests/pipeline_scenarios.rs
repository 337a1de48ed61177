//! End-to-end pipeline scenarios over scripted fakes.
//!
//! The fakes model just enough git/host/tracker state to observe what the
//! pipelines did: branch tips move on commit and push, the remote is a
//! separate map, PRs and status updates are recorded.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use tkt::commands::end::{EndPipeline, MAX_REVIEW_ROUNDS};
use tkt::commands::start::{StartOutcome, StartPipeline};
use tkt::config::Config;
use tkt::error::{Error, Result};
use tkt::ident::TicketId;
use tkt::services::{
    CodeHost, Confirmation, Delegate, Interact, IssueTracker, ReviewDecision, Reviewer,
    SuiteOutcome, TestChoice, TestRunner, VersionControl,
};
use tkt::ticket::{
    DelegationOutcome, ExecutionBrief, Finding, PullRequest, StartPlan, Ticket, TicketStatus,
};

// --- Fakes ---

#[derive(Default)]
struct FakeVcs {
    current: RefCell<String>,
    /// branch -> tip sha
    branches: RefCell<HashMap<String, String>>,
    /// branch -> tip sha on the remote
    remote: RefCell<HashMap<String, String>>,
    /// branch -> worktree path
    worktrees: RefCell<HashMap<String, PathBuf>>,
    dirty: Cell<bool>,
    conflict_files: RefCell<Vec<String>>,
    /// Models squashing a branch whose changes are all merged already.
    squash_stages_nothing: Cell<bool>,
    next_sha: Cell<u32>,
    fetches: Cell<u32>,
    pushes: RefCell<Vec<String>>,
    removed_paths: RefCell<Vec<String>>,
    added_worktrees: RefCell<Vec<String>>,
}

impl FakeVcs {
    fn new(current: &str, branches: &[(&str, &str)], remote: &[(&str, &str)]) -> Self {
        let vcs = Self {
            current: RefCell::new(current.to_string()),
            next_sha: Cell::new(100),
            ..Self::default()
        };
        for (branch, sha) in branches {
            vcs.branches
                .borrow_mut()
                .insert((*branch).to_string(), (*sha).to_string());
        }
        for (branch, sha) in remote {
            vcs.remote
                .borrow_mut()
                .insert((*branch).to_string(), (*sha).to_string());
        }
        vcs
    }

    fn fresh_sha(&self) -> String {
        let n = self.next_sha.get();
        self.next_sha.set(n + 1);
        format!("c{n}")
    }

    fn tip(&self, branch: &str) -> String {
        self.branches.borrow()[branch].clone()
    }

    fn remote_tip(&self, branch: &str) -> Option<String> {
        self.remote.borrow().get(branch).cloned()
    }
}

impl VersionControl for FakeVcs {
    fn current_branch(&self) -> Result<String> {
        Ok(self.current.borrow().clone())
    }

    fn fetch(&self, _remote: &str) -> Result<()> {
        self.fetches.set(self.fetches.get() + 1);
        Ok(())
    }

    fn branch_exists(&self, branch: &str) -> Result<bool> {
        Ok(self.branches.borrow().contains_key(branch))
    }

    fn is_primary_checkout(&self) -> Result<bool> {
        Ok(true)
    }

    fn add_worktree(&self, path: &Path, branch: &str, base: &str) -> Result<()> {
        let base_branch = base.split_once('/').map_or(base, |(_, b)| b);
        let tip = self
            .remote_tip(base_branch)
            .unwrap_or_else(|| "c0".to_string());
        self.branches
            .borrow_mut()
            .insert(branch.to_string(), tip);
        self.worktrees
            .borrow_mut()
            .insert(branch.to_string(), path.to_path_buf());
        self.added_worktrees.borrow_mut().push(branch.to_string());
        Ok(())
    }

    fn remove_worktree(&self, path: &Path) -> Result<()> {
        self.worktrees.borrow_mut().retain(|_, p| p != path);
        Ok(())
    }

    fn worktree_for(&self, branch: &str) -> Result<Option<PathBuf>> {
        Ok(self.worktrees.borrow().get(branch).cloned())
    }

    fn is_clean(&self) -> Result<bool> {
        Ok(!self.dirty.get())
    }

    fn stage_all(&self) -> Result<()> {
        Ok(())
    }

    fn commit(&self, _message: &str) -> Result<()> {
        let sha = self.fresh_sha();
        let current = self.current.borrow().clone();
        self.branches.borrow_mut().insert(current, sha);
        self.dirty.set(false);
        Ok(())
    }

    fn commit_primary(&self, message: &str) -> Result<()> {
        self.commit(message)
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        if self.worktrees.borrow().contains_key(branch) {
            return Ok(());
        }
        *self.current.borrow_mut() = branch.to_string();
        Ok(())
    }

    fn pull(&self, _remote: &str, branch: &str) -> Result<()> {
        if let Some(tip) = self.remote_tip(branch) {
            self.branches.borrow_mut().insert(branch.to_string(), tip);
        }
        Ok(())
    }

    fn squash_merge(&self, _branch: &str) -> Result<bool> {
        let files = self.conflict_files.borrow().clone();
        if !files.is_empty() {
            return Err(Error::MergeConflict { files });
        }
        if self.squash_stages_nothing.get() {
            return Ok(false);
        }
        self.dirty.set(true);
        Ok(true)
    }

    fn abort_merge(&self) -> Result<()> {
        self.dirty.set(false);
        Ok(())
    }

    fn reset_hard(&self, reference: &str) -> Result<()> {
        let current = self.current.borrow().clone();
        self.branches
            .borrow_mut()
            .insert(current, reference.to_string());
        self.dirty.set(false);
        Ok(())
    }

    fn remove_path(&self, path: &str) -> Result<()> {
        self.removed_paths.borrow_mut().push(path.to_string());
        Ok(())
    }

    fn push(&self, _remote: &str, branch: &str) -> Result<()> {
        let tip = self.tip(branch);
        self.remote.borrow_mut().insert(branch.to_string(), tip);
        self.pushes.borrow_mut().push(branch.to_string());
        Ok(())
    }

    fn delete_remote_branch(&self, _remote: &str, branch: &str) -> Result<()> {
        self.remote.borrow_mut().remove(branch);
        Ok(())
    }

    fn delete_branch(&self, branch: &str) -> Result<()> {
        self.branches.borrow_mut().remove(branch);
        Ok(())
    }

    fn rev_parse(&self, reference: &str) -> Result<String> {
        if let Some((_, branch)) = reference.split_once('/') {
            if let Some(tip) = self.remote_tip(branch) {
                return Ok(tip);
            }
        }
        if let Some(tip) = self.branches.borrow().get(reference) {
            return Ok(tip.clone());
        }
        Ok(reference.to_string())
    }
}

#[derive(Default)]
struct FakeHost {
    existing: RefCell<Vec<PullRequest>>,
    created: Cell<u32>,
    comments: RefCell<Vec<String>>,
}

impl CodeHost for FakeHost {
    fn find_pr(&self, branch: &str) -> Result<Option<PullRequest>> {
        Ok(self
            .existing
            .borrow()
            .iter()
            .find(|pr| pr.branch == branch)
            .cloned())
    }

    fn create_pr(
        &self,
        _title: &str,
        _body: &str,
        branch: &str,
        _base: &str,
    ) -> Result<PullRequest> {
        self.created.set(self.created.get() + 1);
        let pr = PullRequest {
            number: 100 + u64::from(self.created.get()),
            url: format!("https://example.com/pr/{}", 100 + self.created.get()),
            branch: branch.to_string(),
        };
        self.existing.borrow_mut().push(pr.clone());
        Ok(pr)
    }

    fn comment(&self, _pr: &PullRequest, body: &str) -> Result<()> {
        self.comments.borrow_mut().push(body.to_string());
        Ok(())
    }
}

struct FakeTracker {
    ticket: Ticket,
    fetches: Cell<u32>,
    statuses: RefCell<Vec<TicketStatus>>,
    links: RefCell<Vec<String>>,
}

impl FakeTracker {
    fn new(ticket: Ticket) -> Self {
        Self {
            ticket,
            fetches: Cell::new(0),
            statuses: RefCell::new(Vec::new()),
            links: RefCell::new(Vec::new()),
        }
    }
}

impl IssueTracker for FakeTracker {
    fn fetch(&self, id: &TicketId) -> Result<Ticket> {
        self.fetches.set(self.fetches.get() + 1);
        if *id == self.ticket.id {
            Ok(self.ticket.clone())
        } else {
            Err(Error::NotFound(format!("ticket {id}")))
        }
    }

    fn set_status(&self, _id: &TicketId, status: TicketStatus) -> Result<()> {
        self.statuses.borrow_mut().push(status);
        Ok(())
    }

    fn attach_link(&self, _id: &TicketId, url: &str) -> Result<()> {
        self.links.borrow_mut().push(url.to_string());
        Ok(())
    }
}

struct FakeTests {
    suite_passes: bool,
    integration_passes: bool,
    suite_runs: Cell<u32>,
    integration_runs: Cell<u32>,
}

impl FakeTests {
    fn passing() -> Self {
        Self {
            suite_passes: true,
            integration_passes: true,
            suite_runs: Cell::new(0),
            integration_runs: Cell::new(0),
        }
    }
}

impl TestRunner for FakeTests {
    fn run_suite(&self) -> Result<SuiteOutcome> {
        self.suite_runs.set(self.suite_runs.get() + 1);
        Ok(outcome(self.suite_passes))
    }

    fn run_integration(&self) -> Result<SuiteOutcome> {
        self.integration_runs.set(self.integration_runs.get() + 1);
        Ok(outcome(self.integration_passes))
    }
}

fn outcome(passed: bool) -> SuiteOutcome {
    SuiteOutcome {
        passed,
        failures: if passed {
            vec![]
        } else {
            vec!["test_the_thing".to_string()]
        },
    }
}

#[derive(Default)]
struct FakeReviewer {
    /// Findings handed out per round, front first. An exhausted script
    /// means the loop ran more rounds than the test allowed.
    rounds: RefCell<VecDeque<Vec<Finding>>>,
    calls: Cell<u32>,
}

impl FakeReviewer {
    fn scripted(rounds: Vec<Vec<Finding>>) -> Self {
        Self {
            rounds: RefCell::new(rounds.into()),
            calls: Cell::new(0),
        }
    }
}

impl Reviewer for FakeReviewer {
    fn review(&self, _pr: &PullRequest) -> Result<Vec<Finding>> {
        self.calls.set(self.calls.get() + 1);
        self.rounds
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Precondition("review invoked past the scripted rounds".into()))
    }
}

struct FakeInteract {
    confirmation: RefCell<Option<Confirmation>>,
    test_choice: TestChoice,
    review_decisions: RefCell<VecDeque<ReviewDecision>>,
}

impl FakeInteract {
    fn approving() -> Self {
        Self {
            confirmation: RefCell::new(None),
            test_choice: TestChoice::Run,
            review_decisions: RefCell::new(VecDeque::new()),
        }
    }

    fn with_decisions(decisions: Vec<ReviewDecision>) -> Self {
        Self {
            review_decisions: RefCell::new(decisions.into()),
            ..Self::approving()
        }
    }
}

impl Interact for FakeInteract {
    fn confirm_start(&self, plan: &StartPlan) -> Result<Confirmation> {
        Ok(self
            .confirmation
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Confirmation::Approved {
                skills: plan.skills.clone(),
            }))
    }

    fn test_choice(&self) -> Result<TestChoice> {
        Ok(self.test_choice)
    }

    fn review_decision(&self, _round: u32, _findings: &[Finding]) -> Result<ReviewDecision> {
        self.review_decisions
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Precondition("decision requested past the script".into()))
    }

    fn ask_ticket_reference(&self) -> Result<String> {
        Ok("NOV-50".to_string())
    }
}

struct FakeDelegate {
    briefs: RefCell<Vec<ExecutionBrief>>,
}

impl Delegate for FakeDelegate {
    fn execute(&self, brief: &ExecutionBrief) -> Result<DelegationOutcome> {
        self.briefs.borrow_mut().push(brief.clone());
        Ok(DelegationOutcome {
            success: true,
            summary: "done".to_string(),
        })
    }
}

// --- Fixtures ---

fn config() -> Config {
    toml::from_str(
        r#"
        version = "1"

        [project]
        name = "novel"
        ticket_prefix = "NOV"
        conventions = ["run the formatter before committing"]

        [tracker]
        base_url = "https://tracker.example.com/api"
        "#,
    )
    .unwrap()
}

fn nov_50() -> Ticket {
    Ticket {
        id: tkt::ident::resolve_reference("NOV-50", None).unwrap(),
        title: "null check".to_string(),
        description: "Stack trace points at the parser. Reproduced on empty input.".to_string(),
        labels: vec!["bug".to_string()],
        priority: Some("high".to_string()),
        status: TicketStatus::InProgress,
        comments: vec![],
    }
}

const FEATURE_BRANCH: &str = "fix/NOV-50-null-check";

struct EndFixture {
    config: Config,
    vcs: FakeVcs,
    host: FakeHost,
    tracker: FakeTracker,
    tests: FakeTests,
    reviewer: FakeReviewer,
    interact: FakeInteract,
}

impl EndFixture {
    fn new() -> Self {
        Self {
            config: config(),
            vcs: FakeVcs::new(
                FEATURE_BRANCH,
                &[("main", "c1"), (FEATURE_BRANCH, "c2")],
                &[("main", "c1"), (FEATURE_BRANCH, "c2")],
            ),
            host: FakeHost::default(),
            tracker: FakeTracker::new(nov_50()),
            tests: FakeTests::passing(),
            reviewer: FakeReviewer::scripted(vec![vec![]]),
            interact: FakeInteract::approving(),
        }
    }

    fn run(&self) -> Result<tkt::ticket::ClosureRecord> {
        EndPipeline {
            config: &self.config,
            vcs: &self.vcs,
            host: &self.host,
            tracker: &self.tracker,
            tests: &self.tests,
            reviewer: &self.reviewer,
            interact: &self.interact,
        }
        .run(None)
    }
}

fn finding(summary: &str) -> Finding {
    Finding {
        summary: summary.to_string(),
        severity: 5,
    }
}

// --- End pipeline scenarios ---

#[test]
fn scenario_a_fresh_pr_happy_path() {
    let fx = EndFixture::new();
    fx.vcs
        .worktrees
        .borrow_mut()
        .insert(FEATURE_BRANCH.to_string(), PathBuf::from("/work/NOV-50"));

    let record = fx.run().unwrap();

    assert_eq!(fx.host.created.get(), 1);
    assert_eq!(record.pr_number, 101);
    assert_eq!(record.review_rounds, 1);
    assert!(record.branch_deleted);
    assert!(record.worktree_removed);
    assert_eq!(
        *fx.tracker.statuses.borrow(),
        vec![TicketStatus::InReview, TicketStatus::Done]
    );
    assert_eq!(fx.tracker.links.borrow().len(), 1);
    // feature branch is gone locally and remotely; worktree released
    assert!(!fx.vcs.branches.borrow().contains_key(FEATURE_BRANCH));
    assert!(fx.vcs.remote_tip(FEATURE_BRANCH).is_none());
    assert!(fx.vcs.worktrees.borrow().is_empty());
    // the merged result landed on the remote default branch
    assert_eq!(fx.vcs.remote_tip("main").unwrap(), fx.vcs.tip("main"));
    assert_ne!(fx.vcs.remote_tip("main").unwrap(), "c1");
    // plan artifact was scrubbed before the merge commit
    assert_eq!(*fx.vcs.removed_paths.borrow(), vec![".tkt-plan.md".to_string()]);
}

#[test]
fn scenario_b_existing_pr_is_reused() {
    let fx = EndFixture::new();
    fx.host.existing.borrow_mut().push(PullRequest {
        number: 77,
        url: "https://example.com/pr/77".to_string(),
        branch: FEATURE_BRANCH.to_string(),
    });

    let record = fx.run().unwrap();

    assert_eq!(fx.host.created.get(), 0);
    assert_eq!(record.pr_number, 77);
    assert_eq!(
        fx.tracker.links.borrow().as_slice(),
        ["https://example.com/pr/77"]
    );
}

#[test]
fn scenario_c_dismissal_on_third_round_merges_after_exactly_three() {
    let mut fx = EndFixture::new();
    fx.reviewer = FakeReviewer::scripted(vec![
        vec![finding("round one")],
        vec![finding("round two")],
        vec![finding("round three")],
    ]);
    fx.interact = FakeInteract::with_decisions(vec![
        ReviewDecision::Fix,
        ReviewDecision::Fix,
        ReviewDecision::Dismiss,
    ]);

    let record = fx.run().unwrap();

    assert_eq!(fx.reviewer.calls.get(), 3);
    assert_eq!(record.review_rounds, 3);
    // the dismissal was recorded on the PR
    let comments = fx.host.comments.borrow();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].contains("round three"));
    // merge landed
    assert_eq!(*fx.tracker.statuses.borrow().last().unwrap(), TicketStatus::Done);
}

#[test]
fn review_loop_never_runs_a_fourth_round() {
    let mut fx = EndFixture::new();
    fx.reviewer = FakeReviewer::scripted(vec![
        vec![finding("one")],
        vec![finding("two")],
        vec![finding("three")],
    ]);
    fx.interact = FakeInteract::with_decisions(vec![
        ReviewDecision::Fix,
        ReviewDecision::Fix,
        ReviewDecision::Fix,
    ]);

    let err = fx.run().unwrap_err();

    assert!(matches!(
        err,
        Error::ReviewLimitReached {
            rounds: MAX_REVIEW_ROUNDS
        }
    ));
    assert_eq!(fx.reviewer.calls.get(), 3);
    // PR left unmerged: no push of main, no Done status, branch intact
    assert!(!fx.vcs.pushes.borrow().contains(&"main".to_string()));
    assert!(!fx.tracker.statuses.borrow().contains(&TicketStatus::Done));
    assert!(fx.vcs.branches.borrow().contains_key(FEATURE_BRANCH));
}

#[test]
fn scenario_d_integration_failure_rolls_back_byte_for_byte() {
    let mut fx = EndFixture::new();
    fx.tests.integration_passes = false;
    let remote_tip_before = fx.vcs.remote_tip("main").unwrap();

    let err = fx.run().unwrap_err();

    assert!(matches!(err, Error::IntegrationFailing { .. }));
    // local default branch equals the remote tip recorded before the merge
    assert_eq!(fx.vcs.tip("main"), remote_tip_before);
    // remote default branch was never pushed
    assert_eq!(fx.vcs.remote_tip("main").unwrap(), remote_tip_before);
    assert!(!fx.vcs.pushes.borrow().contains(&"main".to_string()));
    // feature branch still holds its commits and we are back on it
    assert_eq!(fx.vcs.tip(FEATURE_BRANCH), "c2");
    assert_eq!(*fx.vcs.current.borrow(), FEATURE_BRANCH);
    assert!(!fx.tracker.statuses.borrow().contains(&TicketStatus::Done));
}

#[test]
fn merge_conflict_aborts_and_returns_to_the_feature_branch() {
    let fx = EndFixture::new();
    fx.vcs
        .conflict_files
        .borrow_mut()
        .push("src/parser.rs".to_string());

    let err = fx.run().unwrap_err();

    match err {
        Error::MergeConflict { files } => assert_eq!(files, vec!["src/parser.rs".to_string()]),
        other => panic!("expected MergeConflict, got {other:?}"),
    }
    assert!(fx.vcs.is_clean().unwrap());
    assert_eq!(*fx.vcs.current.borrow(), FEATURE_BRANCH);
    assert!(!fx.vcs.pushes.borrow().contains(&"main".to_string()));
}

#[test]
fn failing_suite_halts_before_any_commit_or_pr() {
    let mut fx = EndFixture::new();
    fx.tests.suite_passes = false;
    fx.vcs.dirty.set(true);

    let err = fx.run().unwrap_err();

    assert!(matches!(err, Error::TestsFailing { .. }));
    assert_eq!(fx.host.created.get(), 0);
    assert!(fx.vcs.dirty.get());
    assert!(fx.vcs.pushes.borrow().is_empty());
    assert!(fx.tracker.statuses.borrow().is_empty());
}

#[test]
fn end_on_default_branch_halts_with_no_side_effects() {
    let fx = EndFixture::new();
    *fx.vcs.current.borrow_mut() = "main".to_string();

    let err = fx.run().unwrap_err();

    assert!(matches!(err, Error::WrongBranch(branch) if branch == "main"));
    assert_eq!(fx.tracker.fetches.get(), 0);
    assert_eq!(fx.tests.suite_runs.get(), 0);
    assert_eq!(fx.host.created.get(), 0);
    assert!(fx.vcs.pushes.borrow().is_empty());
}

#[test]
fn dirty_tree_is_committed_under_the_ticket_id() {
    let fx = EndFixture::new();
    fx.vcs.dirty.set(true);

    fx.run().unwrap();

    assert!(!fx.vcs.dirty.get());
    // the commit moved the feature branch tip before the push
    assert!(fx.vcs.pushes.borrow().contains(&FEATURE_BRANCH.to_string()));
}

#[test]
fn empty_squash_halts_without_committing_or_pushing_main() {
    let fx = EndFixture::new();
    fx.vcs.squash_stages_nothing.set(true);

    let err = fx.run().unwrap_err();

    assert!(matches!(err, Error::Precondition(msg) if msg.contains("staged no changes")));
    // back on the feature branch; the default branch never moved
    assert_eq!(*fx.vcs.current.borrow(), FEATURE_BRANCH);
    assert_eq!(fx.vcs.tip("main"), "c1");
    assert!(!fx.vcs.pushes.borrow().contains(&"main".to_string()));
    assert!(!fx.tracker.statuses.borrow().contains(&TicketStatus::Done));
    assert!(fx.vcs.removed_paths.borrow().is_empty());
    assert!(fx.vcs.branches.borrow().contains_key(FEATURE_BRANCH));
}

#[test]
fn skipping_tests_still_proceeds_to_merge() {
    let mut fx = EndFixture::new();
    fx.interact.test_choice = TestChoice::Skip;

    fx.run().unwrap();

    assert_eq!(fx.tests.suite_runs.get(), 0);
    assert_eq!(fx.tests.integration_runs.get(), 1);
}

// --- Start pipeline scenarios ---

struct StartFixture {
    config: Config,
    repo_root: tempfile::TempDir,
    vcs: FakeVcs,
    tracker: FakeTracker,
    interact: FakeInteract,
    delegate: FakeDelegate,
}

impl StartFixture {
    fn new() -> Self {
        let mut config = config();
        // keep planned worktree paths inside the test directory
        config.git.worktree_root = "worktrees".to_string();
        Self {
            config,
            repo_root: tempfile::tempdir().unwrap(),
            vcs: FakeVcs::new("main", &[("main", "c1")], &[("main", "c1")]),
            tracker: FakeTracker::new(nov_50()),
            interact: FakeInteract::approving(),
            delegate: FakeDelegate {
                briefs: RefCell::new(Vec::new()),
            },
        }
    }

    fn run(&self, reference: Option<&str>) -> Result<StartOutcome> {
        StartPipeline {
            config: &self.config,
            repo_root: self.repo_root.path(),
            vcs: &self.vcs,
            tracker: &self.tracker,
            interact: &self.interact,
            delegate: &self.delegate,
        }
        .run(reference)
    }
}

#[test]
fn start_provisions_and_delegates_with_full_context() {
    let fx = StartFixture::new();

    let outcome = fx.run(Some("NOV-50")).unwrap();

    assert!(matches!(outcome, StartOutcome::Delegated { .. }));
    assert_eq!(fx.vcs.fetches.get(), 1);
    assert_eq!(
        *fx.vcs.added_worktrees.borrow(),
        vec![FEATURE_BRANCH.to_string()]
    );
    let briefs = fx.delegate.briefs.borrow();
    assert_eq!(briefs.len(), 1);
    let brief = &briefs[0];
    assert_eq!(brief.branch, FEATURE_BRANCH);
    assert!(brief.worktree_path.ends_with("NOV-50"));
    assert_eq!(
        brief.conventions,
        vec!["run the formatter before committing".to_string()]
    );
    // a bug with a stack trace and repro is a clear fix
    assert_eq!(
        brief.skills,
        vec![tkt::classify::Skill::TestDrivenFix]
    );
    // this pipeline never touches ticket status
    assert!(fx.tracker.statuses.borrow().is_empty());
}

#[test]
fn start_accepts_adjusted_skills_from_confirmation() {
    let fx = StartFixture::new();
    *fx.interact.confirmation.borrow_mut() = Some(Confirmation::Approved {
        skills: vec![tkt::classify::Skill::Exploration],
    });

    fx.run(Some("NOV-50")).unwrap();

    let briefs = fx.delegate.briefs.borrow();
    assert_eq!(briefs[0].skills, vec![tkt::classify::Skill::Exploration]);
}

#[test]
fn declining_confirmation_performs_no_side_effects() {
    let fx = StartFixture::new();
    *fx.interact.confirmation.borrow_mut() = Some(Confirmation::Declined);

    let outcome = fx.run(Some("NOV-50")).unwrap();

    assert!(matches!(outcome, StartOutcome::Declined));
    assert_eq!(fx.vcs.fetches.get(), 0);
    assert!(fx.vcs.added_worktrees.borrow().is_empty());
    assert!(fx.delegate.briefs.borrow().is_empty());
}

#[test]
fn existing_branch_halts_for_disambiguation() {
    let fx = StartFixture::new();
    fx.vcs
        .branches
        .borrow_mut()
        .insert(FEATURE_BRANCH.to_string(), "c9".to_string());

    let err = fx.run(Some("NOV-50")).unwrap_err();

    assert!(matches!(err, Error::AlreadyExists { kind: "branch", .. }));
    assert!(fx.vcs.added_worktrees.borrow().is_empty());
    assert!(fx.delegate.briefs.borrow().is_empty());
}

#[test]
fn start_on_default_branch_without_reference_halts_before_side_effects() {
    let fx = StartFixture::new();

    let err = fx.run(None).unwrap_err();

    assert!(matches!(err, Error::WrongBranch(_)));
    assert_eq!(fx.tracker.fetches.get(), 0);
    assert_eq!(fx.vcs.fetches.get(), 0);
    assert!(fx.vcs.added_worktrees.borrow().is_empty());
}

#[test]
fn unknown_ticket_is_not_found_with_no_side_effects() {
    let fx = StartFixture::new();

    let err = fx.run(Some("NOV-99")).unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(fx.vcs.fetches.get(), 0);
    assert!(fx.vcs.added_worktrees.borrow().is_empty());
}
