//! Production adapters for the collaborator ports: git and gh through
//! subprocesses, the tracker over HTTP, test/review subroutines through
//! configured commands, and console prompts for the suspension points.

pub mod agent;
pub mod git;
pub mod github;
pub mod interact;
pub mod review;
pub mod testcmd;
pub mod tracker;
