//! tkt - ticket lifecycle orchestrator: start work in an isolated worktree,
//! end it with a verified squash-merge.

pub mod classify;
pub mod commands;
pub mod config;
pub mod error;
pub mod gate;
pub mod ident;
pub mod infra;
pub mod services;
pub mod subprocess;
pub mod telemetry;
pub mod template;
pub mod ticket;
pub mod worktree;
