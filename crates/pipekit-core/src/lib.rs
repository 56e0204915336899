pub mod config;
pub mod logging;

pub mod automerge;
pub mod command;
pub mod control;
pub mod error;
pub mod github;
pub mod install;
pub mod report;
pub mod retry;
