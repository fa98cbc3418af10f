//! Task execution module
//!
//! This module plans dependency stages, runs tasks and groups, and tracks the
//! processes they spawn until teardown.

pub mod process;
pub mod runner;
pub mod stages;

pub use process::{kill_process_tree, ProcessTracker};
pub use runner::{TaskRunner, TaskRunnerConfig};
pub use stages::{plan_stages, Stage};
