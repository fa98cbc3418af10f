//! casker Core Library
//!
//! This is the core library for the casker task runner. A configuration declares
//! shell commands as named tasks, optionally grouped into parallel or series
//! groups, with dependency edges and on-exit hooks. Running a task runs its
//! whole dependency closure first and tears down any still-running processes
//! at the end.
//!
//! ## Architecture
//!
//! The core library is organized into several modules:
//!
//! - [`task_manager`] - High-level interface: load, list, plan and run
//! - [`tasks`] - Task and group model
//! - [`registry`] - Name to task/group mapping, validation and cycle detection
//! - [`builder`] - Namespaced task declaration API
//! - [`execution`] - Stage planning, task execution and process teardown
//! - [`configs`] - Configuration file formats
//! - [`platform`] - Shell and search-path conventions
//! - [`reporting`] - Task events and console output
//! - [`results`] - Result types for task manager operations
//! - [`types`] - Common error types and type aliases
//!
//! ## Usage
//!
//! Tasks can be declared in code with a [`TaskBuilder`] and run with a
//! [`TaskRunner`](execution::TaskRunner):
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use casker_core::execution::TaskRunner;
//! use casker_core::reporting::ConsoleReporter;
//! use casker_core::tasks::TaskOptions;
//! use casker_core::{Registry, TaskBuilder};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> casker_core::CaskerResult<()> {
//! let mut registry = Registry::new();
//! let mut builder = TaskBuilder::new(&mut registry, "", ".");
//! let a = builder.task("a", "echo A", TaskOptions::default())?;
//! builder.task("b", "echo B", TaskOptions { dependency: Some(a), ..Default::default() })?;
//! registry.validate()?;
//!
//! let runner = TaskRunner::new(&registry, Arc::new(ConsoleReporter));
//! runner
//!     .run_with_teardown(registry.resolve("b")?, CancellationToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod configs;
pub mod execution;
pub mod platform;
pub mod registry;
pub mod reporting;
pub mod results;
pub mod task_manager;
pub mod tasks;
pub mod types;

// Re-export the main types for easier usage
pub use builder::TaskBuilder;
pub use registry::Registry;
pub use task_manager::{TaskManager, TaskManagerConfig};
pub use types::{CaskerError, CaskerResult};
