//! Task and group model
//!
//! Tasks and groups are immutable once constructed. They refer to each other by
//! fully-qualified name through [`NodeRef`]; the [`Registry`](crate::registry::Registry)
//! resolves those names, so no node owns another.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::types::{CaskerError, CaskerResult};

/// Fully-qualified name of a registered task or group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(String);

impl NodeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A single named shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub command: String,
    pub working_directory: PathBuf,
    pub env: BTreeMap<String, String>,
    pub is_long_running: bool,
    pub description: String,
    pub dependency: Option<NodeRef>,
    pub on_exit: Option<NodeRef>,
}

/// Options accepted when declaring a task
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    pub env: BTreeMap<String, String>,
    pub is_long_running: bool,
    pub description: String,
    pub dependency: Option<NodeRef>,
    pub on_exit: Option<NodeRef>,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        working_directory: impl Into<PathBuf>,
        options: TaskOptions,
    ) -> CaskerResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CaskerError::EmptyName);
        }

        Ok(Self {
            name,
            command: command.into(),
            working_directory: working_directory.into(),
            env: options.env,
            is_long_running: options.is_long_running,
            description: options.description,
            dependency: options.dependency,
            on_exit: options.on_exit,
        })
    }
}

/// An ordered collection of tasks run concurrently or strictly in sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub description: String,
    pub members: Vec<NodeRef>,
    pub is_parallel: bool,
}

impl Group {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        members: Vec<NodeRef>,
        is_parallel: bool,
    ) -> CaskerResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(CaskerError::EmptyName);
        }

        Ok(Self {
            name,
            description: description.into(),
            members,
            is_parallel,
        })
    }
}

/// Anything the planner and executor can run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Task(Task),
    Group(Group),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Task(task) => &task.name,
            Node::Group(group) => &group.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Node::Task(task) => &task.description,
            Node::Group(group) => &group.description,
        }
    }

    /// Every node this one points at: dependency and on-exit for tasks, members for groups
    pub fn references(&self) -> Vec<&NodeRef> {
        match self {
            Node::Task(task) => task.dependency.iter().chain(task.on_exit.iter()).collect(),
            Node::Group(group) => group.members.iter().collect(),
        }
    }
}
