//! Result types for task manager operations
//!
//! Output structures handed to the CLI for presentation.

use crate::tasks::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Task,
    ParallelGroup,
    SeriesGroup,
}

/// A registered task or group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub name: String,
    pub description: String,
    pub kind: TaskKind,
    pub is_long_running: bool,
}

/// Result of listing registered tasks, in declaration order
#[derive(Debug)]
pub struct TaskListResult {
    pub tasks: Vec<TaskInfo>,
}

/// Result of planning a task without running it
#[derive(Debug)]
pub struct ExecutionPlanResult {
    pub task_name: String,
    pub stages: Vec<Vec<String>>,
}

impl From<&Node> for TaskInfo {
    fn from(node: &Node) -> Self {
        let (kind, is_long_running) = match node {
            Node::Task(task) => (TaskKind::Task, task.is_long_running),
            Node::Group(group) if group.is_parallel => (TaskKind::ParallelGroup, false),
            Node::Group(_) => (TaskKind::SeriesGroup, false),
        };

        Self {
            name: node.name().to_string(),
            description: node.description().to_string(),
            kind,
            is_long_running,
        }
    }
}
