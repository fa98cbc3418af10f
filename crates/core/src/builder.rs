//! Namespaced task declaration API
//!
//! A [`TaskBuilder`] registers every node it creates into a [`Registry`],
//! prefixing names with its namespace. Call [`Registry::validate`] once all
//! builders are done.

use std::path::PathBuf;

use crate::registry::Registry;
use crate::tasks::{Group, Node, NodeRef, Task, TaskOptions};
use crate::types::CaskerResult;

pub struct TaskBuilder<'a> {
    registry: &'a mut Registry,
    namespace: String,
    cwd: PathBuf,
}

impl<'a> TaskBuilder<'a> {
    pub fn new(registry: &'a mut Registry, namespace: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            namespace: namespace.into(),
            cwd: cwd.into(),
        }
    }

    /// Apply this builder's namespace to a local name
    pub fn qualify(&self, name: &str) -> String {
        qualify(&self.namespace, name)
    }

    pub fn task(&mut self, name: &str, command: &str, options: TaskOptions) -> CaskerResult<NodeRef> {
        let task = Task::new(self.qualify(name), command, self.cwd.clone(), options)?;
        self.registry.register(Node::Task(task))
    }

    pub fn tasks_parallel<'r>(
        &mut self,
        name: &str,
        tasks: impl IntoIterator<Item = &'r NodeRef>,
    ) -> CaskerResult<NodeRef> {
        self.group(name, "", tasks, true)
    }

    pub fn tasks_series<'r>(
        &mut self,
        name: &str,
        tasks: impl IntoIterator<Item = &'r NodeRef>,
    ) -> CaskerResult<NodeRef> {
        self.group(name, "", tasks, false)
    }

    pub fn group<'r>(
        &mut self,
        name: &str,
        description: &str,
        tasks: impl IntoIterator<Item = &'r NodeRef>,
        is_parallel: bool,
    ) -> CaskerResult<NodeRef> {
        let members = tasks.into_iter().cloned().collect();
        let group = Group::new(self.qualify(name), description, members, is_parallel)?;
        self.registry.register(Node::Group(group))
    }
}

pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}:{}", namespace, name)
    }
}
