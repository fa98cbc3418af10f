//! Registry of named tasks and groups
//!
//! The registry is built once while configuration is loaded and only read
//! afterwards. It keeps insertion order so listings match the declaration order.

use std::collections::HashMap;

use petgraph::algo::kosaraju_scc;
use petgraph::prelude::*;

use crate::tasks::{Group, Node, NodeRef, Task};
use crate::types::{CaskerError, CaskerResult};

#[derive(Debug, Default)]
pub struct Registry {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under its fully-qualified name. Names are never overwritten.
    pub fn register(&mut self, node: Node) -> CaskerResult<NodeRef> {
        let name = node.name().to_string();
        if self.index.contains_key(&name) {
            return Err(CaskerError::DuplicateTaskName(name));
        }

        self.index.insert(name.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(NodeRef::new(name))
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    /// Look up a task or group requested by the user
    pub fn resolve(&self, name: &str) -> CaskerResult<&Node> {
        self.get(name)
            .ok_or_else(|| CaskerError::UnknownTaskRequested(name.to_string()))
    }

    /// Look up a reference held by another node
    pub fn lookup(&self, from: &str, reference: &NodeRef) -> CaskerResult<&Node> {
        self.get(reference.name())
            .ok_or_else(|| CaskerError::UnknownReference {
                from: from.to_string(),
                to: reference.name().to_string(),
            })
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        match self.get(name) {
            Some(Node::Task(task)) => Some(task),
            _ => None,
        }
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        match self.get(name) {
            Some(Node::Group(group)) => Some(group),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check that every reference resolves, groups only hold tasks, and the
    /// dependency/on-exit/member graph has no cycles.
    pub fn validate(&self) -> CaskerResult<()> {
        for node in &self.nodes {
            for reference in node.references() {
                let target = self.lookup(node.name(), reference)?;
                if let (Node::Group(group), Node::Group(member)) = (node, target) {
                    return Err(CaskerError::NestedGroup {
                        group: group.name.clone(),
                        member: member.name.clone(),
                    });
                }
            }
        }

        let cycles = self.find_cycles();
        if cycles.is_empty() {
            return Ok(());
        }

        let message = cycles
            .into_iter()
            .map(|cycle| {
                let mut cycle_path = cycle.clone();
                if let Some(first) = cycle_path.first().cloned() {
                    cycle_path.push(first);
                }
                cycle_path.join(" -> ")
            })
            .collect::<Vec<_>>()
            .join("; ");

        Err(CaskerError::DependencyCycle(message))
    }

    fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut graph = DiGraph::<&str, ()>::new();
        let node_indices: Vec<NodeIndex> = self
            .nodes
            .iter()
            .map(|node| graph.add_node(node.name()))
            .collect();

        for (from, node) in self.nodes.iter().enumerate() {
            for reference in node.references() {
                if let Some(&to) = self.index.get(reference.name()) {
                    graph.update_edge(node_indices[from], node_indices[to], ());
                }
            }
        }

        let mut cycles: Vec<Vec<String>> = kosaraju_scc(&graph)
            .into_iter()
            .filter_map(|component| {
                if component.len() > 1 {
                    let mut cycle = component
                        .iter()
                        .map(|node| graph[*node].to_string())
                        .collect::<Vec<_>>();
                    cycle.sort();
                    Some(cycle)
                } else {
                    let node = component[0];
                    if graph.contains_edge(node, node) {
                        Some(vec![graph[node].to_string()])
                    } else {
                        None
                    }
                }
            })
            .collect();

        cycles.sort();
        cycles
    }
}
