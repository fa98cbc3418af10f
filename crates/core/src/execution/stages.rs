//! Stage planning
//!
//! Turns a requested node's dependency chain into ordered layers. Layer 0 runs
//! first and the last layer is the requested node itself. Nodes are not
//! deduplicated: a task reached through several paths is scheduled once per path.

use crate::registry::Registry;
use crate::tasks::Node;
use crate::types::CaskerResult;

/// Nodes that may run concurrently once every earlier stage has settled
pub type Stage<'r> = Vec<&'r Node>;

/// Compute the execution stages for `root`
pub fn plan_stages<'r>(registry: &'r Registry, root: &'r Node) -> CaskerResult<Vec<Stage<'r>>> {
    let mut stages: Vec<Stage<'r>> = Vec::new();
    let mut frontier: Stage<'r> = vec![root];

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for node in &frontier {
            match node {
                Node::Task(task) => {
                    if let Some(dependency) = &task.dependency {
                        next.push(registry.lookup(&task.name, dependency)?);
                    }
                }
                // A group's own dependencies are those of its members
                Node::Group(group) => {
                    for member in &group.members {
                        if let Node::Task(task) = registry.lookup(&group.name, member)? {
                            if let Some(dependency) = &task.dependency {
                                next.push(registry.lookup(&task.name, dependency)?);
                            }
                        }
                    }
                }
            }
        }

        stages.push(frontier);
        frontier = next;
    }

    stages.reverse();
    Ok(stages)
}

/// Stage names, for display and assertions
pub fn stage_names(stages: &[Stage<'_>]) -> Vec<Vec<String>> {
    stages
        .iter()
        .map(|stage| stage.iter().map(|node| node.name().to_string()).collect())
        .collect()
}
