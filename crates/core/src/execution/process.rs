//! Process tracking
//!
//! Every spawned task process is recorded here from spawn until its exit
//! watcher observes termination. A pid present in the tracker is a process the
//! teardown pass is responsible for killing.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use sysinfo::{Pid, Signal, System};
use tokio::sync::Notify;

use crate::tasks::{NodeRef, Task};

/// A live process and the task that spawned it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedProcess {
    pub pid: u32,
    pub task: String,
    on_exit: Option<NodeRef>,
    /// Queue `on_exit` when this process goes away. Set at spawn for
    /// long-running tasks and by teardown for everything it kills.
    hook_armed: bool,
}

/// An on-exit hook whose owning process has exited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHook {
    pub task: String,
    pub node: NodeRef,
}

#[derive(Debug, Default)]
struct TrackerState {
    processes: Vec<TrackedProcess>,
    pending_hooks: VecDeque<PendingHook>,
}

#[derive(Debug, Default)]
pub struct ProcessTracker {
    state: Mutex<TrackerState>,
    exited: Notify,
}

impl ProcessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, TrackerState> {
        // The state stays consistent even if a holder panicked
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a freshly spawned process. Must happen before its exit can be observed.
    pub fn track(&self, pid: u32, task: &Task) {
        tracing::debug!(pid, task = %task.name, "tracking process");
        self.state().processes.push(TrackedProcess {
            pid,
            task: task.name.clone(),
            on_exit: task.on_exit.clone(),
            hook_armed: task.is_long_running,
        });
    }

    /// Make a tracked process queue its on-exit hook when it is untracked.
    /// Teardown calls this before killing, so a short task cut off mid-run
    /// still gets its hook. Returns false if `pid` is no longer tracked.
    pub fn arm_on_exit(&self, pid: u32) -> bool {
        let mut state = self.state();
        match state.processes.iter_mut().find(|p| p.pid == pid) {
            Some(process) => {
                process.hook_armed = true;
                true
            }
            None => false,
        }
    }

    /// Forget an exited process. Its on-exit hook becomes pending if armed.
    pub fn untrack(&self, pid: u32) -> Option<TrackedProcess> {
        let removed = {
            let mut state = self.state();
            let position = state.processes.iter().position(|p| p.pid == pid)?;
            let process = state.processes.remove(position);
            if let (true, Some(node)) = (process.hook_armed, &process.on_exit) {
                state.pending_hooks.push_back(PendingHook {
                    task: process.task.clone(),
                    node: node.clone(),
                });
            }
            process
        };

        tracing::debug!(pid, task = %removed.task, "process exited");
        self.exited.notify_waiters();
        Some(removed)
    }

    pub fn is_tracked(&self, pid: u32) -> bool {
        self.state().processes.iter().any(|p| p.pid == pid)
    }

    /// The process tracked for the longest time
    pub fn oldest(&self) -> Option<TrackedProcess> {
        self.state().processes.first().cloned()
    }

    pub fn len(&self) -> usize {
        self.state().processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().processes.is_empty()
    }

    pub fn take_pending_hook(&self) -> Option<PendingHook> {
        self.state().pending_hooks.pop_front()
    }

    /// Wait until `pid` is no longer tracked. Returns false on timeout.
    pub async fn wait_until_untracked(&self, pid: u32, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let exited = self.exited.notified();
                if !self.is_tracked(pid) {
                    return;
                }
                exited.await;
            }
        };

        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

/// Send `signal` to a process and all of its descendants. Returns how many
/// processes were signalled.
pub fn kill_process_tree(pid: u32, signal: Signal) -> usize {
    let mut system = System::new();
    system.refresh_processes();

    let mut tree = vec![Pid::from_u32(pid)];
    let mut cursor = 0;
    while cursor < tree.len() {
        let parent = tree[cursor];
        for (child, process) in system.processes() {
            if process.parent() == Some(parent) && !tree.contains(child) {
                tree.push(*child);
            }
        }
        cursor += 1;
    }

    let mut signalled = 0;
    for member in &tree {
        let Some(process) = system.process(*member) else {
            continue;
        };
        let delivered = process
            .kill_with(signal)
            .unwrap_or_else(|| process.kill());
        if delivered {
            signalled += 1;
        }
    }

    tracing::debug!(pid, signalled, ?signal, "signalled process tree");
    signalled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskOptions;

    fn task(name: &str, is_long_running: bool, on_exit: Option<&str>) -> Task {
        Task::new(
            name,
            "true",
            ".",
            TaskOptions {
                is_long_running,
                on_exit: on_exit.map(NodeRef::from),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_track_and_untrack() {
        let tracker = ProcessTracker::new();
        tracker.track(10, &task("a", false, None));
        tracker.track(11, &task("b", false, None));

        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.oldest().unwrap().task, "a");

        let removed = tracker.untrack(10).unwrap();
        assert_eq!(removed.task, "a");
        assert!(!tracker.is_tracked(10));
        assert!(tracker.untrack(10).is_none(), "removal happens exactly once");
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_armed_short_task_queues_hook() {
        let tracker = ProcessTracker::new();
        tracker.track(1, &task("short", false, Some("cleanup")));
        tracker.track(2, &task("plain", false, None));

        assert!(tracker.arm_on_exit(1));
        assert!(tracker.arm_on_exit(2));
        assert!(!tracker.arm_on_exit(3));

        tracker.untrack(2);
        assert!(tracker.take_pending_hook().is_none());

        tracker.untrack(1);
        let hook = tracker.take_pending_hook().unwrap();
        assert_eq!(hook.task, "short");
        assert_eq!(hook.node.name(), "cleanup");
    }

    #[test]
    fn test_only_long_running_hooks_are_deferred() {
        let tracker = ProcessTracker::new();
        tracker.track(1, &task("short", false, Some("cleanup")));
        tracker.track(2, &task("server", true, Some("stop-server")));

        tracker.untrack(1);
        assert!(tracker.take_pending_hook().is_none());

        tracker.untrack(2);
        let hook = tracker.take_pending_hook().unwrap();
        assert_eq!(hook.task, "server");
        assert_eq!(hook.node.name(), "stop-server");
        assert!(tracker.take_pending_hook().is_none());
    }

    #[tokio::test]
    async fn test_wait_until_untracked() {
        let tracker = std::sync::Arc::new(ProcessTracker::new());
        tracker.track(7, &task("a", false, None));

        let remover = tracker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            remover.untrack(7);
        });

        assert!(tracker.wait_until_untracked(7, Duration::from_secs(5)).await);
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_wait_until_untracked_times_out() {
        let tracker = ProcessTracker::new();
        tracker.track(7, &task("a", false, None));

        assert!(!tracker.wait_until_untracked(7, Duration::from_millis(20)).await);
        assert!(tracker.is_tracked(7));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_kill_process_tree_reaches_grandchildren() {
        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg("sleep 30 & sleep 30; wait")
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let signalled = kill_process_tree(pid, Signal::Kill);
        assert!(signalled >= 3, "shell and both sleeps should be signalled");

        let status = tokio::time::timeout(Duration::from_secs(5), child.wait())
            .await
            .unwrap()
            .unwrap();
        assert!(!status.success());
    }
}
