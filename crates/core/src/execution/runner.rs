//! High-level task runner
//!
//! This module runs tasks and groups, drives stage sequences, and tears down
//! every tracked process once a run ends.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use sysinfo::Signal;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::execution::process::{kill_process_tree, ProcessTracker, TrackedProcess};
use crate::execution::stages::{plan_stages, Stage};
use crate::platform::PlatformInfo;
use crate::registry::Registry;
use crate::reporting::{TaskEvent, TaskReporter};
use crate::tasks::{Group, Node, Task};
use crate::types::{CaskerError, CaskerResult};

/// Configuration for the task runner
#[derive(Debug, Clone)]
pub struct TaskRunnerConfig {
    /// Directory, relative to a task's working directory, appended to its search path
    pub local_bin_dir: PathBuf,
    /// How long teardown waits for a signalled process before escalating
    pub kill_grace_period: Duration,
}

impl Default for TaskRunnerConfig {
    fn default() -> Self {
        Self {
            local_bin_dir: PathBuf::from("node_modules/.bin"),
            kill_grace_period: Duration::from_secs(5),
        }
    }
}

/// Runs tasks and groups from a registry and owns their processes
pub struct TaskRunner<'a> {
    registry: &'a Registry,
    tracker: Arc<ProcessTracker>,
    reporter: Arc<dyn TaskReporter>,
    platform: PlatformInfo,
    config: TaskRunnerConfig,
}

impl<'a> TaskRunner<'a> {
    pub fn new(registry: &'a Registry, reporter: Arc<dyn TaskReporter>) -> Self {
        Self {
            registry,
            tracker: Arc::new(ProcessTracker::new()),
            reporter,
            platform: PlatformInfo::current(),
            config: TaskRunnerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TaskRunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tracker(&self) -> &Arc<ProcessTracker> {
        &self.tracker
    }

    /// Run `root` with its whole dependency closure, then tear everything down.
    /// Cancelling `shutdown` interrupts the run.
    pub async fn run_with_teardown(
        &self,
        root: &'a Node,
        shutdown: CancellationToken,
    ) -> CaskerResult<()> {
        let stages = plan_stages(self.registry, root)?;

        let outcome = tokio::select! {
            result = self.run_stages(&stages) => result,
            _ = shutdown.cancelled() => Err(CaskerError::Interrupted),
        };

        if let Err(e) = &outcome {
            tracing::debug!(error = %e, "run ended with an error, tearing down");
        }
        self.kill_all().await;
        outcome
    }

    /// Run stages in order; members of a stage run concurrently and all settle
    /// before the next stage starts.
    pub async fn run_stages(&self, stages: &[Stage<'a>]) -> CaskerResult<()> {
        for stage in stages {
            settle_all(stage.iter().map(|node| self.run_node(*node))).await?;
        }
        Ok(())
    }

    pub fn run_node(&self, node: &'a Node) -> LocalBoxFuture<'_, CaskerResult<()>> {
        match node {
            Node::Task(task) => self.run_task(task),
            Node::Group(group) => self.run_group(group),
        }
    }

    pub fn run_group(&self, group: &'a Group) -> LocalBoxFuture<'_, CaskerResult<()>> {
        async move {
            let members = group
                .members
                .iter()
                .map(|member| self.registry.lookup(&group.name, member))
                .collect::<CaskerResult<Vec<_>>>()?;

            if group.is_parallel {
                return settle_all(members.into_iter().map(|member| self.run_node(member))).await;
            }

            for member in members {
                self.run_node(member).await?;
            }
            Ok(())
        }
        .boxed_local()
    }

    pub fn run_task(&self, task: &'a Task) -> LocalBoxFuture<'_, CaskerResult<()>> {
        async move {
            self.reporter.report(TaskEvent::Started {
                task: task.name.clone(),
            });

            let started = Instant::now();
            let child = self.spawn(task)?;
            let pid = child.id().ok_or_else(|| CaskerError::Spawn {
                name: task.name.clone(),
                source: std::io::Error::other("process exited before it could be tracked"),
            })?;

            self.tracker.track(pid, task);

            let (done_tx, done_rx) = oneshot::channel();
            tokio::spawn(watch_process(
                child,
                pid,
                task.name.clone(),
                started,
                self.tracker.clone(),
                self.reporter.clone(),
                done_tx,
            ));

            // Long-running tasks unblock dependents right away; their on-exit
            // hook runs during teardown once the process is gone.
            if task.is_long_running {
                return Ok(());
            }

            let success = done_rx.await.unwrap_or(false);
            if !success {
                return Err(CaskerError::TaskProcessFailure {
                    name: task.name.clone(),
                });
            }

            if let Some(on_exit) = &task.on_exit {
                let hook = self.registry.lookup(&task.name, on_exit)?;
                self.run_node(hook).await?;
            }
            Ok(())
        }
        .boxed_local()
    }

    fn spawn(&self, task: &Task) -> CaskerResult<Child> {
        let ambient: Vec<(String, String)> = std::env::vars().collect();
        let env = self.platform.build_environment(
            &task.env,
            &ambient,
            &task.working_directory,
            &self.config.local_bin_dir,
        );

        let mut command = Command::new(&self.platform.shell);
        command
            .args(&self.platform.shell_args)
            .arg(&task.command)
            .current_dir(&task.working_directory)
            .env_clear()
            .envs(&env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = command.spawn().map_err(|source| CaskerError::Spawn {
            name: task.name.clone(),
            source,
        })?;

        tracing::debug!(task = %task.name, pid = ?child.id(), command = %task.command, "spawned task");
        Ok(child)
    }

    /// Kill every tracked process tree. Each killed task's on-exit hook, and
    /// that of any long-running task that already exited, runs to completion
    /// before the next process is killed. The pass repeats until nothing is
    /// tracked.
    pub async fn kill_all(&self) {
        loop {
            while let Some(hook) = self.tracker.take_pending_hook() {
                let result = match self.registry.lookup(&hook.task, &hook.node) {
                    Ok(node) => self.run_node(node).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    tracing::warn!(task = %hook.task, error = %e, "on-exit hook failed during teardown");
                }
            }

            let Some(process) = self.tracker.oldest() else {
                break;
            };
            self.terminate(&process).await;
        }
    }

    async fn terminate(&self, process: &TrackedProcess) {
        self.reporter.report(TaskEvent::Killed {
            task: process.task.clone(),
            pid: process.pid,
        });

        let grace = self.config.kill_grace_period;
        self.tracker.arm_on_exit(process.pid);
        kill_process_tree(process.pid, Signal::Term);
        if self.tracker.wait_until_untracked(process.pid, grace).await {
            return;
        }

        tracing::warn!(pid = process.pid, task = %process.task, "process ignored SIGTERM, killing");
        kill_process_tree(process.pid, Signal::Kill);
        if !self.tracker.wait_until_untracked(process.pid, grace).await {
            tracing::warn!(pid = process.pid, task = %process.task, "process did not exit, dropping record");
            self.tracker.untrack(process.pid);
        }
    }
}

/// Drive futures concurrently until all settle; the first failure to arrive wins.
async fn settle_all<'f>(
    futures: impl IntoIterator<Item = LocalBoxFuture<'f, CaskerResult<()>>>,
) -> CaskerResult<()> {
    let mut pending: FuturesUnordered<_> = futures.into_iter().collect();
    let mut first_failure = None;

    while let Some(result) = pending.next().await {
        if let Err(e) = result {
            first_failure.get_or_insert(e);
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Wait for a task process, report its output, and drop it from the tracker
async fn watch_process(
    child: Child,
    pid: u32,
    task: String,
    started: Instant,
    tracker: Arc<ProcessTracker>,
    reporter: Arc<dyn TaskReporter>,
    done: oneshot::Sender<bool>,
) {
    let success = match child.wait_with_output().await {
        Ok(output) => {
            let captured = if output.stderr.is_empty() {
                &output.stdout
            } else {
                &output.stderr
            };
            let text = String::from_utf8_lossy(captured).trim().to_string();
            if !text.is_empty() {
                reporter.report(TaskEvent::Output {
                    task: task.clone(),
                    text,
                });
            }
            output.status.success()
        }
        Err(e) => {
            tracing::warn!(pid, task = %task, error = %e, "failed to wait for task process");
            false
        }
    };

    reporter.report(TaskEvent::Finished {
        task,
        elapsed: started.elapsed(),
        success,
    });
    tracker.untrack(pid);
    // The runner may have stopped listening (long-running task or interrupted run)
    let _ = done.send(success);
}
