//! End-to-end runs of small task files, checking the order tasks start and finish in.

use std::sync::Arc;
use std::time::{Duration, Instant};

use casker_core::reporting::RecordingReporter;
use casker_core::{CaskerError, TaskManager, TaskManagerConfig};
use tokio_util::sync::CancellationToken;

const FIXTURE: &str = r#"
tasks:
  - name: a
    command: sleep 0.1; echo A
    description: runs a
  - name: b
    command: echo B
    dependsOn: a
    description: runs b after a
  - name: c
    command: echo C
    dependsOn: ax3-series
    description: runs c after a three times in order
  - name: d
    command: echo D
    dependsOn: ax3-parallel
    description: runs d after a three times in parallel
  - name: e
    command: echo E
    onExit: ax3-series
    description: runs e then a three times in order
  - name: x
    command: sleep 0.3
  - name: y
    command: sleep 0.3
  - name: server
    command: sleep 30
    longRunning: true
  - name: client
    command: echo client
    dependsOn: server
  - name: bad
    command: echo broken >&2; exit 1
  - name: after-bad
    command: echo never
    dependsOn: bad
groups:
  - name: ax3-series
    mode: series
    tasks: [a, a, a]
  - name: ax3-parallel
    mode: parallel
    tasks: [a, a, a]
  - name: xy
    mode: parallel
    tasks: [x, y]
  - name: xy-series
    mode: series
    tasks: [x, y]
"#;

fn load(content: &str) -> (tempfile::TempDir, TaskManager) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("casker.yml"), content).unwrap();
    let manager = TaskManager::new(TaskManagerConfig::discover(dir.path().to_path_buf())).unwrap();
    (dir, manager)
}

async fn run(manager: &TaskManager, task: &str) -> (Result<(), CaskerError>, Vec<String>) {
    let reporter = RecordingReporter::new();
    let result = manager
        .run_task(task, Arc::new(reporter.clone()), CancellationToken::new())
        .await;
    (result, reporter.timeline())
}

fn position(timeline: &[String], entry: &str) -> usize {
    timeline
        .iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("'{}' missing from {:?}", entry, timeline))
}

#[tokio::test]
async fn dependency_finishes_before_dependent_starts() {
    let (_dir, manager) = load(FIXTURE);

    let plan = manager.get_execution_plan("b").unwrap();
    assert_eq!(plan.stages, vec![vec!["a"], vec!["b"]]);

    let (result, timeline) = run(&manager, "b").await;
    result.unwrap();
    assert_eq!(
        timeline,
        vec!["a started", "a finished", "b started", "b finished"]
    );
}

#[tokio::test]
async fn series_group_dependency_runs_every_member_in_order() {
    let (_dir, manager) = load(FIXTURE);

    let (result, timeline) = run(&manager, "c").await;
    result.unwrap();
    assert_eq!(
        timeline,
        vec![
            "a started",
            "a finished",
            "a started",
            "a finished",
            "a started",
            "a finished",
            "c started",
            "c finished"
        ]
    );
}

#[tokio::test]
async fn parallel_group_dependency_settles_before_dependent() {
    let (_dir, manager) = load(FIXTURE);

    let (result, timeline) = run(&manager, "d").await;
    result.unwrap();

    assert_eq!(timeline.len(), 8);
    let a_entries = &timeline[..6];
    assert_eq!(a_entries.iter().filter(|e| *e == "a started").count(), 3);
    assert_eq!(a_entries.iter().filter(|e| *e == "a finished").count(), 3);
    // all three were spawned before the first one finished
    assert_eq!(&timeline[..3], &["a started", "a started", "a started"]);
    assert_eq!(&timeline[6..], &["d started", "d finished"]);
}

#[tokio::test]
async fn on_exit_group_runs_after_task() {
    let (_dir, manager) = load(FIXTURE);

    let (result, timeline) = run(&manager, "e").await;
    result.unwrap();
    assert_eq!(
        timeline,
        vec![
            "e started",
            "e finished",
            "a started",
            "a finished",
            "a started",
            "a finished",
            "a started",
            "a finished"
        ]
    );
}

#[tokio::test]
async fn parallel_members_overlap_and_series_members_do_not() {
    let (_dir, manager) = load(FIXTURE);

    let (result, timeline) = run(&manager, "xy").await;
    result.unwrap();
    let x_finished = position(&timeline, "x finished");
    let y_finished = position(&timeline, "y finished");
    assert!(position(&timeline, "x started") < y_finished);
    assert!(position(&timeline, "y started") < x_finished);

    let (result, timeline) = run(&manager, "xy-series").await;
    result.unwrap();
    assert_eq!(
        timeline,
        vec!["x started", "x finished", "y started", "y finished"]
    );
}

#[tokio::test]
async fn long_running_dependency_unblocks_and_is_torn_down() {
    let (_dir, manager) = load(FIXTURE);

    let started = Instant::now();
    let (result, timeline) = run(&manager, "client").await;
    result.unwrap();

    assert!(started.elapsed() < Duration::from_secs(20));
    assert!(position(&timeline, "server started") < position(&timeline, "client started"));
    assert!(position(&timeline, "client finished") < position(&timeline, "server finished"));
}

#[tokio::test]
async fn failure_stops_later_stages() {
    let (_dir, manager) = load(FIXTURE);

    let (result, timeline) = run(&manager, "after-bad").await;
    let err = result.unwrap_err();

    assert!(matches!(err, CaskerError::TaskProcessFailure { ref name } if name == "bad"));
    assert_eq!(err.to_string(), "Task bad failed");
    assert_eq!(timeline, vec!["bad started", "bad finished"]);
}

#[tokio::test]
async fn unknown_task_runs_nothing() {
    let (_dir, manager) = load(FIXTURE);

    let (result, timeline) = run(&manager, "nope").await;
    assert!(matches!(result, Err(CaskerError::UnknownTaskRequested(_))));
    assert!(timeline.is_empty());
}

#[tokio::test]
async fn parallel_dependencies_of_group_members_share_a_stage() {
    let (_dir, manager) = load(
        r#"
tasks:
  - name: a
    command: echo a
  - name: c
    command: echo c
  - name: b
    command: echo b
    dependsOn: a
  - name: d
    command: echo d
    dependsOn: c
  - name: e
    command: echo e
    dependsOn: bd
groups:
  - name: bd
    tasks: [b, d]
"#,
    );

    let plan = manager.get_execution_plan("e").unwrap();
    assert_eq!(plan.stages, vec![vec!["a", "c"], vec!["bd"], vec!["e"]]);

    let (result, timeline) = run(&manager, "e").await;
    result.unwrap();
    for (first, then) in [("a", "b"), ("c", "d"), ("b", "e"), ("d", "e")] {
        assert!(
            position(&timeline, &format!("{} finished", first))
                < position(&timeline, &format!("{} started", then))
        );
    }
}
