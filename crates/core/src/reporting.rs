//! Task observations and console output
//!
//! The executor reports what it does through a [`TaskReporter`]. The console
//! implementation prints colored, name-prefixed lines; [`RecordingReporter`]
//! keeps events in memory for inspection.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use colored::*;

/// Something observable that happened to a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Started { task: String },
    Output { task: String, text: String },
    Finished { task: String, elapsed: Duration, success: bool },
    Killed { task: String, pid: u32 },
}

impl TaskEvent {
    pub fn task(&self) -> &str {
        match self {
            TaskEvent::Started { task }
            | TaskEvent::Output { task, .. }
            | TaskEvent::Finished { task, .. }
            | TaskEvent::Killed { task, .. } => task,
        }
    }
}

/// Sink for task observations. Called from the control thread and from
/// process exit watchers.
pub trait TaskReporter: Send + Sync {
    fn report(&self, event: TaskEvent);
}

/// Prefix colors for task names. Red, yellow and green are left to status text.
const TASK_PALETTE: [(u8, u8, u8); 8] = [
    (95, 135, 255),
    (0, 175, 175),
    (255, 135, 0),
    (215, 95, 175),
    (135, 175, 255),
    (175, 135, 255),
    (0, 215, 255),
    (255, 95, 135),
];

/// Color of a task's `[name]` prefix. Equal names always map to the same color.
pub fn get_task_color(task_name: &str) -> Color {
    let hash = task_name
        .bytes()
        .fold(5381u64, |acc, b| acc.wrapping_mul(33) ^ u64::from(b));
    let (r, g, b) = TASK_PALETTE[(hash % TASK_PALETTE.len() as u64) as usize];
    Color::TrueColor { r, g, b }
}

/// Render an elapsed duration the way task summaries show it, e.g. `1.25s`
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{}s", elapsed.as_millis() as f64 / 1000.0)
}

/// Prints task events to the terminal
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl TaskReporter for ConsoleReporter {
    fn report(&self, event: TaskEvent) {
        let prefix = format!("[{}]", event.task()).color(get_task_color(event.task()));
        match event {
            TaskEvent::Started { .. } => println!("{} {}", prefix, "started".bold()),
            TaskEvent::Output { text, .. } => {
                for line in text.lines() {
                    println!("{} {}", prefix, line);
                }
            }
            TaskEvent::Finished {
                elapsed, success, ..
            } => {
                let status = format!("finished ({})", format_elapsed(elapsed));
                if success {
                    println!("{} {}", prefix, status.green());
                } else {
                    println!("{} {}", prefix, status.red());
                }
            }
            TaskEvent::Killed { pid, .. } => {
                println!("{} {}", prefix, format!("killed (pid {})", pid).dimmed())
            }
        }
    }
}

/// Keeps every reported event, in arrival order
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<TaskEvent>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TaskEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Compact `"<task> started"` / `"<task> finished"` log used to check ordering
    pub fn timeline(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TaskEvent::Started { task } => Some(format!("{} started", task)),
                TaskEvent::Finished { task, .. } => Some(format!("{} finished", task)),
                _ => None,
            })
            .collect()
    }
}

impl TaskReporter for RecordingReporter {
    fn report(&self, event: TaskEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
